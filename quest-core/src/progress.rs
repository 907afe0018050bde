//! Saturating progress counter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accumulated progress of a user toward a quest.
///
/// Backed by a `u128` with saturating arithmetic: accumulation across a
/// season never wraps, and subtraction clamps at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress(u128);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const MAX: Progress = Progress(u128::MAX);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Progress) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtract, clamping the result at zero.
    pub fn saturating_sub(self, other: Progress) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u32> for Progress {
    fn from(value: u32) -> Self {
        Self(u128::from(value))
    }
}

impl From<u64> for Progress {
    fn from(value: u64) -> Self {
        Self(u128::from(value))
    }
}

impl From<u128> for Progress {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Progress {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Self)
    }
}

// ============================================================================
// TESTS
// ============================================================================
