//! Quest category identifiers.
//!
//! A category id either names the daily bucket (any id containing `daily`) or
//! a season week (`week-N`, N >= 1). The week number is parsed once, when the
//! id is constructed, so a malformed catalog fails at load time instead of
//! during signal processing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const WEEK_PREFIX: &str = "week-";
const DAILY_MARKER: &str = "daily";

/// Class of a category, derived from its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Daily quests; never week-gated.
    Daily,
    /// Season week, starting at 1.
    Week(u32),
}

/// Error when a category id cannot be parsed into a daily or week class.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CategoryParseError {
    #[error("Category id is empty")]
    Empty,

    #[error("Category id {raw:?} has a non-numeric week suffix")]
    NonNumericWeek { raw: String },

    #[error("Category id {raw:?} names week 0; weeks start at 1")]
    WeekZero { raw: String },

    #[error("Category id {raw:?} pads its week number; use week-{week}")]
    PaddedWeek { raw: String, week: u32 },

    #[error("Category id {raw:?} is neither a daily nor a week-N category")]
    Unrecognized { raw: String },
}

/// Validated category identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryId {
    raw: String,
    kind: CategoryKind,
}

impl CategoryId {
    /// Parse a raw category id.
    pub fn parse(raw: impl Into<String>) -> Result<Self, CategoryParseError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(CategoryParseError::Empty);
        }
        if raw.contains(DAILY_MARKER) {
            return Ok(Self {
                raw,
                kind: CategoryKind::Daily,
            });
        }
        let Some(suffix) = raw.strip_prefix(WEEK_PREFIX) else {
            return Err(CategoryParseError::Unrecognized { raw });
        };
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CategoryParseError::NonNumericWeek { raw });
        }
        let week: u32 = suffix
            .parse()
            .map_err(|_| CategoryParseError::NonNumericWeek { raw: raw.clone() })?;
        if week == 0 {
            return Err(CategoryParseError::WeekZero { raw });
        }
        // One spelling per week, so `previous_week()` always names a real id.
        if suffix.starts_with('0') {
            return Err(CategoryParseError::PaddedWeek { raw, week });
        }
        Ok(Self {
            raw,
            kind: CategoryKind::Week(week),
        })
    }

    /// The canonical daily category.
    pub fn daily() -> Self {
        Self {
            raw: DAILY_MARKER.to_string(),
            kind: CategoryKind::Daily,
        }
    }

    /// The `week-N` category.
    pub fn week(number: u32) -> Result<Self, CategoryParseError> {
        Self::parse(format!("{}{}", WEEK_PREFIX, number))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> CategoryKind {
        self.kind
    }

    pub fn is_daily(&self) -> bool {
        self.kind == CategoryKind::Daily
    }

    /// Week number of this category; 0 for the daily class.
    pub fn week_number(&self) -> u32 {
        match self.kind {
            CategoryKind::Daily => 0,
            CategoryKind::Week(n) => n,
        }
    }

    /// The category whose completion gates this one.
    ///
    /// `None` for daily categories and for week 1.
    pub fn previous_week(&self) -> Option<CategoryId> {
        match self.kind {
            CategoryKind::Week(n) if n > 1 => Some(Self {
                raw: format!("{}{}", WEEK_PREFIX, n - 1),
                kind: CategoryKind::Week(n - 1),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for CategoryId {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CategoryId {
    type Error = CategoryParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CategoryId> for String {
    fn from(value: CategoryId) -> Self {
        value.raw
    }
}

// ============================================================================
// TESTS
// ============================================================================
