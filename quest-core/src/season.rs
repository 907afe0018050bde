//! Season clocks: whether the season has ended and which week is current.

use crate::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub const DAYS_PER_WEEK: i64 = 7;

/// Source of season state consulted by the week gate.
pub trait SeasonClock: Send + Sync {
    fn has_season_ended(&self) -> bool;

    /// Current week, starting at 1. 0 means the season has not started.
    fn current_week(&self) -> u32;
}

// ============================================================================
// FIXED SEASON
// ============================================================================

/// Season state set explicitly by the host.
#[derive(Debug, Default)]
pub struct FixedSeason {
    ended: AtomicBool,
    week: AtomicU32,
}

impl FixedSeason {
    pub fn new(current_week: u32) -> Self {
        Self {
            ended: AtomicBool::new(false),
            week: AtomicU32::new(current_week),
        }
    }

    pub fn ended(current_week: u32) -> Self {
        let season = Self::new(current_week);
        season.set_ended(true);
        season
    }

    pub fn set_week(&self, week: u32) {
        self.week.store(week, Ordering::SeqCst);
    }

    pub fn set_ended(&self, ended: bool) {
        self.ended.store(ended, Ordering::SeqCst);
    }
}

impl SeasonClock for FixedSeason {
    fn has_season_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn current_week(&self) -> u32 {
        self.week.load(Ordering::SeqCst)
    }
}

// ============================================================================
// CALENDAR SEASON
// ============================================================================

/// Season derived from wall-clock time: week 1 begins at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSeason {
    pub start: Timestamp,
    #[serde(default)]
    pub end: Option<Timestamp>,
}

impl CalendarSeason {
    pub fn new(start: Timestamp, end: Option<Timestamp>) -> Self {
        Self { start, end }
    }

    pub fn week_at(&self, now: Timestamp) -> u32 {
        if now < self.start {
            return 0;
        }
        let weeks = (now - self.start).num_days() / DAYS_PER_WEEK;
        u32::try_from(weeks + 1).unwrap_or(u32::MAX)
    }

    pub fn ended_at(&self, now: Timestamp) -> bool {
        self.end.is_some_and(|end| now >= end)
    }
}

impl SeasonClock for CalendarSeason {
    fn has_season_ended(&self) -> bool {
        self.ended_at(Utc::now())
    }

    fn current_week(&self) -> u32 {
        self.week_at(Utc::now())
    }
}
