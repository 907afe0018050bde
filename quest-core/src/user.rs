//! Pass holders and acting subjects.

use crate::{SubjectId, UserId};
use serde::{Deserialize, Serialize};

/// A pass holder whose quest progress is tracked.
///
/// Progress itself lives behind the progress store; this record only carries
/// what the validation rules need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    /// Pass/subscription identifier, matched against exclusive quests.
    pub pass_id: String,
    /// Skip week locking and previous-week prerequisites.
    #[serde(default)]
    pub bypass_locked_weeks: bool,
}

impl User {
    pub fn new(user_id: UserId, pass_id: impl Into<String>) -> Self {
        Self {
            user_id,
            pass_id: pass_id.into(),
            bypass_locked_weeks: false,
        }
    }

    pub fn with_bypass_locked_weeks(mut self, bypass: bool) -> Self {
        self.bypass_locked_weeks = bypass;
        self
    }

    /// Case-insensitive pass comparison.
    pub fn holds_pass(&self, pass_id: &str) -> bool {
        self.pass_id.eq_ignore_ascii_case(pass_id)
    }
}

/// The entity that performed the action behind a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: SubjectId,
    /// Name of the world the subject is currently in.
    pub world: String,
}

impl Subject {
    pub fn new(subject_id: SubjectId, world: impl Into<String>) -> Self {
        Self {
            subject_id,
            world: world.into(),
        }
    }
}
