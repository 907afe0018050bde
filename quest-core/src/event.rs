//! The cancellable "about to record progress" event.
//!
//! The engine proposes a delta, listeners may cancel it or shrink it, and
//! only the agreed amount is committed.

use crate::{new_entity_id, EntityId, Progress, QuestKey, Timestamp, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionEvent {
    pub event_id: EntityId,
    pub user_id: UserId,
    pub quest: QuestKey,
    /// Stored progress when the event was raised.
    pub original_progress: Progress,
    /// True when the delta replaces stored progress instead of adding to it.
    pub absolute_override: bool,
    pub created_at: Timestamp,
    proposed_progress: Progress,
    added_progress: Progress,
    cancelled: bool,
}

impl ProgressionEvent {
    pub fn new(
        user_id: UserId,
        quest: QuestKey,
        original_progress: Progress,
        proposed_progress: Progress,
        absolute_override: bool,
    ) -> Self {
        Self {
            event_id: new_entity_id(),
            user_id,
            quest,
            original_progress,
            absolute_override,
            created_at: Utc::now(),
            proposed_progress,
            added_progress: proposed_progress,
            cancelled: false,
        }
    }

    /// Amount the engine proposed before any listener ran.
    pub fn proposed_progress(&self) -> Progress {
        self.proposed_progress
    }

    /// Amount that will be committed if the event is not cancelled.
    pub fn added_progress(&self) -> Progress {
        self.added_progress
    }

    /// Amend the delta. Listeners may only shrink it; larger values are
    /// clamped to the proposal.
    pub fn set_added_progress(&mut self, progress: Progress) {
        self.added_progress = progress.min(self.proposed_progress);
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
