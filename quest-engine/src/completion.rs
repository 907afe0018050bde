//! Commit step: persist an accepted advancement and detect completion.

use quest_core::{Progress, Quest, QuestResult, User};
use quest_storage::ProgressStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of committing one advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Stored progress after the commit.
    pub progress: Progress,
    /// True when this commit completed the quest.
    pub completed: bool,
}

/// Persists accepted advancements. The only component that marks quests
/// completed.
pub trait CompletionHandoff: Send + Sync {
    fn commit(
        &self,
        user: &User,
        quest: &Quest,
        original: Progress,
        delta: Progress,
        absolute_override: bool,
    ) -> QuestResult<Commit>;
}

/// Downstream reward granting, called once per completed quest.
pub trait RewardSink: Send + Sync {
    fn quest_completed(&self, user: &User, quest: &Quest) -> QuestResult<()>;
}

/// Reward sink that only records completions in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRewardSink;

impl RewardSink for LoggingRewardSink {
    fn quest_completed(&self, user: &User, quest: &Quest) -> QuestResult<()> {
        tracing::info!(user = %user.user_id, quest = %quest.key(), "Quest completed");
        Ok(())
    }
}

/// Handoff writing through a [`ProgressStore`].
pub struct StoreCompletionHandoff {
    store: Arc<dyn ProgressStore>,
    rewards: Arc<dyn RewardSink>,
}

impl StoreCompletionHandoff {
    pub fn new(store: Arc<dyn ProgressStore>, rewards: Arc<dyn RewardSink>) -> Self {
        Self { store, rewards }
    }

    pub fn with_logging_rewards(store: Arc<dyn ProgressStore>) -> Self {
        Self::new(store, Arc::new(LoggingRewardSink))
    }
}

impl CompletionHandoff for StoreCompletionHandoff {
    fn commit(
        &self,
        user: &User,
        quest: &Quest,
        original: Progress,
        delta: Progress,
        absolute_override: bool,
    ) -> QuestResult<Commit> {
        let progress = if absolute_override {
            delta
        } else {
            original.saturating_add(delta)
        };
        self.store.set_progress(user, quest, progress)?;

        let completed = progress >= quest.required_progress;
        if completed {
            self.store.mark_completed(user, quest)?;
            self.rewards.quest_completed(user, quest)?;
        }

        tracing::trace!(
            user = %user.user_id,
            quest = %quest.key(),
            progress = %progress,
            completed,
            "Progress committed"
        );
        Ok(Commit {
            progress,
            completed,
        })
    }
}
