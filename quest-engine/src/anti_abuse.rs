//! Compensating rollback for the place/break farming pattern.
//!
//! A quest that counts one member of the substitutable pair (e.g. breaking
//! blocks) loses progress when the subject performs the other member
//! (placing blocks), so re-placing and re-breaking the same block nets zero.

use crate::eligibility::EligibilityEvaluator;
use crate::signal::ProgressSignal;
use quest_core::{AntiAbuseConfig, Progress, Quest, QuestKey, QuestResult, Subject, SubjectId, User};
use quest_storage::ProgressStore;
use serde::{Deserialize, Serialize};

/// A rollback that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub quest: QuestKey,
    pub subject: SubjectId,
    pub before: Progress,
    pub after: Progress,
}

#[derive(Debug, Clone)]
pub struct AntiAbuseCorrector {
    pair: [String; 2],
}

impl AntiAbuseCorrector {
    pub fn new(config: &AntiAbuseConfig) -> Self {
        Self {
            pair: config.substitutable_pair.clone(),
        }
    }

    /// Signal types that trigger a correction. Matched exactly.
    pub fn substitutable_pair(&self) -> &[String; 2] {
        &self.pair
    }

    fn is_substitutable(&self, signal_type: &str) -> bool {
        self.pair.iter().any(|member| member == signal_type)
    }

    /// Roll back `quest` by the signal's magnitude when the signal is the
    /// substitute of the quest's own action. Never goes below zero.
    pub fn correct<E: EligibilityEvaluator>(
        &self,
        store: &dyn ProgressStore,
        subject: &Subject,
        user: &User,
        quest: &Quest,
        signal: &ProgressSignal<E>,
    ) -> QuestResult<Option<Correction>> {
        let signal_type = signal.signal_type.as_str();
        if !quest.anti_abuse
            || !self.is_substitutable(signal_type)
            || quest.responds_to(signal_type)
        {
            return Ok(None);
        }
        if store.is_completed(user, quest)? {
            return Ok(None);
        }
        if !signal.context.is_eligible(subject, &quest.condition) {
            return Ok(None);
        }

        let before = store.get_progress(user, quest)?;
        if before.is_zero() {
            return Ok(None);
        }
        let after = before.saturating_sub(signal.magnitude);
        store.set_progress(user, quest, after)?;

        tracing::debug!(
            quest = %quest.key(),
            subject = %subject.subject_id,
            before = %before,
            after = %after,
            "Anti abuse measures applied"
        );

        Ok(Some(Correction {
            quest: quest.key(),
            subject: subject.subject_id,
            before,
            after,
        }))
    }
}

impl Default for AntiAbuseCorrector {
    fn default() -> Self {
        Self::new(&AntiAbuseConfig::default())
    }
}
