//! The quest validation engine.
//!
//! For each signal the engine gates the whole call (season end, global
//! world filter), then walks the candidate quests in caller order:
//!
//! ```text
//! anti-abuse ─▶ type ─▶ season class ─▶ quest worlds ─▶ ┌ lock ──────────────────────────┐
//!                                                       │ read ─▶ override no-op         │
//!                                                       │ ─▶ completed ─▶ eligibility    │
//!                                                       │ ─▶ exclusivity ─▶ week gate    │
//!                                                       │ ─▶ prerequisites ─▶ notify     │
//!                                                       │ ─▶ commit                      │
//!                                                       └────────────────────────────────┘
//! ```
//!
//! Rejections are reported, not raised. Errors come only from the ports and
//! the lock.

use crate::anti_abuse::{AntiAbuseCorrector, Correction};
use crate::completion::{CompletionHandoff, StoreCompletionHandoff};
use crate::eligibility::EligibilityEvaluator;
use crate::lock::ProcessingLock;
use crate::signal::ProgressSignal;
use quest_core::{
    EngineConfig, Progress, ProgressionEvent, Quest, QuestKey, QuestResult, SeasonClock, Subject,
    User, WorldFilter,
};
use quest_events::NotificationGate;
use quest_storage::{ProgressStore, QuestCatalog};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// OUTCOMES
// ============================================================================

/// Why a signal did not advance a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Season over and every quest class is stopped.
    SeasonFinished,
    /// Subject's world is outside the global world filter.
    WorldNotAllowed,
    TypeMismatch,
    /// Season over and this quest's class is stopped.
    QuestClassStopped,
    /// Subject's world is outside the quest's world filter.
    QuestWorldNotAllowed,
    /// Absolute override equal to stored progress.
    Unchanged,
    AlreadyCompleted,
    Ineligible,
    ExclusiveToOtherPass,
    FutureWeek { week: u32, current_week: u32 },
    PreviousWeekLocked { week: u32, current_week: u32 },
    PrerequisiteIncomplete { category: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::SeasonFinished => write!(f, "season finished"),
            RejectReason::WorldNotAllowed => write!(f, "world not allowed"),
            RejectReason::TypeMismatch => write!(f, "type mismatch"),
            RejectReason::QuestClassStopped => write!(f, "quest class stopped"),
            RejectReason::QuestWorldNotAllowed => write!(f, "world not allowed for quest"),
            RejectReason::Unchanged => write!(f, "progress unchanged"),
            RejectReason::AlreadyCompleted => write!(f, "already completed"),
            RejectReason::Ineligible => write!(f, "ineligible"),
            RejectReason::ExclusiveToOtherPass => write!(f, "exclusive to another pass"),
            RejectReason::FutureWeek { week, current_week } => {
                write!(f, "week {} not unlocked (current {})", week, current_week)
            }
            RejectReason::PreviousWeekLocked { week, current_week } => {
                write!(f, "week {} locked (current {})", week, current_week)
            }
            RejectReason::PrerequisiteIncomplete { category } => {
                write!(f, "{} not completed", category)
            }
        }
    }
}

/// What happened to one candidate quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestOutcome {
    Committed {
        delta: Progress,
        progress: Progress,
        completed: bool,
    },
    Vetoed,
    Rejected { reason: RejectReason },
}

impl QuestOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, QuestOutcome::Committed { .. })
    }
}

/// Everything one `process` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    /// Set when the whole call was rejected before any candidate was seen.
    pub gate_rejection: Option<RejectReason>,
    pub corrections: Vec<Correction>,
    pub outcomes: Vec<(QuestKey, QuestOutcome)>,
}

impl ProcessReport {
    fn rejected(reason: RejectReason) -> Self {
        Self {
            gate_rejection: Some(reason),
            ..Self::default()
        }
    }

    pub fn outcome(&self, quest: &QuestKey) -> Option<&QuestOutcome> {
        self.outcomes
            .iter()
            .find(|(key, _)| key == quest)
            .map(|(_, outcome)| outcome)
    }

    pub fn committed_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_committed()).count()
    }

    /// True when nothing was written: no commit and no correction.
    pub fn is_noop(&self) -> bool {
        self.corrections.is_empty() && self.committed_count() == 0
    }
}

/// Answer of the validation-only entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Accepted { delta: Progress },
    Vetoed,
    Rejected { reason: RejectReason },
}

impl Validity {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validity::Accepted { .. })
    }
}

enum Evaluation {
    Rejected(RejectReason),
    Vetoed,
    Accepted { original: Progress, delta: Progress },
}

// ============================================================================
// PORTS
// ============================================================================

/// External collaborators of the engine.
#[derive(Clone)]
pub struct EnginePorts {
    pub store: Arc<dyn ProgressStore>,
    pub catalog: Arc<dyn QuestCatalog>,
    pub season: Arc<dyn SeasonClock>,
    pub gate: Arc<dyn NotificationGate>,
    pub handoff: Arc<dyn CompletionHandoff>,
}

impl EnginePorts {
    /// Ports committing through `store` and logging completions.
    pub fn new(
        store: Arc<dyn ProgressStore>,
        catalog: Arc<dyn QuestCatalog>,
        season: Arc<dyn SeasonClock>,
        gate: Arc<dyn NotificationGate>,
    ) -> Self {
        let handoff = Arc::new(StoreCompletionHandoff::with_logging_rewards(Arc::clone(&store)));
        Self {
            store,
            catalog,
            season,
            gate,
            handoff,
        }
    }

    pub fn with_handoff(mut self, handoff: Arc<dyn CompletionHandoff>) -> Self {
        self.handoff = handoff;
        self
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct QuestValidationEngine {
    config: EngineConfig,
    world_filter: WorldFilter,
    ports: EnginePorts,
    lock: ProcessingLock,
    anti_abuse: AntiAbuseCorrector,
}

impl QuestValidationEngine {
    pub fn new(config: EngineConfig, ports: EnginePorts) -> QuestResult<Self> {
        config.validate()?;
        tracing::info!(
            lock_scope = ?config.lock_scope,
            whitelisted = config.whitelisted_worlds.len(),
            blacklisted = config.blacklisted_worlds.len(),
            "Quest validation engine ready"
        );
        Ok(Self {
            world_filter: config.world_filter(),
            lock: ProcessingLock::new(config.lock_scope),
            anti_abuse: AntiAbuseCorrector::new(&config.anti_abuse),
            config,
            ports,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lock(&self) -> &ProcessingLock {
        &self.lock
    }

    /// Apply one signal to the candidate quests, in order.
    pub fn process<E, Q>(
        &self,
        subject: &Subject,
        user: &User,
        signal: &ProgressSignal<E>,
        candidates: impl IntoIterator<Item = Q>,
    ) -> QuestResult<ProcessReport>
    where
        E: EligibilityEvaluator,
        Q: Borrow<Quest>,
    {
        let span = tracing::debug_span!(
            "process",
            user = %user.user_id,
            signal = %signal.signal_type,
            magnitude = %signal.magnitude
        );
        let _entered = span.enter();

        let season_ended = self.ports.season.has_season_ended();
        if let Some(reason) = self.call_gate(subject, season_ended) {
            tracing::trace!(reason = %reason, "Signal rejected");
            return Ok(ProcessReport::rejected(reason));
        }

        let mut report = ProcessReport::default();
        for candidate in candidates {
            let quest = candidate.borrow();

            let correction = self.lock.with_lock(user.user_id, || {
                self.anti_abuse
                    .correct(self.ports.store.as_ref(), subject, user, quest, signal)
            })?;
            report.corrections.extend(correction);

            let outcome = if !quest.responds_to(&signal.signal_type) {
                QuestOutcome::Rejected {
                    reason: RejectReason::TypeMismatch,
                }
            } else if let Some(reason) = self.quest_gate(subject, quest, season_ended) {
                QuestOutcome::Rejected { reason }
            } else {
                self.lock
                    .with_lock(user.user_id, || self.advance(subject, user, quest, signal))?
            };

            if let QuestOutcome::Rejected { reason } = &outcome {
                tracing::trace!(quest = %quest.key(), reason = %reason, "Quest skipped");
            }
            report.outcomes.push((quest.key(), outcome));
        }

        Ok(report)
    }

    /// Run every admission check for one quest and dispatch the notification,
    /// without taking the lock, correcting abuse or committing.
    ///
    /// Listeners observe the event exactly as they would during `process`.
    pub fn is_quest_valid<E: EligibilityEvaluator>(
        &self,
        subject: &Subject,
        user: &User,
        quest: &Quest,
        signal: &ProgressSignal<E>,
    ) -> QuestResult<Validity> {
        let season_ended = self.ports.season.has_season_ended();
        let gated = self
            .call_gate(subject, season_ended)
            .or_else(|| self.quest_gate(subject, quest, season_ended));
        if let Some(reason) = gated {
            return Ok(Validity::Rejected { reason });
        }

        Ok(match self.evaluate(subject, user, quest, signal)? {
            Evaluation::Rejected(reason) => Validity::Rejected { reason },
            Evaluation::Vetoed => Validity::Vetoed,
            Evaluation::Accepted { delta, .. } => Validity::Accepted { delta },
        })
    }

    // ------------------------------------------------------------------------
    // Gates
    // ------------------------------------------------------------------------

    fn call_gate(&self, subject: &Subject, season_ended: bool) -> Option<RejectReason> {
        if season_ended && self.config.stops_everything_on_season_end() {
            return Some(RejectReason::SeasonFinished);
        }
        if !self.world_filter.allows(&subject.world) {
            return Some(RejectReason::WorldNotAllowed);
        }
        None
    }

    fn quest_gate(&self, subject: &Subject, quest: &Quest, season_ended: bool) -> Option<RejectReason> {
        let finished = &self.config.season_finished;
        let class_stopped = if quest.is_daily() {
            finished.stop_daily_quests
        } else {
            finished.stop_other_quests
        };
        if season_ended && class_stopped {
            return Some(RejectReason::QuestClassStopped);
        }
        if !quest.worlds.allows(&subject.world) {
            return Some(RejectReason::QuestWorldNotAllowed);
        }
        None
    }

    fn week_gate(&self, user: &User, quest: &Quest) -> Option<RejectReason> {
        if quest.is_daily() || user.bypass_locked_weeks {
            return None;
        }
        let week = quest.week_number();
        let current_week = self.ports.season.current_week();
        if week > current_week {
            return Some(RejectReason::FutureWeek { week, current_week });
        }
        if self.config.unlocks.lock_previous_weeks && week < current_week {
            return Some(RejectReason::PreviousWeekLocked { week, current_week });
        }
        None
    }

    fn prerequisite_gate(&self, user: &User, quest: &Quest) -> QuestResult<Option<RejectReason>> {
        if !self.config.unlocks.require_previous_completion
            || quest.is_daily()
            || user.bypass_locked_weeks
        {
            return Ok(None);
        }
        let Some(previous) = quest.category.previous_week() else {
            return Ok(None);
        };
        let Some(category) = self.ports.catalog.category(&previous) else {
            return Ok(None);
        };
        for required in category.quests().values() {
            if !self.ports.store.is_completed(user, required)? {
                return Ok(Some(RejectReason::PrerequisiteIncomplete {
                    category: previous.to_string(),
                }));
            }
        }
        Ok(None)
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    fn evaluate<E: EligibilityEvaluator>(
        &self,
        subject: &Subject,
        user: &User,
        quest: &Quest,
        signal: &ProgressSignal<E>,
    ) -> QuestResult<Evaluation> {
        let store = self.ports.store.as_ref();

        let original = store.get_progress(user, quest)?;
        if signal.absolute_override && original == signal.magnitude {
            return Ok(Evaluation::Rejected(RejectReason::Unchanged));
        }
        if store.is_completed(user, quest)? {
            return Ok(Evaluation::Rejected(RejectReason::AlreadyCompleted));
        }
        if !signal.context.is_eligible(subject, &quest.condition) {
            return Ok(Evaluation::Rejected(RejectReason::Ineligible));
        }
        if !quest.is_available_to(user) {
            return Ok(Evaluation::Rejected(RejectReason::ExclusiveToOtherPass));
        }
        if let Some(reason) = self.week_gate(user, quest) {
            return Ok(Evaluation::Rejected(reason));
        }
        if let Some(reason) = self.prerequisite_gate(user, quest)? {
            return Ok(Evaluation::Rejected(reason));
        }

        let event = ProgressionEvent::new(
            user.user_id,
            quest.key(),
            original,
            signal.magnitude,
            signal.absolute_override,
        );
        let outcome = self.ports.gate.publish(event)?;
        if outcome.vetoed {
            tracing::debug!(quest = %quest.key(), user = %user.user_id, "Advancement vetoed");
            return Ok(Evaluation::Vetoed);
        }
        Ok(Evaluation::Accepted {
            original,
            delta: outcome.delta,
        })
    }

    fn advance<E: EligibilityEvaluator>(
        &self,
        subject: &Subject,
        user: &User,
        quest: &Quest,
        signal: &ProgressSignal<E>,
    ) -> QuestResult<QuestOutcome> {
        match self.evaluate(subject, user, quest, signal)? {
            Evaluation::Rejected(reason) => Ok(QuestOutcome::Rejected { reason }),
            Evaluation::Vetoed => Ok(QuestOutcome::Vetoed),
            Evaluation::Accepted { original, delta } => {
                let commit = self.ports.handoff.commit(
                    user,
                    quest,
                    original,
                    delta,
                    signal.absolute_override,
                )?;
                Ok(QuestOutcome::Committed {
                    delta,
                    progress: commit.progress,
                    completed: commit.completed,
                })
            }
        }
    }
}

impl fmt::Debug for QuestValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestValidationEngine")
            .field("config", &self.config)
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
