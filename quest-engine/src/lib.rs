//! Quest Engine - Validation and Progression Pipeline
//!
//! Turns activity signals into validated progress updates. The engine owns
//! the admission rules and the processing lock; everything stateful sits
//! behind ports:
//!
//! | Port                   | Crate           | In-memory implementation   |
//! |------------------------|-----------------|----------------------------|
//! | `ProgressStore`        | `quest-storage` | `InMemoryProgressStore`    |
//! | `QuestCatalog`         | `quest-storage` | `CatalogSnapshot`          |
//! | `NotificationGate`     | `quest-events`  | `ListenerGate`             |
//! | `SeasonClock`          | `quest-core`    | `FixedSeason`              |
//! | `CompletionHandoff`    | this crate      | `StoreCompletionHandoff`   |
//! | `EligibilityEvaluator` | this crate      | `SignalContext`            |
//!
//! ```no_run
//! use quest_core::{CategoryId, EngineConfig, FixedSeason, Quest, Subject, User};
//! use quest_engine::{EnginePorts, ProgressSignal, QuestValidationEngine};
//! use quest_events::ListenerGate;
//! use quest_storage::{CatalogSnapshot, InMemoryProgressStore};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # fn main() -> quest_core::QuestResult<()> {
//! let quest = Quest::new("arrows", "throw-projectile", CategoryId::week(1)?, 16u32)
//!     .with_condition("arrow");
//! let catalog = CatalogSnapshot::from_quests(vec![quest.clone()])?;
//!
//! let ports = EnginePorts::new(
//!     Arc::new(InMemoryProgressStore::new()),
//!     Arc::new(catalog),
//!     Arc::new(FixedSeason::new(1)),
//!     Arc::new(ListenerGate::new()),
//! );
//! let engine = QuestValidationEngine::new(EngineConfig::default(), ports)?;
//!
//! let subject = Subject::new(Uuid::now_v7(), "survival");
//! let user = User::new(Uuid::now_v7(), "free");
//! let report = engine.process(
//!     &subject,
//!     &user,
//!     &ProgressSignal::projectile_launch("ARROW"),
//!     [&quest],
//! )?;
//! assert_eq!(report.committed_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod anti_abuse;
pub mod completion;
pub mod eligibility;
pub mod engine;
pub mod lock;
pub mod signal;
pub mod telemetry;

pub use anti_abuse::{AntiAbuseCorrector, Correction};
pub use completion::{
    Commit, CompletionHandoff, LoggingRewardSink, RewardSink, StoreCompletionHandoff,
};
pub use eligibility::{AlwaysEligible, EligibilityEvaluator, SignalContext};
pub use engine::{
    EnginePorts, ProcessReport, QuestOutcome, QuestValidationEngine, RejectReason, Validity,
};
pub use lock::ProcessingLock;
pub use signal::ProgressSignal;
