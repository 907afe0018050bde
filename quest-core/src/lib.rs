//! Quest Core - Entity Types
//!
//! Pure data structures shared by every crate in the workspace: identifiers,
//! progress counters, quest definitions, categories, users, eligibility
//! conditions, the progression event, season clocks, engine configuration
//! and the error taxonomy.
//!
//! This crate contains no pipeline logic. The validation engine lives in
//! `quest-engine`; storage ports live in `quest-storage`.

mod category;
mod condition;
mod config;
mod error;
mod event;
mod identity;
mod progress;
mod quest;
mod season;
mod user;
mod world;

pub use category::{CategoryId, CategoryKind, CategoryParseError};
pub use condition::Condition;
pub use config::{
    AntiAbuseConfig, EngineConfig, LockScope, SeasonFinishedConfig, UnlockConfig,
    DEFAULT_SUBSTITUTABLE_PAIR,
};
pub use error::{
    ConfigError, NotificationError, QuestError, QuestResult, StorageError, ValidationError,
};
pub use event::ProgressionEvent;
pub use identity::{new_entity_id, EntityId, SubjectId, Timestamp, UserId};
pub use progress::Progress;
pub use quest::{Quest, QuestCategory, QuestKey};
pub use season::{CalendarSeason, FixedSeason, SeasonClock, DAYS_PER_WEEK};
pub use user::{Subject, User};
pub use world::WorldFilter;

// ============================================================================
// SIGNAL TYPES
// ============================================================================

/// Signal type emitted when a subject launches a projectile.
pub const THROW_PROJECTILE: &str = "throw-projectile";

/// Signal type emitted when a subject places a block.
pub const BLOCK_PLACE: &str = "block-place";

/// Signal type emitted when a subject breaks a block.
pub const BLOCK_BREAK: &str = "block-break";
