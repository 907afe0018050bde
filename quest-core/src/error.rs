//! Error types for quest operations
//!
//! Admissibility rejections (wrong world, locked week, missing prerequisite,
//! vetoed notification) are not errors; the engine reports them as outcomes.
//! The types here cover faults only.

use crate::CategoryParseError;
use thiserror::Error;

/// Progress store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Progress read failed for {quest}: {reason}")]
    ReadFailed { quest: String, reason: String },

    #[error("Progress write failed for {quest}: {reason}")]
    WriteFailed { quest: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Data-integrity errors raised while loading catalogs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid category: {0}")]
    InvalidCategory(#[from] CategoryParseError),

    #[error("Duplicate quest {id} in category {category}")]
    DuplicateQuest { category: String, id: String },

    #[error("Duplicate category {category}")]
    DuplicateCategory { category: String },

    #[error("Quest {quest} is filed under {found} but was loaded into {expected}")]
    CategoryMismatch {
        quest: String,
        expected: String,
        found: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Failed to read config file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to parse config: {reason}")]
    ParseFailed { reason: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },
}

/// Notification dispatch errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Notification host is unavailable")]
    HostUnavailable,

    #[error("Listener {listener} failed: {reason}")]
    ListenerFailed { listener: String, reason: String },
}

/// Master error type for all quest pipeline errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuestError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),
}

impl From<CategoryParseError> for QuestError {
    fn from(err: CategoryParseError) -> Self {
        QuestError::Validation(ValidationError::InvalidCategory(err))
    }
}

/// Result type alias for quest operations.
pub type QuestResult<T> = Result<T, QuestError>;

// =============================================================================
// TESTS
// =============================================================================
