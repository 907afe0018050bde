//! Quest Storage - Progress Store and Catalog Ports
//!
//! Defines the storage abstraction consumed by the validation engine:
//! - [`ProgressStore`]: per-(user, quest) progress and completion flags
//! - [`QuestCatalog`]: quest definitions grouped by category
//!
//! Both ports ship with in-memory implementations. Persistent backends live
//! with the host.

pub mod catalog;

pub use catalog::{CatalogSnapshot, QuestCatalog, SeasonCatalog};

use quest_core::{Progress, Quest, QuestKey, QuestResult, StorageError, User, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

// ============================================================================
// PROGRESS STORE TRAIT
// ============================================================================

/// Storage for accumulated quest progress.
///
/// Implementations must be safe to share between threads. The engine
/// serializes mutations itself, so implementations need not provide
/// read-modify-write atomicity.
pub trait ProgressStore: Send + Sync {
    /// Stored progress, zero if the user never progressed the quest.
    fn get_progress(&self, user: &User, quest: &Quest) -> QuestResult<Progress>;

    /// Overwrite stored progress.
    fn set_progress(&self, user: &User, quest: &Quest, progress: Progress) -> QuestResult<()>;

    fn is_completed(&self, user: &User, quest: &Quest) -> QuestResult<bool>;

    /// Flag the quest as completed. Completion is never reverted.
    fn mark_completed(&self, user: &User, quest: &Quest) -> QuestResult<()>;
}

// ============================================================================
// IN-MEMORY PROGRESS STORE
// ============================================================================

/// Stored state of one (user, quest) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressEntry {
    pub progress: Progress,
    pub completed: bool,
}

/// In-memory progress store.
///
/// Entries are created lazily on first write and never deleted.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    entries: RwLock<HashMap<(UserId, QuestKey), ProgressEntry>>,
    writes: AtomicU64,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry without going through the port.
    pub fn entry(&self, user_id: UserId, quest: &QuestKey) -> Option<ProgressEntry> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&(user_id, quest.clone())).copied())
    }

    /// Seed an entry, e.g. when restoring state or preparing tests.
    pub fn seed(&self, user_id: UserId, quest: QuestKey, entry: ProgressEntry) -> QuestResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert((user_id, quest), entry);
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Number of writes (progress or completion) performed through the port.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Clear all stored data.
    pub fn clear(&self) -> QuestResult<()> {
        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .clear();
        Ok(())
    }

    fn read_entry(&self, user: &User, quest: &Quest) -> QuestResult<ProgressEntry> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries
            .get(&(user.user_id, quest.key()))
            .copied()
            .unwrap_or_default())
    }

    fn update_entry(
        &self,
        user: &User,
        quest: &Quest,
        update: impl FnOnce(&mut ProgressEntry),
    ) -> QuestResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        update(entries.entry((user.user_id, quest.key())).or_default());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn get_progress(&self, user: &User, quest: &Quest) -> QuestResult<Progress> {
        Ok(self.read_entry(user, quest)?.progress)
    }

    fn set_progress(&self, user: &User, quest: &Quest, progress: Progress) -> QuestResult<()> {
        self.update_entry(user, quest, |entry| entry.progress = progress)
    }

    fn is_completed(&self, user: &User, quest: &Quest) -> QuestResult<bool> {
        Ok(self.read_entry(user, quest)?.completed)
    }

    fn mark_completed(&self, user: &User, quest: &Quest) -> QuestResult<()> {
        self.update_entry(user, quest, |entry| entry.completed = true)
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
