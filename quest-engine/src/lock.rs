//! Processing lock serializing read-evaluate-dispatch-commit sequences.

use dashmap::DashMap;
use quest_core::{LockScope, QuestResult, StorageError, UserId};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Mutual exclusion around progress mutations.
///
/// With [`LockScope::Global`] every call shares one section. With
/// [`LockScope::PerUser`] each user gets its own, created on first use and
/// dropped again once no call holds or waits for it.
///
/// The lock is reentrant: a listener may call back into the engine on the
/// thread that holds it. Under [`LockScope::PerUser`] a nested call for a
/// *different* user takes that user's section too, so two threads chaining
/// users in opposite order can still deadlock.
#[derive(Debug)]
pub struct ProcessingLock {
    scope: LockScope,
    global: ReentrantSection,
    per_user: DashMap<UserId, Arc<ReentrantSection>>,
}

impl ProcessingLock {
    pub fn new(scope: LockScope) -> Self {
        Self {
            scope,
            global: ReentrantSection::default(),
            per_user: DashMap::new(),
        }
    }

    pub fn scope(&self) -> LockScope {
        self.scope
    }

    /// Number of users with a live section.
    pub fn tracked_users(&self) -> usize {
        self.per_user.len()
    }

    /// Run `f` while holding the lock for `user`.
    ///
    /// The section is released before the result is returned, whatever it
    /// is. A panic inside `f` poisons the section: the next fresh
    /// acquisition fails with [`StorageError::LockPoisoned`] and clears it.
    pub fn with_lock<T>(&self, user: UserId, f: impl FnOnce() -> QuestResult<T>) -> QuestResult<T> {
        match self.scope {
            LockScope::Global => self.global.run(f),
            LockScope::PerUser => {
                let section = self.user_section(user);
                let result = section.run(f);
                drop(section);
                self.per_user
                    .remove_if(&user, |_, section| Arc::strong_count(section) == 1);
                result
            }
        }
    }

    fn user_section(&self, user: UserId) -> Arc<ReentrantSection> {
        Arc::clone(&self.per_user.entry(user).or_default())
    }
}

impl Default for ProcessingLock {
    fn default() -> Self {
        Self::new(LockScope::default())
    }
}

// ============================================================================
// REENTRANT SECTION
// ============================================================================

#[derive(Debug, Default)]
struct Ownership {
    owner: Option<ThreadId>,
    depth: usize,
    poisoned: bool,
}

/// Mutex that the owning thread may re-enter.
#[derive(Debug, Default)]
struct ReentrantSection {
    state: Mutex<Ownership>,
    released: Condvar,
}

impl ReentrantSection {
    fn run<T>(&self, f: impl FnOnce() -> QuestResult<T>) -> QuestResult<T> {
        let _held = self.enter()?;
        f()
    }

    fn enter(&self) -> QuestResult<SectionGuard<'_>> {
        let me = thread::current().id();
        let mut state = self.state();
        loop {
            match state.owner {
                Some(owner) if owner == me => {
                    state.depth += 1;
                    return Ok(SectionGuard { section: self });
                }
                Some(_) => {
                    state = self
                        .released
                        .wait(state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
                None => break,
            }
        }
        if state.poisoned {
            state.poisoned = false;
            tracing::error!("Processing lock poisoned by a panicking holder");
            return Err(StorageError::LockPoisoned.into());
        }
        state.owner = Some(me);
        state.depth = 1;
        Ok(SectionGuard { section: self })
    }

    // Ownership updates never panic while the inner mutex is held.
    fn state(&self) -> MutexGuard<'_, Ownership> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct SectionGuard<'a> {
    section: &'a ReentrantSection,
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.section.state();
        if thread::panicking() {
            state.poisoned = true;
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            drop(state);
            self.section.released.notify_all();
        }
    }
}
