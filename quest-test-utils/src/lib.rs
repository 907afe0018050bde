//! Quest Test Utilities
//!
//! Shared test infrastructure for the quest workspace:
//! - Proptest generators for the core types
//! - Recording and failing port implementations
//! - Fixtures for common scenarios
//! - Assertions over `QuestResult` and stored progress

pub use quest_core::{
    CalendarSeason, CategoryId, Condition, EngineConfig, FixedSeason, LockScope, Progress,
    ProgressionEvent, Quest, QuestError, QuestKey, QuestResult, StorageError, Subject, User,
    WorldFilter,
};
pub use quest_events::{GateOutcome, ListenerGate, NotificationGate};
pub use quest_storage::{CatalogSnapshot, InMemoryProgressStore, ProgressStore};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// MOCK PORTS
// ============================================================================

/// Gate that records every published event and answers with a fixed policy.
#[derive(Debug, Default)]
pub struct RecordingGate {
    events: Mutex<Vec<ProgressionEvent>>,
    veto: AtomicBool,
    cap: Mutex<Option<Progress>>,
}

impl RecordingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate that vetoes everything.
    pub fn vetoing() -> Self {
        let gate = Self::default();
        gate.set_veto(true);
        gate
    }

    pub fn set_veto(&self, veto: bool) {
        self.veto.store(veto, Ordering::SeqCst);
    }

    /// Shrink every delta to at most `cap`.
    pub fn set_cap(&self, cap: Option<Progress>) {
        *self.cap.lock().unwrap_or_else(|p| p.into_inner()) = cap;
    }

    pub fn events(&self) -> Vec<ProgressionEvent> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl NotificationGate for RecordingGate {
    fn publish(&self, mut event: ProgressionEvent) -> QuestResult<GateOutcome> {
        if let Some(cap) = *self.cap.lock().unwrap_or_else(|p| p.into_inner()) {
            event.set_added_progress(cap);
        }
        if self.veto.load(Ordering::SeqCst) {
            event.cancel();
        }
        let outcome = GateOutcome::from_event(&event);
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(event);
        Ok(outcome)
    }
}

/// Progress store whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn fail<T>() -> QuestResult<T> {
        Err(StorageError::Unavailable {
            reason: "store offline".to_string(),
        }
        .into())
    }
}

impl ProgressStore for UnavailableStore {
    fn get_progress(&self, _user: &User, _quest: &Quest) -> QuestResult<Progress> {
        Self::fail()
    }

    fn set_progress(&self, _user: &User, _quest: &Quest, _progress: Progress) -> QuestResult<()> {
        Self::fail()
    }

    fn is_completed(&self, _user: &User, _quest: &Quest) -> QuestResult<bool> {
        Self::fail()
    }

    fn mark_completed(&self, _user: &User, _quest: &Quest) -> QuestResult<()> {
        Self::fail()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for the core types.

    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Progress small enough that sums stay readable in failure output.
    pub fn arb_progress() -> impl Strategy<Value = Progress> {
        (0u64..10_000).prop_map(Progress::from)
    }

    /// Any progress, including values near saturation.
    pub fn arb_progress_any() -> impl Strategy<Value = Progress> {
        any::<u128>().prop_map(Progress::new)
    }

    pub fn arb_week_number() -> impl Strategy<Value = u32> {
        1u32..=12
    }

    pub fn arb_category_id() -> impl Strategy<Value = CategoryId> {
        prop_oneof![
            1 => Just(CategoryId::daily()),
            4 => arb_week_number().prop_filter_map("week >= 1", |w| CategoryId::week(w).ok()),
        ]
    }

    pub fn arb_world_name() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["survival", "nether", "end", "lobby", "creative"])
            .prop_map(str::to_string)
    }

    pub fn arb_world_filter() -> impl Strategy<Value = WorldFilter> {
        (
            prop::collection::hash_set(arb_world_name(), 0..3),
            prop::collection::hash_set(arb_world_name(), 0..2),
        )
            .prop_map(|(white, black)| WorldFilter {
                whitelist: white,
                blacklist: black,
            })
    }

    pub fn arb_condition() -> impl Strategy<Value = Condition> {
        let value = prop::sample::select(vec!["arrow", "snowball", "egg", "trident"]);
        prop_oneof![
            Just(Condition::Any),
            prop::collection::vec(value.clone(), 1..3)
                .prop_map(|v| Condition::parse(&v.join(","))),
            prop::collection::vec(value, 2..3).prop_map(|v| Condition::parse(&v.join("&"))),
        ]
    }

    pub fn arb_signal_type() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["block-break", "block-place", "throw-projectile", "join"])
            .prop_map(str::to_string)
    }

    pub fn arb_quest() -> impl Strategy<Value = Quest> {
        (
            "[a-z]{3,10}",
            arb_signal_type(),
            arb_category_id(),
            1u64..1_000,
            arb_condition(),
            any::<bool>(),
        )
            .prop_map(|(id, quest_type, category, required, condition, anti_abuse)| {
                Quest::new(id, quest_type, category, required)
                    .with_condition(condition)
                    .with_anti_abuse(anti_abuse)
            })
    }

    pub fn arb_user() -> impl Strategy<Value = User> {
        (
            arb_uuid(),
            prop::sample::select(vec!["free", "premium", "P1", "P2"]),
            any::<bool>(),
        )
            .prop_map(|(id, pass, bypass)| User::new(id, pass).with_bypass_locked_weeks(bypass))
    }

    pub fn arb_subject() -> impl Strategy<Value = Subject> {
        (arb_uuid(), arb_world_name()).prop_map(|(id, world)| Subject::new(id, world))
    }

    /// Configuration that always passes validation.
    pub fn arb_valid_config() -> impl Strategy<Value = EngineConfig> {
        (
            prop::collection::hash_set(arb_world_name(), 0..3),
            any::<[bool; 4]>(),
            prop_oneof![Just(LockScope::Global), Just(LockScope::PerUser)],
        )
            .prop_map(|(whitelist, flags, lock_scope)| {
                let mut config = EngineConfig {
                    whitelisted_worlds: whitelist,
                    lock_scope,
                    ..EngineConfig::default()
                };
                config.unlocks.lock_previous_weeks = flags[0];
                config.unlocks.require_previous_completion = flags[1];
                config.season_finished.stop_daily_quests = flags[2];
                config.season_finished.stop_other_quests = flags[3];
                config
            })
    }

    pub fn arb_calendar_season() -> impl Strategy<Value = CalendarSeason> {
        (0i64..365, prop::option::of(7i64..120)).prop_map(|(offset, length)| {
            // 2026-01-01T00:00:00Z
            let base = DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_454);
            let start = base + Duration::days(offset);
            CalendarSeason::new(start, length.map(|days| start + Duration::days(days)))
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;
    use uuid::Uuid;

    pub fn week(number: u32) -> CategoryId {
        CategoryId::week(number).expect("week numbers in fixtures start at 1")
    }

    /// Week quest responding to `quest_type`.
    pub fn week_quest(id: &str, quest_type: &str, number: u32, required: u64) -> Quest {
        Quest::new(id, quest_type, week(number), required)
    }

    pub fn daily_quest(id: &str, quest_type: &str, required: u64) -> Quest {
        Quest::new(id, quest_type, CategoryId::daily(), required)
    }

    pub fn user(pass_id: &str) -> User {
        User::new(Uuid::now_v7(), pass_id)
    }

    pub fn subject_in(world: &str) -> Subject {
        Subject::new(Uuid::now_v7(), world)
    }

    pub fn catalog(quests: impl IntoIterator<Item = Quest>) -> CatalogSnapshot {
        CatalogSnapshot::from_quests(quests).expect("fixture catalog is consistent")
    }

    /// Store with one pre-existing entry.
    pub fn store_with(user: &User, quest: &Quest, progress: u64) -> InMemoryProgressStore {
        let store = InMemoryProgressStore::new();
        store
            .set_progress(user, quest, Progress::from(progress))
            .expect("in-memory store accepts writes");
        store
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for quest-specific validation.

    use super::*;

    /// Assert that a QuestResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &QuestResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a QuestResult is a Storage error.
    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &QuestResult<T>) {
        match result {
            Err(QuestError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    /// Assert that a QuestResult is a Config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &QuestResult<T>) {
        match result {
            Err(QuestError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert stored progress for (user, quest).
    #[track_caller]
    pub fn assert_progress(store: &dyn ProgressStore, user: &User, quest: &Quest, expected: u64) {
        let actual = store
            .get_progress(user, quest)
            .expect("progress readable");
        assert_eq!(
            actual,
            Progress::from(expected),
            "Unexpected progress for {}",
            quest.key()
        );
    }

    /// Assert the completion flag for (user, quest).
    #[track_caller]
    pub fn assert_completed(store: &dyn ProgressStore, user: &User, quest: &Quest, expected: bool) {
        let actual = store
            .is_completed(user, quest)
            .expect("completion readable");
        assert_eq!(actual, expected, "Unexpected completion for {}", quest.key());
    }
}

// ============================================================================
// SELF TESTS
// ============================================================================
