//! End-to-end scenarios for the validation engine.
//!
//! Covers the admission rules, the anti-abuse pass, the commit step and the
//! validation-only entry point against in-memory ports.

use proptest::prelude::*;
use quest_core::{
    CategoryId, EngineConfig, Progress, Quest, QuestCategory, QuestError, ValidationError,
    WorldFilter,
};
use quest_engine::{AlwaysEligible, ProgressSignal, QuestOutcome, RejectReason, Validity};
use quest_storage::{ProgressStore, QuestCatalog};
use quest_test_utils::assertions::{assert_completed, assert_progress, assert_storage_error};
use quest_test_utils::fixtures::{daily_quest, subject_in, user, week_quest};
use quest_test_utils::generators::{arb_progress, arb_world_name};
use quest_test_utils::{RecordingGate, UnavailableStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[path = "support/engine.rs"]
mod test_engine_support;
use test_engine_support::{engine_with_gate, test_engine};

fn signal(signal_type: &str, magnitude: u64) -> ProgressSignal<AlwaysEligible> {
    ProgressSignal::new(signal_type, magnitude, AlwaysEligible)
}

fn rejected(reason: RejectReason) -> QuestOutcome {
    QuestOutcome::Rejected { reason }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn arrow_launches_progress_week_one_quest_until_complete() {
    let quest = week_quest("archer", "throw-projectile", 1, 16).with_condition("arrow");
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    let u = user("free");
    let s = subject_in("survival");

    let report = t
        .engine
        .process(&s, &u, &ProgressSignal::projectile_launch("ARROW"), [&quest])
        .unwrap();
    assert!(report.outcome(&quest.key()).unwrap().is_committed());
    assert_progress(t.store.as_ref(), &u, &quest, 1);

    let events = t.gate.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].added_progress(), Progress::new(1));
    assert_eq!(events[0].original_progress, Progress::ZERO);

    for _ in 1..16 {
        t.engine
            .process(&s, &u, &ProgressSignal::projectile_launch("ARROW"), [&quest])
            .unwrap();
    }
    assert_progress(t.store.as_ref(), &u, &quest, 16);
    assert_completed(t.store.as_ref(), &u, &quest, true);
}

#[test]
fn snowball_does_not_satisfy_arrow_condition() {
    let quest = week_quest("archer", "throw-projectile", 1, 16).with_condition("arrow");
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    let u = user("free");

    let report = t
        .engine
        .process(
            &subject_in("survival"),
            &u,
            &ProgressSignal::projectile_launch("SNOWBALL"),
            [&quest],
        )
        .unwrap();
    assert_eq!(
        report.outcome(&quest.key()),
        Some(&rejected(RejectReason::Ineligible))
    );
    assert_eq!(t.gate.event_count(), 0);
}

#[test]
fn exclusive_quest_only_progresses_for_its_pass() {
    let quest = week_quest("vip", "block-break", 1, 10).with_exclusive_to("P1");
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    let s = subject_in("survival");

    let other = user("P2");
    let report = t
        .engine
        .process(&s, &other, &signal("block-break", 1), [&quest])
        .unwrap();
    assert_eq!(
        report.outcome(&quest.key()),
        Some(&rejected(RejectReason::ExclusiveToOtherPass))
    );
    assert_progress(t.store.as_ref(), &other, &quest, 0);

    let holder = user("p1");
    let report = t
        .engine
        .process(&s, &holder, &signal("block-break", 1), [&quest])
        .unwrap();
    assert_eq!(report.committed_count(), 1);
}

#[test]
fn season_end_stopping_dailies_only_keeps_weeks_running() {
    let mut config = EngineConfig::default();
    config.season_finished.stop_daily_quests = true;
    let daily = daily_quest("daily-miner", "block-break", 10);
    let weekly = week_quest("miner", "block-break", 1, 10);
    let t = test_engine(config, vec![daily.clone(), weekly.clone()]);
    t.season.set_ended(true);
    let u = user("free");

    let report = t
        .engine
        .process(&subject_in("survival"), &u, &signal("block-break", 1), [&daily, &weekly])
        .unwrap();

    assert_eq!(report.gate_rejection, None);
    assert_eq!(
        report.outcome(&daily.key()),
        Some(&rejected(RejectReason::QuestClassStopped))
    );
    assert!(report.outcome(&weekly.key()).unwrap().is_committed());
}

#[test]
fn season_end_stopping_everything_rejects_the_call() {
    let mut config = EngineConfig::default();
    config.season_finished.stop_daily_quests = true;
    config.season_finished.stop_other_quests = true;
    let quest = week_quest("miner", "block-break", 1, 10).with_anti_abuse(true);
    let t = test_engine(config, vec![quest.clone()]);
    t.season.set_ended(true);
    let u = user("free");
    t.store.set_progress(&u, &quest, Progress::new(5)).unwrap();

    let report = t
        .engine
        .process(&subject_in("survival"), &u, &signal("block-place", 1), [&quest])
        .unwrap();

    assert_eq!(report.gate_rejection, Some(RejectReason::SeasonFinished));
    assert!(report.outcomes.is_empty());
    // The anti-abuse pass never ran.
    assert_progress(t.store.as_ref(), &u, &quest, 5);
}

#[test]
fn place_then_break_is_rolled_back() {
    let quest = week_quest("miner", "block-break", 1, 100).with_anti_abuse(true);
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    let u = user("free");
    t.store.set_progress(&u, &quest, Progress::new(5)).unwrap();

    let report = t
        .engine
        .process(&subject_in("survival"), &u, &signal("block-place", 2), [&quest])
        .unwrap();

    assert_eq!(report.corrections.len(), 1);
    assert_eq!(report.corrections[0].before, Progress::new(5));
    assert_eq!(report.corrections[0].after, Progress::new(3));
    assert_eq!(
        report.outcome(&quest.key()),
        Some(&rejected(RejectReason::TypeMismatch))
    );
    assert_progress(t.store.as_ref(), &u, &quest, 3);
    assert_eq!(t.gate.event_count(), 0);
}

#[test]
fn anti_abuse_runs_for_every_candidate_before_type_matching() {
    let miner = week_quest("miner", "block-break", 1, 100).with_anti_abuse(true);
    let builder = week_quest("builder", "block-place", 1, 100);
    let t = test_engine(EngineConfig::default(), vec![miner.clone(), builder.clone()]);
    let u = user("free");
    t.store.set_progress(&u, &miner, Progress::new(4)).unwrap();

    let report = t
        .engine
        .process(&subject_in("survival"), &u, &signal("block-place", 1), [&miner, &builder])
        .unwrap();

    assert_progress(t.store.as_ref(), &u, &miner, 3);
    assert_progress(t.store.as_ref(), &u, &builder, 1);
    assert_eq!(report.committed_count(), 1);
}

#[test]
fn incomplete_previous_week_blocks_next_week() {
    let mut config = EngineConfig::default();
    config.unlocks.require_previous_completion = true;
    let first = week_quest("w1-a", "join", 1, 1);
    let second = week_quest("w1-b", "block-break", 1, 5);
    let next = week_quest("w2", "block-break", 2, 5);
    let t = test_engine(config, vec![first.clone(), second.clone(), next.clone()]);
    t.season.set_week(2);
    let u = user("free");
    let s = subject_in("survival");

    t.engine.process(&s, &u, &signal("join", 1), [&first]).unwrap();
    let report = t
        .engine
        .process(&s, &u, &signal("block-break", 1), [&next])
        .unwrap();

    assert_eq!(
        report.outcome(&next.key()),
        Some(&rejected(RejectReason::PrerequisiteIncomplete {
            category: "week-1".to_string()
        }))
    );
    assert_progress(t.store.as_ref(), &u, &next, 0);

    t.engine
        .process(&s, &u, &signal("block-break", 5), [&second])
        .unwrap();
    let report = t
        .engine
        .process(&s, &u, &signal("block-break", 1), [&next])
        .unwrap();
    assert_eq!(report.committed_count(), 1);
}

#[test]
fn padded_prerequisite_week_fails_at_catalog_load() {
    let json = r#"[
        { "id": "w1", "type": "block-break", "category": "week-01", "required_progress": 5 },
        { "id": "w2", "type": "block-break", "category": "week-2", "required_progress": 5 }
    ]"#;

    let result = quest_storage::CatalogSnapshot::from_json_str(json);
    match result {
        Err(QuestError::Validation(ValidationError::InvalidValue { field, reason })) => {
            assert_eq!(field, "catalog");
            assert!(reason.contains("week-01"), "unexpected reason: {reason}");
        }
        other => panic!("expected catalog rejection, got {:?}", other),
    }
}

#[test]
fn canonical_week_ids_chain_prerequisites() {
    let mut config = EngineConfig::default();
    config.unlocks.require_previous_completion = true;
    let json = r#"[
        { "id": "w1", "type": "block-break", "category": "week-1", "required_progress": 5 },
        { "id": "w2", "type": "block-break", "category": "week-2", "required_progress": 5 }
    ]"#;
    let quests: Vec<Quest> = serde_json::from_str(json).unwrap();
    let next = quests[1].clone();
    let t = test_engine(config, quests);
    t.season.set_week(2);

    let report = t
        .engine
        .process(&subject_in("survival"), &user("free"), &signal("block-break", 1), [&next])
        .unwrap();
    assert_eq!(
        report.outcome(&next.key()),
        Some(&rejected(RejectReason::PrerequisiteIncomplete {
            category: "week-1".to_string()
        }))
    );
}

#[test]
fn week_one_has_no_prerequisite() {
    let mut config = EngineConfig::default();
    config.unlocks.require_previous_completion = true;
    let quest = week_quest("w1", "join", 1, 3);
    let t = test_engine(config, vec![quest.clone()]);

    let report = t
        .engine
        .process(&subject_in("survival"), &user("free"), &signal("join", 1), [&quest])
        .unwrap();
    assert_eq!(report.committed_count(), 1);
}

#[test]
fn override_equal_to_stored_progress_is_a_silent_noop() {
    let quest = week_quest("miner", "block-break", 1, 100);
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    let u = user("free");
    t.store.set_progress(&u, &quest, Progress::new(7)).unwrap();
    let writes = t.store.write_count();

    let report = t
        .engine
        .process(
            &subject_in("survival"),
            &u,
            &signal("block-break", 7).with_override(true),
            [&quest],
        )
        .unwrap();

    assert_eq!(
        report.outcome(&quest.key()),
        Some(&rejected(RejectReason::Unchanged))
    );
    assert_eq!(t.gate.event_count(), 0);
    assert_eq!(t.store.write_count(), writes);
}

#[test]
fn override_replaces_stored_progress() {
    let quest = week_quest("miner", "block-break", 1, 100);
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    let u = user("free");
    t.store.set_progress(&u, &quest, Progress::new(40)).unwrap();

    t.engine
        .process(
            &subject_in("survival"),
            &u,
            &signal("block-break", 12).with_override(true),
            [&quest],
        )
        .unwrap();

    assert_progress(t.store.as_ref(), &u, &quest, 12);
    assert!(t.gate.events()[0].absolute_override);
}

#[test]
fn veto_prevents_commit() {
    let quest = week_quest("miner", "block-break", 1, 100);
    let t = engine_with_gate(
        EngineConfig::default(),
        vec![quest.clone()],
        RecordingGate::vetoing(),
    );
    let u = user("free");

    let report = t
        .engine
        .process(&subject_in("survival"), &u, &signal("block-break", 3), [&quest])
        .unwrap();

    assert_eq!(report.outcome(&quest.key()), Some(&QuestOutcome::Vetoed));
    assert_eq!(t.store.write_count(), 0);
}

#[test]
fn amended_delta_is_what_gets_committed() {
    let quest = week_quest("miner", "block-break", 1, 100);
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    t.gate.set_cap(Some(Progress::new(1)));
    let u = user("free");

    let report = t
        .engine
        .process(&subject_in("survival"), &u, &signal("block-break", 9), [&quest])
        .unwrap();

    assert_eq!(
        report.outcome(&quest.key()),
        Some(&QuestOutcome::Committed {
            delta: Progress::new(1),
            progress: Progress::new(1),
            completed: false,
        })
    );
}

#[test]
fn global_blacklist_rejects_before_anything_runs() {
    let mut config = EngineConfig::default();
    config.blacklisted_worlds.insert("lobby".to_string());
    let quest = week_quest("miner", "block-break", 1, 100);
    let t = test_engine(config, vec![quest.clone()]);

    let report = t
        .engine
        .process(&subject_in("lobby"), &user("free"), &signal("block-break", 1), [&quest])
        .unwrap();
    assert_eq!(report.gate_rejection, Some(RejectReason::WorldNotAllowed));
    assert!(report.is_noop());
}

#[test]
fn quest_world_filter_rejects_only_that_quest() {
    let nether_only = week_quest("nether", "block-break", 1, 100)
        .with_worlds(WorldFilter::new(["nether"], Vec::<String>::new()));
    let anywhere = week_quest("anywhere", "block-break", 1, 100);
    let t = test_engine(
        EngineConfig::default(),
        vec![nether_only.clone(), anywhere.clone()],
    );

    let report = t
        .engine
        .process(
            &subject_in("survival"),
            &user("free"),
            &signal("block-break", 1),
            [&nether_only, &anywhere],
        )
        .unwrap();
    assert_eq!(
        report.outcome(&nether_only.key()),
        Some(&rejected(RejectReason::QuestWorldNotAllowed))
    );
    assert!(report.outcome(&anywhere.key()).unwrap().is_committed());
}

#[test]
fn candidates_are_processed_in_caller_order() {
    let a = week_quest("a", "block-break", 1, 100);
    let b = week_quest("b", "block-break", 1, 100);
    let t = test_engine(EngineConfig::default(), vec![a.clone(), b.clone()]);

    t.engine
        .process(&subject_in("survival"), &user("free"), &signal("block-break", 1), [&b, &a])
        .unwrap();
    let order: Vec<String> = t.gate.events().iter().map(|e| e.quest.id.clone()).collect();
    assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
}

#[test]
fn completed_quest_is_never_reopened() {
    let quest = week_quest("miner", "block-break", 1, 3);
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    let u = user("free");
    let s = subject_in("survival");

    t.engine.process(&s, &u, &signal("block-break", 5), [&quest]).unwrap();
    assert_completed(t.store.as_ref(), &u, &quest, true);

    let report = t
        .engine
        .process(&s, &u, &signal("block-break", 1).with_override(true), [&quest])
        .unwrap();
    assert_eq!(
        report.outcome(&quest.key()),
        Some(&rejected(RejectReason::AlreadyCompleted))
    );
    assert_progress(t.store.as_ref(), &u, &quest, 5);
    assert_completed(t.store.as_ref(), &u, &quest, true);
}

#[test]
fn store_failure_propagates() {
    let quest = week_quest("miner", "block-break", 1, 3);
    let ports = quest_engine::EnginePorts::new(
        Arc::new(UnavailableStore),
        Arc::new(quest_storage::CatalogSnapshot::empty()),
        Arc::new(quest_core::FixedSeason::new(1)),
        Arc::new(RecordingGate::new()),
    );
    let engine = quest_engine::QuestValidationEngine::new(EngineConfig::default(), ports).unwrap();

    let result = engine.process(
        &subject_in("survival"),
        &user("free"),
        &signal("block-break", 1),
        [&quest],
    );
    assert_storage_error(&result);
}

/// Catalog that counts how it is queried.
struct CountingCatalog {
    inner: quest_storage::CatalogSnapshot,
    lookups: AtomicUsize,
    copies: AtomicUsize,
}

impl QuestCatalog for CountingCatalog {
    fn category(&self, id: &CategoryId) -> Option<Arc<QuestCategory>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.category(id)
    }

    fn category_ids(&self) -> Vec<CategoryId> {
        self.inner.category_ids()
    }

    fn quests_in(&self, id: &CategoryId) -> HashMap<String, Arc<Quest>> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        self.inner.quests_in(id)
    }
}

#[test]
fn prerequisite_check_reads_the_catalog_once() {
    let mut config = EngineConfig::default();
    config.unlocks.require_previous_completion = true;
    let previous = week_quest("w1", "join", 1, 1);
    let next = week_quest("w2", "block-break", 2, 5);
    let catalog = Arc::new(CountingCatalog {
        inner: quest_storage::CatalogSnapshot::from_quests(vec![previous, next.clone()]).unwrap(),
        lookups: AtomicUsize::new(0),
        copies: AtomicUsize::new(0),
    });
    let ports = quest_engine::EnginePorts::new(
        Arc::new(quest_storage::InMemoryProgressStore::new()),
        catalog.clone(),
        Arc::new(quest_core::FixedSeason::new(2)),
        Arc::new(RecordingGate::new()),
    );
    let engine = quest_engine::QuestValidationEngine::new(config, ports).unwrap();

    engine
        .process(&subject_in("survival"), &user("free"), &signal("block-break", 1), [&next])
        .unwrap();

    assert_eq!(catalog.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(catalog.copies.load(Ordering::SeqCst), 0);
}

// ============================================================================
// VALIDATION-ONLY ENTRY POINT
// ============================================================================

#[test]
fn validation_only_dispatches_notification_but_never_writes() {
    let quest = week_quest("miner", "block-break", 1, 3);
    let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
    let u = user("free");

    let validity = t
        .engine
        .is_quest_valid(&subject_in("survival"), &u, &quest, &signal("block-break", 2))
        .unwrap();

    assert_eq!(validity, Validity::Accepted { delta: Progress::new(2) });
    assert_eq!(t.gate.event_count(), 1);
    assert_eq!(t.store.write_count(), 0);
}

#[test]
fn validation_only_applies_the_same_admission_rules() {
    let mut config = EngineConfig::default();
    config.unlocks.require_previous_completion = true;
    let prerequisite = week_quest("w1", "join", 1, 1);
    let quest = week_quest("w2", "block-break", 2, 3);
    let t = test_engine(config, vec![prerequisite, quest.clone()]);
    t.season.set_week(2);

    let validity = t
        .engine
        .is_quest_valid(&subject_in("survival"), &user("free"), &quest, &signal("block-break", 1))
        .unwrap();
    assert!(matches!(
        validity,
        Validity::Rejected {
            reason: RejectReason::PrerequisiteIncomplete { .. }
        }
    ));
    assert_eq!(t.gate.event_count(), 0);
}

#[test]
fn validation_only_reports_veto() {
    let quest = week_quest("miner", "block-break", 1, 3);
    let t = engine_with_gate(
        EngineConfig::default(),
        vec![quest.clone()],
        RecordingGate::vetoing(),
    );
    let validity = t
        .engine
        .is_quest_valid(&subject_in("survival"), &user("free"), &quest, &signal("block-break", 1))
        .unwrap();
    assert_eq!(validity, Validity::Vetoed);
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Once completed, a quest stays completed and its progress stops moving.
    #[test]
    fn prop_completion_is_monotonic(magnitudes in prop::collection::vec(1u64..20, 1..30)) {
        let quest = week_quest("miner", "block-break", 1, 50);
        let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
        let u = user("free");
        let s = subject_in("survival");

        let mut was_completed = false;
        let mut last = Progress::ZERO;
        for m in magnitudes {
            t.engine.process(&s, &u, &signal("block-break", m), [&quest]).unwrap();
            let completed = t.store.is_completed(&u, &quest).unwrap();
            let progress = t.store.get_progress(&u, &quest).unwrap();

            prop_assert!(!was_completed || completed);
            prop_assert!(progress >= last);
            if was_completed {
                prop_assert_eq!(progress, last);
            }
            was_completed = completed;
            last = progress;
        }
    }

    /// Anti-abuse rollback never takes progress below zero.
    #[test]
    fn prop_rollback_never_below_zero(stored in arb_progress(), magnitude in 1u64..20_000) {
        let quest = week_quest("miner", "block-break", 1, 1_000_000);
        let quest = quest.with_anti_abuse(true);
        let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
        let u = user("free");
        t.store.set_progress(&u, &quest, stored).unwrap();

        t.engine
            .process(&subject_in("survival"), &u, &signal("block-place", magnitude), [&quest])
            .unwrap();

        let after = t.store.get_progress(&u, &quest).unwrap();
        prop_assert_eq!(after, stored.saturating_sub(Progress::from(magnitude)));
    }

    /// A world restriction admits the same signals whether it is configured
    /// globally or on the quest.
    #[test]
    fn prop_world_filter_placement_is_irrelevant(
        allowed in prop::collection::hash_set(arb_world_name(), 0..3),
        denied in prop::collection::hash_set(arb_world_name(), 0..2),
        world in arb_world_name(),
    ) {
        let allowed: std::collections::HashSet<String> =
            allowed.difference(&denied).cloned().collect();

        let global_config = EngineConfig {
            whitelisted_worlds: allowed.clone(),
            blacklisted_worlds: denied.clone(),
            ..EngineConfig::default()
        };
        let open_quest = week_quest("q", "block-break", 1, 100);
        let global = test_engine(global_config, vec![open_quest.clone()]);

        let restricted_quest = open_quest
            .clone()
            .with_worlds(WorldFilter { whitelist: allowed, blacklist: denied });
        let local = test_engine(EngineConfig::default(), vec![restricted_quest.clone()]);

        let u = user("free");
        let s = subject_in(&world);
        let global_report = global
            .engine
            .process(&s, &u, &signal("block-break", 1), [&open_quest])
            .unwrap();
        let local_report = local
            .engine
            .process(&s, &u, &signal("block-break", 1), [&restricted_quest])
            .unwrap();

        prop_assert_eq!(global_report.committed_count(), local_report.committed_count());
    }

    /// An override equal to stored progress never notifies or writes.
    #[test]
    fn prop_equal_override_is_idempotent(stored in arb_progress()) {
        let quest: Quest = week_quest("q", "block-break", 1, 1_000_000);
        let t = test_engine(EngineConfig::default(), vec![quest.clone()]);
        let u = user("free");
        t.store.set_progress(&u, &quest, stored).unwrap();
        let writes = t.store.write_count();

        let override_signal = ProgressSignal::new("block-break", stored, AlwaysEligible)
            .with_override(true);
        t.engine
            .process(&subject_in("survival"), &u, &override_signal, [&quest])
            .unwrap();

        prop_assert_eq!(t.gate.event_count(), 0);
        prop_assert_eq!(t.store.write_count(), writes);
        prop_assert_eq!(t.store.get_progress(&u, &quest).unwrap(), stored);
    }
}
