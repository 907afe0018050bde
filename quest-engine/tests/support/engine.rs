use std::sync::Arc;

use quest_core::{EngineConfig, FixedSeason, Quest};
use quest_engine::{EnginePorts, QuestValidationEngine};
use quest_events::NotificationGate;
use quest_storage::{CatalogSnapshot, InMemoryProgressStore};
use quest_test_utils::RecordingGate;

/// Engine wired to in-memory ports, with handles kept for inspection.
pub struct TestEngine<G> {
    pub engine: QuestValidationEngine,
    pub store: Arc<InMemoryProgressStore>,
    pub season: Arc<FixedSeason>,
    pub gate: Arc<G>,
}

pub fn engine_with_gate<G>(config: EngineConfig, quests: Vec<Quest>, gate: G) -> TestEngine<G>
where
    G: NotificationGate + 'static,
{
    let store = Arc::new(InMemoryProgressStore::new());
    let season = Arc::new(FixedSeason::new(1));
    let gate = Arc::new(gate);
    let catalog = CatalogSnapshot::from_quests(quests).expect("consistent test catalog");

    let ports = EnginePorts::new(
        store.clone(),
        Arc::new(catalog),
        season.clone(),
        gate.clone(),
    );
    let engine = QuestValidationEngine::new(config, ports).expect("valid test config");

    TestEngine {
        engine,
        store,
        season,
        gate,
    }
}

pub fn test_engine(config: EngineConfig, quests: Vec<Quest>) -> TestEngine<RecordingGate> {
    engine_with_gate(config, quests, RecordingGate::new())
}
