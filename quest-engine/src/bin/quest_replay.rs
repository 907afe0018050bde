//! Quest Replay
//!
//! Replays a recorded sequence of signals against an in-memory engine and
//! prints the per-signal reports and the final progress table as JSON.
//!
//! Usage:
//!   quest-replay season.json --config quests.toml
//!
//! The replay file looks like:
//!
//! ```json
//! {
//!   "season": { "current_week": 2, "ended": false },
//!   "quests": [{ "id": "arrows", "type": "throw-projectile", "category": "week-1", "required_progress": 16 }],
//!   "users": [{ "user_id": "0190...", "pass_id": "free" }],
//!   "signals": [{ "user": "0190...", "world": "survival",
//!                 "signal": { "signal_type": "throw-projectile", "magnitude": 1, "context": { "roots": ["ARROW"] } } }]
//! }
//! ```

use clap::Parser;
use quest_core::{
    ConfigError, EngineConfig, FixedSeason, Progress, Quest, QuestKey, QuestResult, Subject, User,
    UserId, ValidationError,
};
use quest_engine::telemetry::init_tracing;
use quest_engine::{EnginePorts, ProcessReport, ProgressSignal, QuestValidationEngine};
use quest_events::ListenerGate;
use quest_storage::{CatalogSnapshot, InMemoryProgressStore, QuestCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "quest-replay")]
#[command(about = "Replay recorded activity signals through the quest engine")]
struct Args {
    /// Replay file (JSON)
    replay: PathBuf,

    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long, env = "QUEST_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Deserialize)]
struct SeasonState {
    current_week: u32,
    #[serde(default)]
    ended: bool,
}

#[derive(Debug, Deserialize)]
struct RecordedSignal {
    user: UserId,
    world: String,
    signal: ProgressSignal,
}

#[derive(Debug, Deserialize)]
struct Replay {
    season: SeasonState,
    quests: Vec<Quest>,
    users: Vec<User>,
    signals: Vec<RecordedSignal>,
}

#[derive(Debug, Serialize)]
struct ProgressRow {
    user: UserId,
    quest: QuestKey,
    progress: Progress,
    completed: bool,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    reports: Vec<ProcessReport>,
    progress: Vec<ProgressRow>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = init_tracing(args.json_logs) {
        eprintln!("Failed to initialize tracing: {}", e);
    }

    match run(&args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Replay failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> QuestResult<String> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let output = replay(config, load_replay(&args.replay)?)?;
    render(&output, args.pretty)
}

fn replay(config: EngineConfig, replay: Replay) -> QuestResult<ReplayOutput> {
    let store = Arc::new(InMemoryProgressStore::new());
    let catalog = Arc::new(CatalogSnapshot::from_quests(replay.quests)?);
    let season = Arc::new(FixedSeason::new(replay.season.current_week));
    season.set_ended(replay.season.ended);

    let ports = EnginePorts::new(
        store.clone(),
        catalog.clone(),
        season,
        Arc::new(ListenerGate::new()),
    );
    let engine = QuestValidationEngine::new(config, ports)?;

    let mut candidates: Vec<Arc<Quest>> = catalog
        .category_ids()
        .iter()
        .flat_map(|id| catalog.quests_in(id).into_values())
        .collect();
    candidates.sort_by_key(|quest| quest.key());

    let users: HashMap<UserId, User> = replay
        .users
        .into_iter()
        .map(|user| (user.user_id, user))
        .collect();

    let mut reports = Vec::with_capacity(replay.signals.len());
    for recorded in &replay.signals {
        let user = users
            .get(&recorded.user)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "signals.user".to_string(),
                reason: format!("unknown user {}", recorded.user),
            })?;
        let subject = Subject::new(user.user_id, recorded.world.as_str());
        reports.push(engine.process(
            &subject,
            user,
            &recorded.signal,
            candidates.iter().map(Arc::as_ref),
        )?);
    }

    let mut progress = Vec::new();
    let mut user_ids: Vec<&UserId> = users.keys().collect();
    user_ids.sort();
    for user_id in user_ids {
        for quest in &candidates {
            if let Some(entry) = store.entry(*user_id, &quest.key()) {
                progress.push(ProgressRow {
                    user: *user_id,
                    quest: quest.key(),
                    progress: entry.progress,
                    completed: entry.completed,
                });
            }
        }
    }

    tracing::info!(
        signals = reports.len(),
        entries = progress.len(),
        "Replay finished"
    );

    Ok(ReplayOutput { reports, progress })
}

fn render(output: &ReplayOutput, pretty: bool) -> QuestResult<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(output)
    } else {
        serde_json::to_string(output)
    };
    rendered.map_err(|e| {
        ConfigError::ParseFailed {
            reason: format!("failed to render output: {}", e),
        }
        .into()
    })
}

fn load_replay(path: &Path) -> QuestResult<Replay> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        ConfigError::ParseFailed {
            reason: format!("{}: {}", path.display(), e),
        }
        .into()
    })
}
