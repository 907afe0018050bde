//! Engine configuration
//!
//! Read once when the engine is built and never mutated afterwards. Keys use
//! kebab-case so a settings file reads like:
//!
//! ```toml
//! whitelisted-worlds = ["survival"]
//! blacklisted-worlds = []
//! lock-scope = "global"
//!
//! [unlocks]
//! lock-previous-weeks = false
//! require-previous-completion = true
//!
//! [season-finished]
//! stop-daily-quests = true
//! stop-other-quests = false
//!
//! [anti-abuse]
//! substitutable-pair = ["block-place", "block-break"]
//! ```

use crate::{ConfigError, QuestResult, WorldFilter, BLOCK_BREAK, BLOCK_PLACE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The two complementary actions recognised by the anti-abuse pass.
pub const DEFAULT_SUBSTITUTABLE_PAIR: [&str; 2] = [BLOCK_PLACE, BLOCK_BREAK];

/// Granularity of the processing lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockScope {
    /// One lock for every user and quest handled by the engine.
    #[default]
    Global,
    /// One lock per user.
    PerUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct UnlockConfig {
    /// Refuse progress on weeks before the current one.
    #[serde(default)]
    pub lock_previous_weeks: bool,
    /// Week N only progresses once every quest of week N-1 is completed.
    #[serde(default)]
    pub require_previous_completion: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SeasonFinishedConfig {
    #[serde(default)]
    pub stop_daily_quests: bool,
    #[serde(default)]
    pub stop_other_quests: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AntiAbuseConfig {
    pub substitutable_pair: [String; 2],
}

impl Default for AntiAbuseConfig {
    fn default() -> Self {
        Self {
            substitutable_pair: DEFAULT_SUBSTITUTABLE_PAIR.map(str::to_string),
        }
    }
}

/// Master configuration struct for the validation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub whitelisted_worlds: HashSet<String>,
    #[serde(default)]
    pub blacklisted_worlds: HashSet<String>,
    #[serde(default)]
    pub unlocks: UnlockConfig,
    #[serde(default)]
    pub season_finished: SeasonFinishedConfig,
    #[serde(default)]
    pub anti_abuse: AntiAbuseConfig,
    #[serde(default)]
    pub lock_scope: LockScope,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> QuestResult<Self> {
        let config: EngineConfig = toml::from_str(contents).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: &Path) -> QuestResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Global world filter built from the whitelist and blacklist.
    pub fn world_filter(&self) -> WorldFilter {
        WorldFilter {
            whitelist: self.whitelisted_worlds.clone(),
            blacklist: self.blacklisted_worlds.clone(),
        }
    }

    /// True when the season end disables every quest class.
    pub fn stops_everything_on_season_end(&self) -> bool {
        self.season_finished.stop_daily_quests && self.season_finished.stop_other_quests
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - substitutable pair members are non-empty and distinct
    /// - no world is both whitelisted and blacklisted
    pub fn validate(&self) -> QuestResult<()> {
        let [first, second] = &self.anti_abuse.substitutable_pair;
        if first.trim().is_empty() || second.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "anti-abuse.substitutable-pair".to_string(),
                value: format!("{:?}", self.anti_abuse.substitutable_pair),
                reason: "signal types must not be empty".to_string(),
            }
            .into());
        }
        if first.eq_ignore_ascii_case(second) {
            return Err(ConfigError::InvalidValue {
                field: "anti-abuse.substitutable-pair".to_string(),
                value: format!("{:?}", self.anti_abuse.substitutable_pair),
                reason: "members must differ".to_string(),
            }
            .into());
        }

        if let Some(world) = self.whitelisted_worlds.intersection(&self.blacklisted_worlds).next() {
            return Err(ConfigError::IncompatibleOptions {
                option_a: format!("whitelisted-worlds[{}]", world),
                option_b: format!("blacklisted-worlds[{}]", world),
            }
            .into());
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
