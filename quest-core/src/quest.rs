//! Quest definitions and categories.

use crate::{CategoryId, Condition, Progress, User, ValidationError, WorldFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// QUEST KEY
// ============================================================================

/// Identity of a quest across the catalog: its category plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestKey {
    pub category: String,
    pub id: String,
}

impl fmt::Display for QuestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.id)
    }
}

// ============================================================================
// QUEST
// ============================================================================

/// Immutable quest definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    /// Signal type this quest responds to.
    #[serde(rename = "type")]
    pub quest_type: String,
    pub category: CategoryId,
    /// Progress at which the quest counts as completed.
    pub required_progress: Progress,
    #[serde(default)]
    pub condition: Condition,
    /// Restricts the quest to holders of one pass.
    #[serde(default)]
    pub exclusive_to: Option<String>,
    /// Opt into rollback when the substitute action of the pair is observed.
    #[serde(default)]
    pub anti_abuse: bool,
    #[serde(default)]
    pub worlds: WorldFilter,
}

impl Quest {
    pub fn new(
        id: impl Into<String>,
        quest_type: impl Into<String>,
        category: CategoryId,
        required_progress: impl Into<Progress>,
    ) -> Self {
        Self {
            id: id.into(),
            quest_type: quest_type.into(),
            category,
            required_progress: required_progress.into(),
            condition: Condition::Any,
            exclusive_to: None,
            anti_abuse: false,
            worlds: WorldFilter::open(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<Condition>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn with_exclusive_to(mut self, pass_id: impl Into<String>) -> Self {
        self.exclusive_to = Some(pass_id.into());
        self
    }

    pub fn with_anti_abuse(mut self, anti_abuse: bool) -> Self {
        self.anti_abuse = anti_abuse;
        self
    }

    pub fn with_worlds(mut self, worlds: WorldFilter) -> Self {
        self.worlds = worlds;
        self
    }

    pub fn key(&self) -> QuestKey {
        QuestKey {
            category: self.category.as_str().to_string(),
            id: self.id.clone(),
        }
    }

    /// Case-insensitive comparison against an incoming signal type.
    pub fn responds_to(&self, signal_type: &str) -> bool {
        self.quest_type.eq_ignore_ascii_case(signal_type)
    }

    /// Whether the user's pass may progress this quest.
    pub fn is_available_to(&self, user: &User) -> bool {
        match &self.exclusive_to {
            Some(pass_id) => user.holds_pass(pass_id),
            None => true,
        }
    }

    pub fn is_daily(&self) -> bool {
        self.category.is_daily()
    }

    pub fn week_number(&self) -> u32 {
        self.category.week_number()
    }
}

// ============================================================================
// QUEST CATEGORY
// ============================================================================

/// A named bucket of quests.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestCategory {
    id: CategoryId,
    quests: HashMap<String, Arc<Quest>>,
}

impl QuestCategory {
    pub fn new(id: CategoryId) -> Self {
        Self {
            id,
            quests: HashMap::new(),
        }
    }

    /// Build a category, rejecting duplicate ids and quests filed elsewhere.
    pub fn from_quests(
        id: CategoryId,
        quests: impl IntoIterator<Item = Quest>,
    ) -> Result<Self, ValidationError> {
        let mut category = Self::new(id);
        for quest in quests {
            category.insert(quest)?;
        }
        Ok(category)
    }

    pub fn insert(&mut self, quest: Quest) -> Result<(), ValidationError> {
        if quest.category != self.id {
            return Err(ValidationError::CategoryMismatch {
                quest: quest.id,
                expected: self.id.to_string(),
                found: quest.category.to_string(),
            });
        }
        if self.quests.contains_key(&quest.id) {
            return Err(ValidationError::DuplicateQuest {
                category: self.id.to_string(),
                id: quest.id,
            });
        }
        self.quests.insert(quest.id.clone(), Arc::new(quest));
        Ok(())
    }

    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    pub fn get(&self, quest_id: &str) -> Option<&Arc<Quest>> {
        self.quests.get(quest_id)
    }

    pub fn quests(&self) -> &HashMap<String, Arc<Quest>> {
        &self.quests
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
