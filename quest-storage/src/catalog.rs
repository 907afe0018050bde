//! Quest catalog: the season's quest definitions, grouped by category.
//!
//! A catalog is built once per season and never mutated. Season rollover
//! swaps a fresh [`CatalogSnapshot`] into a [`SeasonCatalog`]; readers keep
//! whatever snapshot they already hold.

use chrono::Utc;
use quest_core::{
    CategoryId, Quest, QuestCategory, QuestKey, QuestResult, Timestamp, ValidationError,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

// ============================================================================
// CATALOG TRAIT
// ============================================================================

/// Read-only access to quest definitions.
pub trait QuestCatalog: Send + Sync {
    fn category(&self, id: &CategoryId) -> Option<Arc<QuestCategory>>;

    fn category_ids(&self) -> Vec<CategoryId>;

    fn category_exists(&self, id: &CategoryId) -> bool {
        self.category(id).is_some()
    }

    /// Quests of a category keyed by quest id. Empty when the category is
    /// unknown.
    fn quests_in(&self, id: &CategoryId) -> HashMap<String, Arc<Quest>> {
        self.category(id)
            .map(|category| category.quests().clone())
            .unwrap_or_default()
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Immutable set of categories loaded at one point in time.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    categories: HashMap<CategoryId, Arc<QuestCategory>>,
    loaded_at: Timestamp,
}

impl CatalogSnapshot {
    pub fn empty() -> Self {
        Self {
            categories: HashMap::new(),
            loaded_at: Utc::now(),
        }
    }

    pub fn from_categories(
        categories: impl IntoIterator<Item = QuestCategory>,
    ) -> Result<Self, ValidationError> {
        let mut snapshot = Self::empty();
        for category in categories {
            let id = category.id().clone();
            if snapshot.categories.contains_key(&id) {
                return Err(ValidationError::DuplicateCategory {
                    category: id.to_string(),
                });
            }
            snapshot.categories.insert(id, Arc::new(category));
        }
        Ok(snapshot)
    }

    /// Group quests by their declared category.
    pub fn from_quests(quests: impl IntoIterator<Item = Quest>) -> Result<Self, ValidationError> {
        let mut grouped: BTreeMap<String, QuestCategory> = BTreeMap::new();
        for quest in quests {
            grouped
                .entry(quest.category.as_str().to_string())
                .or_insert_with(|| QuestCategory::new(quest.category.clone()))
                .insert(quest)?;
        }
        Self::from_categories(grouped.into_values())
    }

    /// Load a JSON array of quest definitions.
    pub fn from_json_str(json: &str) -> QuestResult<Self> {
        let quests: Vec<Quest> =
            serde_json::from_str(json).map_err(|e| ValidationError::InvalidValue {
                field: "catalog".to_string(),
                reason: e.to_string(),
            })?;
        let snapshot = Self::from_quests(quests)?;
        tracing::debug!(
            categories = snapshot.categories.len(),
            quests = snapshot.quest_count(),
            "Loaded quest catalog"
        );
        Ok(snapshot)
    }

    pub fn quest(&self, key: &QuestKey) -> Option<Arc<Quest>> {
        let id = CategoryId::parse(key.category.as_str()).ok()?;
        self.categories.get(&id)?.get(&key.id).cloned()
    }

    pub fn quest_count(&self) -> usize {
        self.categories.values().map(|c| c.len()).sum()
    }

    pub fn loaded_at(&self) -> Timestamp {
        self.loaded_at
    }
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl QuestCatalog for CatalogSnapshot {
    fn category(&self, id: &CategoryId) -> Option<Arc<QuestCategory>> {
        self.categories.get(id).cloned()
    }

    fn category_ids(&self) -> Vec<CategoryId> {
        let mut ids: Vec<CategoryId> = self.categories.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }
}

// ============================================================================
// SEASON CATALOG
// ============================================================================

/// Catalog whose snapshot can be replaced at season rollover.
#[derive(Debug, Default)]
pub struct SeasonCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl SeasonCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Atomically install a new snapshot, returning the previous one.
    pub fn replace(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let next = Arc::new(snapshot);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::info!(quests = next.quest_count(), "Replacing season catalog");
        std::mem::replace(&mut *guard, next)
    }
}

impl QuestCatalog for SeasonCatalog {
    fn category(&self, id: &CategoryId) -> Option<Arc<QuestCategory>> {
        self.snapshot().category(id)
    }

    fn category_ids(&self) -> Vec<CategoryId> {
        self.snapshot().category_ids()
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every loaded quest is reachable through its key.
        #[test]
        fn prop_every_quest_is_reachable(weeks in proptest::collection::vec(1u32..6, 1..20)) {
            let quests: Vec<Quest> = weeks
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    Quest::new(format!("q{}", i), "block-break", CategoryId::week(*w).unwrap(), 1u32)
                })
                .collect();
            let keys: Vec<QuestKey> = quests.iter().map(Quest::key).collect();

            let snapshot = CatalogSnapshot::from_quests(quests).unwrap();
            prop_assert_eq!(snapshot.quest_count(), keys.len());
            for key in &keys {
                prop_assert!(snapshot.quest(key).is_some());
            }
        }
    }
}
