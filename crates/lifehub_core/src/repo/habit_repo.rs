//! Persisted habit array repository.
//!
//! # Responsibility
//! - Load and save one user's `Habit` array as JSON under an opaque key.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Habit IDs are unique inside one stored array.
//! - `save` replaces the whole array in one key-value write.

use crate::model::habit::Habit;
use crate::repo::kv_store::{KeyValueStore, RepoError, RepoResult};
use std::collections::BTreeSet;

/// Repository over one storage key of a `KeyValueStore`.
pub struct HabitRepository<S: KeyValueStore> {
    store: S,
    storage_key: String,
}

impl<S: KeyValueStore> HabitRepository<S> {
    /// Creates a repository bound to `storage_key`.
    ///
    /// Use `StorageConfig::storage_key` or `storage_key_for` to derive the key.
    pub fn new(store: S, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Loads the stored array; an absent key is an empty list.
    pub fn load(&self) -> RepoResult<Vec<Habit>> {
        let Some(raw) = self.store.get(&self.storage_key)? else {
            return Ok(Vec::new());
        };

        let habits: Vec<Habit> = serde_json::from_str(&raw).map_err(|err| {
            RepoError::InvalidData(format!("`{}` is not a habit array: {err}", self.storage_key))
        })?;

        let mut seen = BTreeSet::new();
        for habit in &habits {
            habit.validate().map_err(|err| {
                RepoError::InvalidData(format!("habit {} is invalid: {err}", habit.id))
            })?;
            if !seen.insert(habit.id) {
                return Err(RepoError::InvalidData(format!(
                    "duplicate habit id {} in `{}`",
                    habit.id, self.storage_key
                )));
            }
        }

        Ok(habits)
    }

    /// Replaces the stored array.
    pub fn save(&self, habits: &[Habit]) -> RepoResult<()> {
        let raw = serde_json::to_string(habits).map_err(RepoError::Encode)?;
        self.store.set(&self.storage_key, &raw)
    }

    /// Deletes the stored array. Returns whether anything was stored.
    pub fn clear(&self) -> RepoResult<bool> {
        self.store.delete(&self.storage_key)
    }
}

#[cfg(test)]
mod tests {
    use super::HabitRepository;
    use crate::model::habit::{Frequency, Habit};
    use crate::repo::kv_store::{KeyValueStore, MemoryKeyValueStore, RepoError};

    const KEY: &str = "lifehub.habits.tests";

    #[test]
    fn absent_key_loads_as_empty_and_clear_reports_presence() {
        let store = MemoryKeyValueStore::new();
        let repo = HabitRepository::new(&store, KEY);
        assert!(repo.load().unwrap().is_empty());
        assert!(!repo.clear().unwrap());

        repo.save(&[Habit::new("Walk", Frequency::Daily).unwrap()])
            .unwrap();
        assert!(repo.clear().unwrap());
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[test]
    fn save_then_load_keeps_array_order() {
        let store = MemoryKeyValueStore::new();
        let repo = HabitRepository::new(&store, KEY);
        let habits = vec![
            Habit::new("Walk", Frequency::Daily).unwrap(),
            Habit::new("Plan week", Frequency::Weekly).unwrap(),
        ];

        repo.save(&habits).unwrap();
        assert_eq!(repo.load().unwrap(), habits);
    }

    #[test]
    fn invalid_persisted_habit_is_reported_not_masked() {
        let store = MemoryKeyValueStore::new();
        store
            .set(
                KEY,
                r#"[{"id":"11111111-2222-4333-8444-555555555555","title":"Walk","frequency":"daily","level":0}]"#,
            )
            .unwrap();

        let err = HabitRepository::new(&store, KEY).load().unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("level")));
    }
}
