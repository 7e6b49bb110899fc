//! In-process result store

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::Utc;

use super::{fresh_id, GroupingStore, StoredGrouping};
use crate::pipeline::error::Result;
use crate::pipeline::Grouping;

/// Keeps records in a mutex-guarded map; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, StoredGrouping>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredGrouping>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GroupingStore for MemoryStore {
    fn save(&self, data: &Grouping, group_count: usize, layers: &[String]) -> Result<StoredGrouping> {
        let mut records = self.records();
        let id = fresh_id(|id| Ok(records.contains_key(id)))?;
        let record = StoredGrouping {
            id: id.clone(),
            data: data.clone(),
            group_count,
            layers: layers.join(","),
            created_at: Utc::now(),
        };
        records.insert(id, record.clone());
        Ok(record)
    }

    fn load(&self, id: &str) -> Result<Option<StoredGrouping>> {
        Ok(self.records().get(id).cloned())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.records().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let saved = store
            .save(&Grouping::empty(2), 2, &["weight".to_string(), "food".to_string()])
            .unwrap();
        let loaded = store.load(&saved.id).unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.layers, "weight,food");
        assert_eq!(store.list().unwrap(), vec![saved.id]);
    }

    #[test]
    fn test_unknown_id_is_none() {
        assert!(MemoryStore::new().load("FFFFFF").unwrap().is_none());
    }
}
