//! Persistence of grouping results
//!
//! The grouping core never creates or tracks identifiers itself; a
//! [`GroupingStore`] assigns one on save and hands the record back on load,
//! together with the group count and layer list it was produced with.

mod json_dir;
mod memory;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pipeline::error::{GroupingError, Result};
use crate::pipeline::{fine_tune, FineTuneConfig, FineTuneReport, Grouping};

/// Characters used for generated identifiers.
const ID_ALPHABET: &[u8] = b"0123456789ABCDEF";

/// Length of generated identifiers.
pub const ID_LENGTH: usize = 6;

/// Attempts at finding an unused identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 64;

/// A grouping result as kept by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGrouping {
    pub id: String,
    pub data: Grouping,
    pub group_count: usize,
    /// Layer names joined with commas
    pub layers: String,
    pub created_at: DateTime<Utc>,
}

impl StoredGrouping {
    /// Layer names split back out of the comma-joined string.
    pub fn layer_names(&self) -> Vec<String> {
        self.layers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Storage for grouping results keyed by an opaque identifier.
pub trait GroupingStore {
    /// Persist `data` under a fresh identifier and return the stored record.
    fn save(&self, data: &Grouping, group_count: usize, layers: &[String]) -> Result<StoredGrouping>;

    /// Fetch a record, `Ok(None)` when the identifier is unknown.
    fn load(&self, id: &str) -> Result<Option<StoredGrouping>>;

    /// Identifiers of every stored record, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// Fetch a record or fail with [`GroupingError::NotFound`].
pub fn load_required<S: GroupingStore + ?Sized>(store: &S, id: &str) -> Result<StoredGrouping> {
    store
        .load(id)?
        .ok_or_else(|| GroupingError::NotFound(id.to_string()))
}

/// Fine-tune the stored result `id` using its recorded group count and layers.
pub fn fine_tune_stored<S: GroupingStore + ?Sized>(
    store: &S,
    id: &str,
    config: FineTuneConfig,
) -> Result<(StoredGrouping, FineTuneReport)> {
    let record = load_required(store, id)?;
    let layers = record.layer_names();
    let report = fine_tune(&record.data, record.group_count, &layers, config)?;
    Ok((record, report))
}

/// Random identifier such as `3FA09C`.
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Generate identifiers until `taken` reports one free.
fn fresh_id(mut taken: impl FnMut(&str) -> Result<bool>) -> Result<String> {
    let mut rng = rand::thread_rng();
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = generate_id(&mut rng);
        if !taken(&id)? {
            return Ok(id);
        }
    }
    Err(GroupingError::invalid("could not allocate a free result identifier"))
}

/// True when `id` could have come from [`generate_id`] or a similar scheme.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rng::seeded;

    #[test]
    fn test_generated_ids_are_hex() {
        let id = generate_id(&mut seeded(11));
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_layer_names_split() {
        let record = StoredGrouping {
            id: "ABC123".into(),
            data: Grouping::empty(2),
            group_count: 2,
            layers: "weight, food,,glucose".into(),
            created_at: Utc::now(),
        };
        assert_eq!(record.layer_names(), vec!["weight", "food", "glucose"]);
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("A1B2C3"));
        assert!(!is_valid_id("../etc"));
        assert!(!is_valid_id(""));
    }
}
