//! Integration tests for result stores

use stratify::pipeline::{layered_random_grouping, FineTuneConfig, GroupingError};
use stratify::store::{
    fine_tune_stored, load_required, GroupingStore, JsonDirStore, MemoryStore, ID_LENGTH,
};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;
use common::*;

fn layers() -> Vec<String> {
    vec!["weight".to_string(), "glucose".to_string()]
}

#[test]
fn test_json_dir_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonDirStore::open(temp_dir.path().join("results")).unwrap();
    let grouping =
        layered_random_grouping(&create_subject_dataframe(), 3, &layers(), None, &mut test_rng(40)).unwrap();

    let saved = store.save(&grouping, 3, &layers()).unwrap();
    assert_eq!(saved.id.len(), ID_LENGTH);
    assert!(store.dir().join(format!("{}.json", saved.id)).exists());

    let loaded = store.load(&saved.id).unwrap().expect("record exists");
    assert_eq!(loaded.id, saved.id);
    assert_eq!(loaded.group_count, 3);
    assert_eq!(loaded.layer_names(), layers());
    assert_eq!(loaded.data.sizes(), grouping.sizes());
    for index in 0..3 {
        assert_eq!(group_ids(&loaded.data, index), group_ids(&grouping, index));
    }
}

#[test]
fn test_json_dir_store_list_is_sorted() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonDirStore::open(temp_dir.path()).unwrap();
    let grouping = stratify::pipeline::Grouping::empty(2);

    let mut expected: Vec<String> = (0..4)
        .map(|_| store.save(&grouping, 2, &layers()).unwrap().id)
        .collect();
    expected.sort();

    // Files that are not results are ignored
    std::fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();

    assert_eq!(store.list().unwrap(), expected);
}

#[test]
fn test_json_dir_store_concurrent_saves_never_share_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonDirStore::open(temp_dir.path()).unwrap();
    let grouping =
        layered_random_grouping(&create_subject_dataframe(), 2, &layers(), None, &mut test_rng(41)).unwrap();

    let saved: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    (0..8)
                        .map(|_| store.save(&grouping, 2, &layers()).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let mut listed = store.list().unwrap();
    assert_eq!(listed.len(), 64);
    let mut expected = saved.clone();
    expected.sort();
    listed.sort();
    assert_eq!(listed, expected);
    for id in &saved {
        let loaded = store.load(id).unwrap().expect("every save has its own file");
        assert_eq!(loaded.data.sizes(), grouping.sizes());
    }
}

#[test]
fn test_unknown_and_malformed_ids() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonDirStore::open(temp_dir.path()).unwrap();

    assert!(store.load("ABCDEF").unwrap().is_none());
    assert!(store.load("../secret").unwrap().is_none());
    assert!(matches!(
        load_required(&store, "ABCDEF"),
        Err(GroupingError::NotFound(id)) if id == "ABCDEF"
    ));
}

#[test]
fn test_fine_tune_stored_uses_recorded_settings() {
    let store = MemoryStore::new();
    let grouping =
        layered_random_grouping(&create_subject_dataframe(), 3, &layers(), None, &mut test_rng(41)).unwrap();
    let saved = store.save(&grouping, 3, &layers()).unwrap();

    let config = FineTuneConfig {
        simulation_count: 10,
        ..Default::default()
    };
    let (record, report) = fine_tune_stored(&store, &saved.id, config).unwrap();
    assert_eq!(record.id, saved.id);
    assert!(report.final_score <= report.original_score);

    assert!(matches!(
        fine_tune_stored(&store, "000000", config),
        Err(GroupingError::NotFound(_))
    ));
}
