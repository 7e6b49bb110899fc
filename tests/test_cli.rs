//! Tests for CLI argument parsing and end-to-end runs of the binary

use assert_cmd::Command;
use clap::Parser;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

use stratify::cli::{Cli, Commands, DEFAULT_STORE_DIR};
use stratify::pipeline::StratificationMode;

#[path = "common/mod.rs"]
mod common;
use common::*;

#[test]
fn test_group_default_values() {
    let cli = Cli::parse_from(["stratify", "group", "-i", "data.csv", "-l", "weight"]);
    let Commands::Group(args) = cli.command else {
        panic!("expected group subcommand");
    };

    assert_eq!(args.input, PathBuf::from("data.csv"));
    assert_eq!(args.groups, 3, "Default group count should be 3");
    assert_eq!(args.attempts, 10, "Default attempts should be 10");
    assert_eq!(args.mode, StratificationMode::Shuffled);
    assert_eq!(args.store, PathBuf::from(DEFAULT_STORE_DIR));
    assert_eq!(args.infer_schema_length, 10000);
    assert!(args.explicit_sizes().is_none());
    assert!(args.seed.is_none());
    assert!(!args.no_save);
    assert_eq!(cli.verbose, 0);
}

#[test]
fn test_group_lists_and_mode() {
    let cli = Cli::parse_from([
        "stratify",
        "-vv",
        "group",
        "-i",
        "data.csv",
        "-l",
        "weight,glucose",
        "-g",
        "2",
        "--sizes",
        "6,4",
        "--mode",
        "proportional",
        "--seed",
        "7",
    ]);
    assert_eq!(cli.verbose, 2);
    let Commands::Group(args) = cli.command else {
        panic!("expected group subcommand");
    };
    assert_eq!(args.layers, vec!["weight", "glucose"]);
    assert_eq!(args.explicit_sizes(), Some(&[6, 4][..]));
    assert_eq!(args.mode, StratificationMode::Proportional);
    assert_eq!(args.seed, Some(7));
}

#[test]
fn test_zero_counts_rejected() {
    for flag in ["-g", "--attempts"] {
        let result = Cli::try_parse_from(["stratify", "group", "-i", "d.csv", "-l", "w", flag, "0"]);
        assert!(result.is_err(), "{} 0 should be rejected", flag);
    }
    let result = Cli::try_parse_from(["stratify", "group", "-i", "d.csv", "-l", "w", "--mode", "sorted"]);
    assert!(result.is_err(), "unknown mode should be rejected");
}

#[test]
fn test_layers_required() {
    assert!(Cli::try_parse_from(["stratify", "group", "-i", "d.csv"]).is_err());
}

#[test]
fn test_fine_tune_defaults() {
    let cli = Cli::parse_from(["stratify", "fine-tune", "--id", "A1B2C3"]);
    let Commands::FineTune(args) = cli.command else {
        panic!("expected fine-tune subcommand");
    };
    assert_eq!(args.id, "A1B2C3");
    assert_eq!(args.simulations, 100);
    assert_eq!((args.min_extract, args.max_extract), (1, 3));
    assert!(!args.save);
}

#[test]
fn test_sample_defaults() {
    let cli = Cli::parse_from(["stratify", "sample", "-i", "d.csv", "-l", "weight"]);
    let Commands::Sample(args) = cli.command else {
        panic!("expected sample subcommand");
    };
    assert_eq!(args.simulations, 100);
    assert_eq!(args.sample_size, 1);
    assert_eq!(args.iterations, 5);
    assert_eq!(args.groups, 3);
}

#[test]
fn test_group_then_stats_end_to_end() {
    let (dir, csv) = create_temp_csv("subjects.csv", &subject_csv());
    let store = dir.path().join("results");
    let output = dir.path().join("result.json");

    Command::cargo_bin("stratify")
        .unwrap()
        .args(["group", "-l", "weight,glucose", "-g", "3", "--seed", "1", "--attempts", "4"])
        .arg("-i")
        .arg(&csv)
        .arg("--store")
        .arg(&store)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("GROUP STATISTICS"));

    let export: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(export["sizes"], serde_json::json!([10, 10, 10]));
    let id = export["metadata"]["result_id"].as_str().unwrap().to_string();
    assert!(store.join(format!("{}.json", id)).exists());

    Command::cargo_bin("stratify")
        .unwrap()
        .args(["stats", "--id", &id])
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("group_3"));

    Command::cargo_bin("stratify")
        .unwrap()
        .arg("list")
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()));
}

#[test]
fn test_unknown_layer_fails() {
    let (dir, csv) = create_temp_csv("subjects.csv", &subject_csv());
    Command::cargo_bin("stratify")
        .unwrap()
        .args(["group", "-l", "height"])
        .arg("-i")
        .arg(&csv)
        .arg("--store")
        .arg(dir.path().join("results"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("height"));
}

#[test]
fn test_fine_tune_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("stratify")
        .unwrap()
        .args(["fine-tune", "--id", "ABCDEF", "--simulations", "2"])
        .arg("--store")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ABCDEF"));
}
