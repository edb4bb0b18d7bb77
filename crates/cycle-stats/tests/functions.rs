//! Per-function pipeline: trial-major logs -> reshaped files -> paired report
//!
//! Run with: cargo test -p cycle-stats --test functions

#[path = "common/tree.rs"]
mod tree;

use std::fs;
use std::num::NonZeroUsize;

use cycle_stats::{cache, AnalysisError, FunctionCollection, TrialReshaper};
use pretty_assertions::assert_eq;
use tree::DatasetTree;

const FUNCTIONS: [&str; 3] = ["Parser::Parse", "js::RunScript", "Parser::Parse"];

/// Trial-major log where call `f` of trial `t` takes `base[f] + t % 3` cycles.
fn trial_log(base: [u64; 3], trials: u64) -> String {
    let mut log = String::new();
    for t in 0..trials {
        for (f, name) in FUNCTIONS.iter().enumerate() {
            log.push_str(&format!("{},{}\n", name, base[f] + t % 3));
        }
    }
    log
}

fn reshaper() -> TrialReshaper {
    TrialReshaper::new(NonZeroUsize::new(FUNCTIONS.len()).unwrap())
}

#[test]
fn test_reshape_then_compare() {
    let tree = DatasetTree::new();
    let without_log = tree.write_raw("raw/without.csv", &trial_log([100, 10, 200], 6));
    let with_log = tree.write_raw("raw/with.csv", &trial_log([150, 11, 220], 6));
    let without = tree.path().join("without.csv");
    let with = tree.path().join("with.csv");

    let summary = reshaper().with_trials(6).reshape_file(&without_log, &without).unwrap();
    assert_eq!((summary.functions, summary.trials), (3, 6));
    reshaper().reshape_file(&with_log, &with).unwrap();

    assert_eq!(
        fs::read_to_string(&without).unwrap().lines().next(),
        Some("Parser::Parse,100,101,102,100,101,102")
    );

    let collection = FunctionCollection::from_reshaped_files(&without, &with).unwrap();
    assert_eq!(collection.len(), 3);

    let overheads: Vec<f64> = collection.iter().map(|r| r.raw_overhead).collect();
    assert_eq!(overheads, vec![151.0 / 101.0, 12.0 / 11.0, 221.0 / 201.0]);

    let parser = collection.report(Some("Parser::Parse")).unwrap();
    assert_eq!(parser.functions.len(), 2);
    assert_eq!(parser.trend.baseline, vec![101.0, 201.0]);
    assert_eq!(parser.trend.treatment, vec![151.0, 221.0]);
    assert_eq!(parser.sorted_overheads, vec![221.0 / 201.0, 151.0 / 101.0]);
}

#[test]
fn test_reshape_rejects_reordered_trial() {
    let tree = DatasetTree::new();
    let log = tree.write_raw(
        "raw.csv",
        "Parser::Parse,1\njs::RunScript,2\nParser::Parse,3\nParser::Parse,4\nParser::Parse,5\nParser::Parse,6\n",
    );

    let err = reshaper()
        .reshape_file(&log, &tree.path().join("out.csv"))
        .unwrap_err();
    match err {
        AnalysisError::IdentifierMismatch {
            row,
            expected,
            found,
            ..
        } => {
            assert_eq!(row, 5);
            assert_eq!(expected, "js::RunScript");
            assert_eq!(found, "Parser::Parse");
        }
        other => panic!("expected IdentifierMismatch, got {other:?}"),
    }
    assert!(!tree.path().join("out.csv").exists());
}

#[test]
fn test_reshape_rejects_partial_trial() {
    let tree = DatasetTree::new();
    let partial: String = trial_log([1, 2, 3], 2)
        .lines()
        .take(5)
        .map(|line| format!("{line}\n"))
        .collect();
    let log = tree.write_raw("raw.csv", &partial);

    let err = reshaper()
        .reshape_file(&log, &tree.path().join("out.csv"))
        .unwrap_err();
    assert!(matches!(err, AnalysisError::TruncatedTrial { rows: 5, .. }));
}

#[test]
fn test_paired_files_with_different_functions() {
    let tree = DatasetTree::new();
    let without = tree.write_raw("without.csv", "f,1,1,1\ng,2,2,2\n");
    let with = tree.write_raw("with.csv", "f,1,1,1\nh,2,2,2\n");

    let err = FunctionCollection::from_reshaped_files(&without, &with).unwrap_err();
    assert!(matches!(err, AnalysisError::IdentifierMismatch { row: 2, .. }));
    assert!(err.to_string().contains("'h'"));
}

#[test]
fn test_function_cache_round_trip() {
    let tree = DatasetTree::new();
    let without = tree.write_raw("without.csv", "f,10,12,11,10\nParser::Parse,30,31,29,90\n");
    let with = tree.write_raw("with.csv", "f,15,14,15,16\nParser::Parse,33,33,34,32\n");
    let collection = FunctionCollection::from_reshaped_files(&without, &with).unwrap();

    let snapshot = tree.path().join("functions.cache.json");
    cache::save_functions(&snapshot, &collection, &[&without, &with]).unwrap();
    let restored = cache::load_functions(&snapshot, &[&without, &with]).unwrap();

    assert_eq!(restored, collection);
    assert_eq!(restored.records()[1].without.outliers_removed(), 1);
    assert!(matches!(
        cache::load_report(&snapshot, &[&without, &with]),
        Err(AnalysisError::CacheFormat { .. })
    ));
}

#[test]
fn test_function_cache_is_tied_to_its_inputs() {
    let tree = DatasetTree::new();
    let without = tree.write_raw("a/without.csv", "f,10,10,10\n");
    let with = tree.write_raw("a/with.csv", "f,20,20,20\n");
    let other_without = tree.write_raw("b/without.csv", "g,10,10,10\n");
    let other_with = tree.write_raw("b/with.csv", "g,50,50,50\n");

    let snapshot = tree.path().join("functions.cache.json");
    let collection = FunctionCollection::from_reshaped_files(&without, &with).unwrap();
    cache::save_functions(&snapshot, &collection, &[&without, &with]).unwrap();

    let err = cache::load_functions(&snapshot, &[&other_without, &other_with]).unwrap_err();
    assert!(matches!(err, AnalysisError::CacheMismatch { .. }));
}
