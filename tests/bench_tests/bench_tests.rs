//! Benchmark Driver Tests
//!
//! Tests verify:
//! - Word list filtering and limits
//! - Store state after a benchmark run
//! - Report formatting
//! - Config validation and the optional table phase

use std::fs;

use sparsekv::bench::{self, BenchReport};
use sparsekv::{BenchConfig, SparseError, StoreKind, Table};
use tempfile::TempDir;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

// =============================================================================
// Word Loading Tests
// =============================================================================

#[test]
fn test_load_words_keeps_lowercase_only() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("words");
    fs::write(&path, "apple\nBanana\ncherry\nDNA\ndate\n").unwrap();

    let loaded = bench::load_words(&path, 100).unwrap();
    assert_eq!(loaded, words(&["apple", "cherry", "date"]));
}

#[test]
fn test_load_words_respects_limit() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("words");
    fs::write(&path, "a\nb\nc\nd\n").unwrap();

    assert_eq!(bench::load_words(&path, 2).unwrap(), words(&["a", "b"]));
}

#[test]
fn test_load_words_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = bench::load_words(&temp.path().join("nope"), 10);
    assert!(matches!(result, Err(SparseError::IoContext { .. })));
}

// =============================================================================
// Run Tests
// =============================================================================

#[test]
fn test_run_benchmark_applies_every_phase() {
    let list = words(&["ant", "bee", "cat", "dog", "eel", "fox", "gnu", "hen", "ibis", "jay"]);
    let config = BenchConfig::builder().delete_stride(3).build().unwrap();

    for kind in StoreKind::ALL {
        let mut store = kind.build();
        let report = bench::run_benchmark(&list, store.as_mut(), kind.name(), &config).unwrap();

        // Words 0, 3, 6, 9 deleted
        assert_eq!(store.len(), 6, "{}", kind.name());
        assert_eq!(store.get(b"ant"), None);
        assert_eq!(store.get(b"bee"), Some(&b"bee"[..]));
        assert_eq!(report.scanned, 6);
        assert_eq!(report.name, kind.name());
        assert!(report.table.is_none());
    }
}

#[test]
fn test_run_benchmark_bounded_scan() {
    let list = words(&["a", "b", "c", "d"]);
    let config = BenchConfig::builder()
        .delete_stride(100)
        .scan_range("b", "d")
        .build()
        .unwrap();

    let mut store = StoreKind::SkipList.build();
    let report = bench::run_benchmark(&list, store.as_mut(), "skip list", &config).unwrap();
    // "a" was deleted (stride hits index 0); scan covers b, c
    assert_eq!(report.scanned, 2);
}

#[test]
fn test_run_all_with_table_phase() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("tables");
    let list: Vec<String> = (0..2_000).map(|i| format!("word{:05}", i)).collect();
    let config = BenchConfig::builder().table_dir(&dir).build().unwrap();

    let reports = bench::run_all(&list, &config).unwrap();
    assert_eq!(reports.len(), 3);

    for report in &reports {
        let table_report = report.table.as_ref().unwrap();
        assert!(table_report.bytes > 0);
        assert!(table_report.index_entries > 1);
    }

    let table = Table::open_path(&dir.join("skip_list.sst")).unwrap();
    assert_eq!(table.get(b"word00001").unwrap(), Some(b"word00001".to_vec()));
    assert_eq!(table.get(b"word00000").unwrap(), None);
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = BenchConfig::default();
    assert_eq!(config.word_limit, 10_000);
    assert_eq!(config.delete_stride, 8);
    assert!(config.scan_start.is_empty());
    assert!(config.scan_end.is_empty());
    assert!(config.table_dir.is_none());
}

#[test]
fn test_config_rejects_zero_stride() {
    let result = BenchConfig::builder().delete_stride(0).build();
    assert!(matches!(result, Err(SparseError::Config(_))));
}

#[test]
fn test_config_rejects_zero_limit() {
    let result = BenchConfig::builder().word_limit(0).build();
    assert!(matches!(result, Err(SparseError::Config(_))));
}

// =============================================================================
// Report Tests
// =============================================================================

#[test]
fn test_report_columns() {
    let header = bench::header();
    assert_eq!(header.len(), 100);
    assert!(header.starts_with("name                puts"));

    let report = BenchReport {
        name: "simple".to_string(),
        puts: std::time::Duration::from_millis(1),
        deletes: std::time::Duration::from_millis(2),
        gets: std::time::Duration::from_millis(3),
        range_scan: std::time::Duration::from_millis(4),
        scanned: 0,
        table: None,
    };
    let row = report.to_string();
    assert_eq!(row.len(), 100);
    assert!(row.starts_with("simple              1ms"));
    assert!(row.contains("4ms"));
}
