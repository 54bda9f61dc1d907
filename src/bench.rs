//! Benchmark Driver
//!
//! Loads a word list and times each store through the public contract:
//! put every word, delete every `stride`-th word, get every word, then one
//! range scan. Optionally snapshots each store to a table and scans it back.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::BenchConfig;
use crate::error::{Result, SparseError};
use crate::store::{OrderedStore, StoreKind};
use crate::table::{flush_to_path, Table};

/// Width of each report column
const COLUMN_WIDTH: usize = 20;

/// Timings for one store
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub name: String,
    pub puts: Duration,
    pub deletes: Duration,
    pub gets: Duration,
    pub range_scan: Duration,
    /// Records visited by the range scan
    pub scanned: usize,
    /// Flush + reopen + full scan of the table, when enabled
    pub table: Option<TableReport>,
}

/// Timings for the on-disk round trip of one store
#[derive(Debug, Clone)]
pub struct TableReport {
    pub flush: Duration,
    pub open: Duration,
    pub scan: Duration,
    pub bytes: u64,
    pub index_entries: usize,
}

/// Column titles of the report
pub fn header() -> String {
    format!(
        "{:<w$}{:<w$}{:<w$}{:<w$}{:<w$}",
        "name",
        "puts",
        "deletes",
        "gets",
        "rangescan",
        w = COLUMN_WIDTH
    )
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<w$}{:<w$}{:<w$}{:<w$}{:<w$}",
            self.name,
            format!("{:?}", self.puts),
            format!("{:?}", self.deletes),
            format!("{:?}", self.gets),
            format!("{:?}", self.range_scan),
            w = COLUMN_WIDTH
        )
    }
}

/// Read up to `limit` all-lowercase words, one per line
pub fn load_words(path: &Path, limit: usize) -> Result<Vec<String>> {
    let file = File::open(path)
        .map_err(|e| SparseError::io(format!("opening word list {}", path.display()), e))?;

    let mut words = Vec::new();
    for line in BufReader::new(file).lines() {
        if words.len() >= limit {
            break;
        }
        let word = line.map_err(|e| SparseError::io("reading word list", e))?;
        if word.to_lowercase() == word {
            words.push(word);
        }
    }

    debug!(count = words.len(), path = %path.display(), "loaded words");
    Ok(words)
}

/// Time one store; the value of every word is the word itself
pub fn run_benchmark(
    words: &[String],
    store: &mut dyn OrderedStore,
    name: &str,
    config: &BenchConfig,
) -> Result<BenchReport> {
    config.validate()?;

    let start = Instant::now();
    for word in words {
        store.put(word.as_bytes(), word.as_bytes());
    }
    let puts = start.elapsed();

    let start = Instant::now();
    for word in words.iter().step_by(config.delete_stride) {
        store.delete(word.as_bytes());
    }
    let deletes = start.elapsed();

    let start = Instant::now();
    for word in words {
        std::hint::black_box(store.get(word.as_bytes()));
    }
    let gets = start.elapsed();

    let start = Instant::now();
    let mut scanned = 0;
    let mut iter = store.range_scan(&config.scan_start, &config.scan_end);
    if iter.is_valid() {
        loop {
            std::hint::black_box((iter.key(), iter.value()));
            scanned += 1;
            if !iter.next() {
                break;
            }
        }
    }
    drop(iter);
    let range_scan = start.elapsed();

    let table = match &config.table_dir {
        Some(dir) => Some(run_table_phase(&*store, name, dir)?),
        None => None,
    };

    info!(store = name, records = store.len(), scanned, "benchmark finished");

    Ok(BenchReport {
        name: name.to_string(),
        puts,
        deletes,
        gets,
        range_scan,
        scanned,
        table,
    })
}

/// Run every store kind over the same words
pub fn run_all(words: &[String], config: &BenchConfig) -> Result<Vec<BenchReport>> {
    StoreKind::ALL
        .iter()
        .map(|kind| {
            let mut store = kind.build();
            run_benchmark(words, store.as_mut(), kind.name(), config)
        })
        .collect()
}

fn run_table_phase(store: &dyn OrderedStore, name: &str, dir: &Path) -> Result<TableReport> {
    fs::create_dir_all(dir)
        .map_err(|e| SparseError::io(format!("creating {}", dir.display()), e))?;
    let path = dir.join(format!("{}.sst", name.replace(' ', "_")));

    let start = Instant::now();
    let summary = flush_to_path(store, &path)?;
    let flush = start.elapsed();

    let start = Instant::now();
    let table = Table::open_path(&path)?;
    let open = start.elapsed();

    let start = Instant::now();
    let mut iter = table.iter()?;
    let mut records = 0;
    while iter.is_valid() {
        records += 1;
        iter.next()?;
    }
    let scan = start.elapsed();

    if records != store.len() {
        return Err(SparseError::CorruptedTable(format!(
            "{} holds {} records, store has {}",
            path.display(),
            records,
            store.len()
        )));
    }

    Ok(TableReport {
        flush,
        open,
        scan,
        bytes: summary.total_bytes,
        index_entries: summary.index.len(),
    })
}
