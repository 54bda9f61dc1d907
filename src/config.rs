//! Configuration for SparseKV
//!
//! Build-time constants for the stores and table format, plus the
//! configuration of the benchmark driver.

use std::path::PathBuf;

use crate::error::{Result, SparseError};

// =============================================================================
// Build-time Constants
// =============================================================================

/// Sparse index checkpoint spacing in bytes.
///
/// Not stored in the table file: readers never need it to parse.
pub const BLOCK_SIZE: u32 = 1 << 12;

/// Upper bound on the number of levels a skip list node can occupy
pub const MAX_LEVEL: usize = 32;

/// Probability that a skip list node is promoted one more level
pub const LEVEL_PROBABILITY: f64 = 0.5;

/// Trailing footer: u32 offset of the index section
pub const FOOTER_SIZE: u64 = 4;

// =============================================================================
// Benchmark Configuration
// =============================================================================

/// Configuration for a benchmark run
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Word list, one word per line
    pub words_path: PathBuf,

    /// Maximum number of words loaded
    pub word_limit: usize,

    /// Every `delete_stride`-th word is deleted after the put phase
    pub delete_stride: usize,

    /// Range scan lower bound (empty = first key)
    pub scan_start: Vec<u8>,

    /// Range scan upper bound (empty = no upper bound)
    pub scan_end: Vec<u8>,

    /// When set, every store is also flushed to `{table_dir}/{name}.sst`
    /// and scanned back from disk
    pub table_dir: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            words_path: PathBuf::from("/usr/share/dict/words"),
            word_limit: 10_000,
            delete_stride: 8,
            scan_start: Vec::new(),
            scan_end: Vec::new(),
            table_dir: None,
        }
    }
}

impl BenchConfig {
    /// Create a new config builder
    pub fn builder() -> BenchConfigBuilder {
        BenchConfigBuilder::default()
    }

    /// Reject settings the driver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.delete_stride == 0 {
            return Err(SparseError::Config(
                "delete stride must be at least 1".to_string(),
            ));
        }
        if self.word_limit == 0 {
            return Err(SparseError::Config(
                "word limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for BenchConfig
#[derive(Default)]
pub struct BenchConfigBuilder {
    config: BenchConfig,
}

impl BenchConfigBuilder {
    /// Set the word list path
    pub fn words_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.words_path = path.into();
        self
    }

    /// Set the maximum number of words loaded
    pub fn word_limit(mut self, limit: usize) -> Self {
        self.config.word_limit = limit;
        self
    }

    /// Set the delete stride
    pub fn delete_stride(mut self, stride: usize) -> Self {
        self.config.delete_stride = stride;
        self
    }

    /// Set the range scan bounds
    pub fn scan_range(mut self, start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        self.config.scan_start = start.into();
        self.config.scan_end = end.into();
        self
    }

    /// Flush every store to a table in this directory
    pub fn table_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.table_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<BenchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
