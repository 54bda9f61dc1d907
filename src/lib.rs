//! # SparseKV
//!
//! A storage-engine testbed:
//! - One ordered key-value contract, three in-memory implementations
//!   (sorted array, sorted linked list, skip list)
//! - A persistent table format with a sparse index, written from any store
//!   and queried without loading the data section
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐  ┌─────────────────┐  ┌───────────────┐
//! │  ArrayStore  │  │ LinkedListStore │  │ SkipListStore │
//! └──────┬───────┘  └────────┬────────┘  └───────┬───────┘
//!        └────────── OrderedStore ───────────────┘
//!                          │ range_scan("", "")
//!                          ▼
//!                   ┌─────────────┐
//!                   │ TableWriter │  (flush)
//!                   └──────┬──────┘
//!                          │ data | sparse index | footer
//!                          ▼
//!                   ┌─────────────┐
//!                   │    Table    │  (open / get / range_scan)
//!                   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod table;
pub mod bench;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SparseError};
pub use config::BenchConfig;
pub use store::{ArrayStore, LinkedListStore, OrderedStore, RangeIterator, SkipListStore, StoreKind};
pub use table::{flush, Table, TableWriter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SparseKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
