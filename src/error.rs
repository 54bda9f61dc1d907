//! Error types for SparseKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SparseError
pub type Result<T> = std::result::Result<T, SparseError>;

/// Unified error type for SparseKV operations
#[derive(Debug, Error)]
pub enum SparseError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error while {context}: {source}")]
    IoContext {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Table Errors
    // -------------------------------------------------------------------------
    #[error("Corrupted table: {0}")]
    CorruptedTable(String),

    #[error("Keys must be added in ascending order: {0}")]
    UnorderedKey(String),

    #[error("Too large for table format: {0}")]
    TooLarge(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SparseError {
    /// Wrap an I/O error with a description of what was being done
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SparseError::IoContext {
            context: context.into(),
            source,
        }
    }

    /// True for errors that indicate a damaged table file
    pub fn is_corruption(&self) -> bool {
        matches!(self, SparseError::CorruptedTable(_))
    }
}
