//! Error types for the batch crate.
//!
//! Errors come in two tiers:
//! - per-item errors ([`ItemError`]) are caught at the pipeline boundary and
//!   only shrink the result set
//! - batch errors ([`BatchError`]) are user-visible notices for a whole run

use std::fmt;
use thiserror::Error;

/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Failure of a single transform invocation.
#[derive(Debug, Error)]
pub struct ConversionError {
    /// Human-readable message
    pub message: String,
    /// Underlying cause
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ConversionError {
    /// Create a new conversion error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

/// Per-item error, recorded for the user-visible summary.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Media type not in the accepted set; the item was skipped
    #[error("Unsupported file type: {media_type}")]
    UnsupportedType {
        /// Declared media type of the skipped file
        media_type: String,
    },

    /// Transform failed for this item
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

impl ItemError {
    /// Whether the item was skipped before its transform ran
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ItemError::UnsupportedType { .. })
    }
}

/// A per-item failure together with the item it belongs to.
#[derive(Debug)]
pub struct ItemFailure {
    /// Position of the file in the batch
    pub index: usize,
    /// Original file name
    pub name: String,
    /// What went wrong
    pub error: ItemError,
}

/// Errors that end a batch operation.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Run requested with no input files
    #[error("No files selected")]
    EmptyBatch,

    /// Every item was skipped or failed
    #[error("No valid images were processed ({} of {total} failed)", .failures.len())]
    NoValidResults {
        /// Number of items in the batch
        total: usize,
        /// Why each item failed
        failures: Vec<ItemFailure>,
    },

    /// Download requested without processed results
    #[error("No processed files to download")]
    NothingToDownload,

    /// A run is already active for this session
    #[error("A batch is already being processed")]
    AlreadyProcessing,

    /// Operation not valid in the current session phase
    #[error("Cannot {operation} while {phase}")]
    InvalidState {
        /// Requested operation
        operation: &'static str,
        /// Current phase name
        phase: &'static str,
    },

    /// File index does not exist in the selection
    #[error("No file at index {index} (selection has {len})")]
    FileIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Selection length
        len: usize,
    },

    /// Run stopped by its cancellation token
    #[error("Batch cancelled after {completed} of {total} files")]
    Cancelled {
        /// Items finished before cancellation
        completed: usize,
        /// Number of items in the batch
        total: usize,
    },

    /// Archive creation failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Packaging failed for a reason other than the archive
    #[error("Packaging error: {0}")]
    Packaging(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for BatchError {
    fn from(err: zip::result::ZipError) -> Self {
        BatchError::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display_includes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "truncated");
        let err = ConversionError::new("Error loading image").with_source(io);
        assert_eq!(err.to_string(), "Error loading image: truncated");
    }

    #[test]
    fn test_no_valid_results_message() {
        let err = BatchError::NoValidResults {
            total: 2,
            failures: vec![ItemFailure {
                index: 0,
                name: "notes.txt".into(),
                error: ItemError::UnsupportedType {
                    media_type: "text/plain".into(),
                },
            }],
        };
        assert_eq!(err.to_string(), "No valid images were processed (1 of 2 failed)");
    }

    #[test]
    fn test_item_error_kind() {
        let skipped = ItemError::UnsupportedType {
            media_type: "text/plain".into(),
        };
        let failed = ItemError::from(ConversionError::new("bad"));
        assert!(skipped.is_unsupported());
        assert!(!failed.is_unsupported());
    }
}
