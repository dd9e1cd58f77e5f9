//! Error types for kfcount.
//!
//! Every fallible operation in the library returns a [`KfcError`]. Nothing in
//! the library exits the process; the binary decides how to report a failure.
//!
//! Invalid k-mers are not errors. They are counted in-band and reported as a
//! total alongside the results.

use std::path::PathBuf;
use thiserror::Error;

use crate::tally::Strategy;

/// Errors that can occur in kfcount operations.
#[derive(Debug, Error)]
pub enum KfcError {
    /// A k-mer size, strand mode or planner option is out of range.
    #[error("{details}")]
    InvalidParameter { details: String },

    /// No tally strategy fits the requested memory budget.
    #[error("{details}")]
    CapacityExceeded { details: String },

    /// The backing store for a tally strategy could not be allocated.
    #[error("cannot allocate {bytes} bytes for the {strategy} tally: {source}")]
    OutOfMemory {
        #[source]
        source: std::collections::TryReserveError,
        strategy: Strategy,
        bytes: u64,
    },

    /// The list tally received more k-mers than it was sized for.
    #[error("list tally is full: capacity of {capacity} k-mers exhausted; raise the expected input size")]
    CapacityExhausted { capacity: u64 },

    /// Failed to open or read a sequence source.
    #[error("failed to read sequence file '{path}': {source}")]
    SequenceRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse a sequence record.
    #[error("failed to parse sequence record in '{path}': {details}")]
    SequenceParse { details: String, path: PathBuf },

    /// Failed to write output.
    #[error("failed to write output: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON output.
    #[error("failed to serialize JSON: {source}")]
    JsonError {
        #[source]
        source: serde_json::Error,
    },

    /// The worker pool could not be started.
    #[error("failed to start worker threads: {source}")]
    ThreadPool {
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

impl KfcError {
    pub(crate) fn invalid_parameter(details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            details: details.into(),
        }
    }

    pub(crate) fn capacity_exceeded(details: impl Into<String>) -> Self {
        Self::CapacityExceeded {
            details: details.into(),
        }
    }

    /// Returns `true` for errors caused by configuration rather than input.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::CapacityExceeded { .. }
        )
    }
}

impl From<std::io::Error> for KfcError {
    fn from(source: std::io::Error) -> Self {
        Self::WriteError { source }
    }
}

impl From<serde_json::Error> for KfcError {
    fn from(source: serde_json::Error) -> Self {
        Self::JsonError { source }
    }
}

impl From<rayon::ThreadPoolBuildError> for KfcError {
    fn from(source: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool { source }
    }
}
