//! Store error types.
//!
//! Sampling rejections (probability, capacity, lock contention) are not
//! errors and never appear here; they are reported as admission outcomes.

use thiserror::Error;

/// The main error type for the sampling store.
///
/// # Example
///
/// ```rust
/// use sample_common::error::{SampleError, SampleResult};
///
/// fn update_row() -> SampleResult<()> {
///     Err(SampleError::unsupported("update_row"))
/// }
///
/// assert!(update_row().unwrap_err().is_unsupported());
/// ```
#[derive(Debug, Error)]
pub enum SampleError {
    /// Invalid configuration or table options (zero width, rate, or limit).
    #[error("configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// An encoded row could not be walked to the expected number of fields.
    ///
    /// Rows are only decoded with the column count they were encoded with,
    /// so this indicates a corrupted buffer.
    #[error("row format error at offset {offset}: {reason}")]
    Format {
        /// Byte offset where decoding stopped.
        offset: usize,
        /// What was wrong with the buffer.
        reason: String,
    },

    /// The store permanently does not support this operation.
    #[error("operation not supported: {operation}")]
    Unsupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// A write supplied a different number of fields than the table declares.
    #[error("table has {expected} columns, row has {actual}")]
    SchemaMismatch {
        /// Declared column count.
        expected: usize,
        /// Number of fields supplied.
        actual: usize,
    },

    /// A rename target is already registered.
    #[error("table already exists: {name}")]
    TableExists {
        /// The conflicting table name.
        name: String,
    },

    /// I/O error from a marker file or configuration file.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl SampleError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a row format error.
    pub fn format(offset: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates an unsupported operation error.
    #[must_use]
    pub const fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Returns true if this error means a row buffer is corrupted.
    ///
    /// Callers are expected to abort on fatal errors.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns true if this is the fixed "unsupported" signal.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
