//! System-wide constants for the sampling store.
//!
//! Codec limits live here so that the encoder, the decoder, and the tests
//! agree on where one field representation ends and the next begins.

// =============================================================================
// Sampling Defaults
// =============================================================================

/// Default sampling rate: one write in `rate` is admitted.
pub const DEFAULT_SAMPLE_RATE: u32 = 1000;

/// Default maximum number of rows a table holds between scans.
pub const DEFAULT_ROW_LIMIT: u32 = 10_000;

/// Default interval between quiescence checks during drop and rename.
pub const DEFAULT_QUIESCE_POLL_MS: u64 = 1;

/// First value handed out by the per-handle seed sequence.
pub const INITIAL_SEED: u64 = 1;

// =============================================================================
// Codec Limits
// =============================================================================

/// Size of a field tag in bytes.
pub const TAG_SIZE: usize = 1;

/// Longest byte string stored in the short-string form.
///
/// Anything longer uses the long-string form with two `u32` length prefixes.
pub const TINY_STRING_MAX: usize = u8::MAX as usize;

/// Size of the short-string length prefix.
pub const TINY_LENGTH_SIZE: usize = 1;

/// Size of one long-string length prefix (stored and real length each).
pub const LONG_LENGTH_SIZE: usize = 4;

/// Longest byte string the long-string form can describe.
pub const MAX_FIELD_LENGTH: usize = u32::MAX as usize;

// =============================================================================
// Marker Files
// =============================================================================

/// Extension of the marker file kept for each table when a marker
/// directory is configured.
pub const MARKER_EXTENSION: &str = "sample";
