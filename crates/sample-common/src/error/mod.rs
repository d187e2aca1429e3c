//! Error handling for the sampling store.
//!
//! This module provides a unified error type and result alias used
//! across the store's components.

mod store;

pub use store::SampleError;

/// Result type alias for sampling store operations.
pub type SampleResult<T> = std::result::Result<T, SampleError>;
