//! # sample-common
//!
//! Common types, errors, and configuration for the sampling table store.
//!
//! This crate provides the foundational pieces shared by the store:
//!
//! - **Types**: the [`Value`] a row field carries (null, integer, or bytes)
//! - **Errors**: unified error handling with [`SampleError`]
//! - **Config**: sampling rate, capacity, and registry settings
//! - **Constants**: codec limits and configuration defaults
//!
//! ## Example
//!
//! ```rust
//! use sample_common::{SampleConfig, SampleResult, Value};
//!
//! fn example() -> SampleResult<()> {
//!     let config = SampleConfig::default().with_rate(10).with_limit(500);
//!     config.validate()?;
//!     let row = vec![Value::from(1_i64), Value::from("alice"), Value::Null];
//!     assert_eq!(row.len(), 3);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::SampleConfig;
pub use constants::*;
pub use error::{SampleError, SampleResult};
pub use types::Value;
