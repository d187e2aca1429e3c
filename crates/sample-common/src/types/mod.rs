//! Type definitions for the sampling store.
//!
//! A row handed to the store is an ordered list of [`Value`]s, one per
//! declared column.

mod value;

pub use value::Value;
