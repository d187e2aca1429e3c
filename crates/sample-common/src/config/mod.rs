//! Configuration for the sampling store.
//!
//! The settings mirror what a host server exposes as tunables: the default
//! sampling rate and row limit applied to newly created tables, plus the
//! registry's quiescence and marker-file behavior.

mod sample;

pub use sample::SampleConfig;
