//! # sample-store
//!
//! An in-memory, concurrently written sampling store.
//!
//! Writers offer a continuous stream of rows; each open handle admits a
//! pseudo-random `1 / rate` share of them, encodes the admitted rows into a
//! compact packed buffer, and stores them in a capacity-bounded table. A
//! reader later drains the captured rows exactly once, after which the
//! table starts collecting a fresh sample.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TableRegistry                          │
//! │     (name → Table, open/close counting, drop & rename)       │
//! └─────────────────────────────────────────────────────────────┘
//!            │ open                                 │ scan
//!            ▼                                      ▼
//! ┌──────────────────────┐              ┌──────────────────────┐
//! │     TableHandle      │              │     ScanSession      │
//! │  Sampler (draw)      │              │  swap, then drain    │
//! │  RowCodec (encode)   │              │  RowCodec (decode)   │
//! └──────────────────────┘              └──────────────────────┘
//!            │ try_insert                           ▲ swap_rows
//!            ▼                                      │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Table: Mutex<RowCollection>                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sample is best-effort: a write never blocks on the table lock, and
//! rows that lose the lock race or find the table full are dropped
//! silently. [`StoreStats`] counts every outcome.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod handle;
pub mod registry;
pub mod rows;
pub mod sampler;
pub mod scan;
pub mod stats;
pub mod table;

pub use codec::{EncodedRow, FieldTag, RowCodec};
pub use handle::TableHandle;
pub use registry::TableRegistry;
pub use rows::RowCollection;
pub use sampler::{Admission, Sampler, SeedSequence};
pub use scan::ScanSession;
pub use stats::{StatsSnapshot, StoreStats};
pub use table::{Table, TableOptions};

pub use sample_common::{SampleConfig, SampleError, SampleResult, Value};
