//! Aggregation of regime statistics into per-test comparison records.

pub mod pool;
pub mod record;

pub use pool::*;
pub use record::*;
