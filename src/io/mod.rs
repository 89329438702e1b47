//! Input/output helpers.
//!
//! - delimited tables and history output (`ingest`)
//! - split curve CSV read/write (`curve`)
//! - JSON documents and JSON-lines logs (`jsonl`)

pub mod curve;
pub mod ingest;
pub mod jsonl;

pub use curve::*;
pub use ingest::*;
pub use jsonl::*;
