//! Tabular data and regime splitting.

pub mod split;
pub mod table;

pub use split::*;
pub use table::*;
