//! Terminal plots.

pub mod ascii;

pub use ascii::*;
