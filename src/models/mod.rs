//! Functional forms fitted to curve segments.
//!
//! Forms are implemented as small, pure functions so that fitting/evaluation
//! code can stay generic.

pub mod model;

pub use model::*;
