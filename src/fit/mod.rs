//! Curve fitting.
//!
//! Responsibilities:
//!
//! - nonlinear least squares (`solver`)
//! - fit a form to a table segment and evaluate fitted forms on other data
//!   (`fitter`)

pub mod fitter;
pub mod solver;

pub use fitter::*;
pub use solver::*;
