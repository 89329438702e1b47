//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - test / fit configuration enums (`TestType`, `FitForm`, `Metric`)
//! - specimen descriptions (`SpecimenGeometry`, `TestModel`)
//! - curves and fit outputs (`LoadDisplacementCurve`, `FitResult`, `Quality`)

pub mod specimen;
pub mod types;

pub use specimen::*;
pub use types::*;
