//! `czm-curves` library crate.
//!
//! Post-processing for cohesive-zone-model fracture tests (DCB, ADCB, ENF,
//! SLB, ASLB): analytical beam-theory curves, regime splitting at peak load,
//! curve fitting, and pooled comparison records.
//!
//! The binary (`czm`) is a thin wrapper around this library so that core
//! logic is testable without spawning processes.

pub mod analytical;
pub mod app;
pub mod cli;
pub mod compare;
pub mod data;
pub mod deck;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod job;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
