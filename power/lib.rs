#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

//! Analytic power for detecting an additive genetic association at a
//! genome-wide significance threshold, plus the sweeps and reports built on it.

pub mod calculator;
pub mod config;
pub mod report;
pub mod sweep;

pub use calculator::{DEFAULT_SIGMA, PowerError, PowerInputs, power};
