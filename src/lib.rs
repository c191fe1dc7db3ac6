//! `sigmax` library crate.
//!
//! Forecasts the anisotropic galaxy power spectrum observed by a redshift survey:
//! a cosmology model supplies growth rate, σ normalizations, distances and the
//! linear power spectrum; the Kaiser model turns those into observed band powers;
//! the survey error model assigns each band a fractional error; the mock
//! generator draws Gaussian realizations.
//!
//! The binary (`sigmax`) is a thin wrapper around this library so that core
//! logic is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod cosmology;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod mock;
pub mod power;
pub mod report;
pub mod solver;
pub mod survey;
