//! Stochastic mock generation of observed band powers.

pub mod generator;

pub use generator::*;
