//! Cosmology models: growth rate, σ normalizations, distances and linear power.

pub mod model;

pub use model::*;
