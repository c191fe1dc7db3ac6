//! Survey geometry and band-power error forecasts.

pub mod error_model;

pub use error_model::*;
