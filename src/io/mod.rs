//! Input/output helpers.
//!
//! - survey forecast JSON read/write and mock CSV export (`export`)

pub mod export;

pub use export::*;
