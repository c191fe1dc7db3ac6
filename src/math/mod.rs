//! Numerical utilities: grids, interpolation and quadrature.

pub mod interp;
pub mod quad;

pub use interp::*;
pub use quad::*;
