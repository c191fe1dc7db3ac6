//! Galaxy power spectrum models.
//!
//! Models are implemented as small, pure functions of their inputs so that the
//! survey and mock code can stay generic over which cosmology plays which role.

pub mod kaiser;

pub use kaiser::*;
