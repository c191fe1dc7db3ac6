//! Crate error type.
//!
//! Every fallible operation in the pipeline returns [`AppError`]. The binary maps
//! each variant to a process exit code via [`AppError::exit_code`]:
//!
//! - `2`: invalid input or I/O failure
//! - `3`: a survey bin with no signal
//! - `4`: numerical / solver failure or inconsistent cosmologies

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// The Boltzmann solver rejected the parameters or did not converge.
    #[error("cosmology solver failed: {0}")]
    CosmologySolver(String),

    /// Two cosmologies combined in one operation describe different epochs.
    #[error("cosmologies disagree on redshift: coordinate z={coord_z}, template z={template_z}")]
    CosmologyMismatch { coord_z: f64, template_z: f64 },

    /// A survey bin has zero predicted signal, so `sigP/P` is undefined.
    #[error("survey bin {index} (qt={qt:.4}, qp={qp:.4}) has zero predicted signal")]
    EmptyBin { index: usize, qt: f64, qp: f64 },

    /// Elementwise operation called with slices of different lengths.
    #[error("length mismatch: expected {left} values, got {right}")]
    ShapeMismatch { left: usize, right: usize },

    /// A computed quantity came out NaN or infinite.
    #[error("non-finite {what} in bin {index}")]
    NonFinite { what: &'static str, index: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Io(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn solver(message: impl Into<String>) -> Self {
        Self::CosmologySolver(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidInput(_) | AppError::ShapeMismatch { .. } | AppError::Io(_) => 2,
            AppError::EmptyBin { .. } => 3,
            AppError::CosmologySolver(_)
            | AppError::CosmologyMismatch { .. }
            | AppError::NonFinite { .. } => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(AppError::invalid("bad").exit_code(), 2);
        assert_eq!(AppError::ShapeMismatch { left: 1, right: 2 }.exit_code(), 2);
        assert_eq!(AppError::EmptyBin { index: 0, qt: 1.0, qp: 1.0 }.exit_code(), 3);
        assert_eq!(AppError::solver("diverged").exit_code(), 4);
        assert_eq!(
            AppError::CosmologyMismatch { coord_z: 0.5, template_z: 1.0 }.exit_code(),
            4
        );
    }

    #[test]
    fn mismatch_message_names_both_redshifts() {
        let msg = AppError::CosmologyMismatch { coord_z: 0.5, template_z: 1.0 }.to_string();
        assert!(msg.contains("0.5"), "{msg}");
        assert!(msg.contains("template z=1"), "{msg}");
    }
}
