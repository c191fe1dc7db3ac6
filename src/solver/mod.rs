//! Boltzmann solver interface.
//!
//! The linear matter power spectrum and the background distances come from an
//! external solver. The pipeline only depends on the [`BoltzmannSolver`] /
//! [`SolverResults`] traits; [`analytic::AnalyticSolver`] is the bundled backend.
//!
//! Conventions (matching the usual CAMB outputs):
//!
//! - wavenumbers in Mpc⁻¹, power in Mpc³ (no factors of `h`)
//! - `h_of_z(z) = H(z) / c` in Mpc⁻¹, so the Hubble distance is `1 / h_of_z(z)`
//! - `sigma_r(R, hubble_units)` takes `R` in h⁻¹Mpc when `hubble_units` is set

use serde::{Deserialize, Serialize};

use crate::domain::CosmoParams;
use crate::error::{AppError, Result};
use crate::math::UniformGrid;

pub mod analytic;

pub use analytic::AnalyticSolver;

/// Something that can solve a cosmology at a single redshift.
pub trait BoltzmannSolver {
    type Results: SolverResults;

    /// Run the solver for `params`, preparing the matter power at redshift `z`.
    ///
    /// Failures (invalid parameters, non-convergence) must surface as
    /// [`AppError::CosmologySolver`].
    fn solve(&self, params: &CosmoParams, z: f64) -> Result<Self::Results>;
}

/// Outputs of a solver run.
pub trait SolverResults {
    /// Linear matter power interpolator at the solved redshift.
    fn matter_power_interpolator(&self) -> Result<PowerTable>;

    /// Angular-diameter distance in Mpc.
    fn angular_diameter_distance(&self, z: f64) -> f64;

    /// `H(z)/c` in Mpc⁻¹.
    fn h_of_z(&self, z: f64) -> f64;

    /// RMS linear fluctuation in spheres of radius `r` at the solved redshift.
    fn sigma_r(&self, r: f64, hubble_units: bool) -> Result<f64>;
}

/// Tabulated linear power `P(k)` at one redshift.
///
/// Stored as `ln P` on a uniform `ln k` grid and interpolated linearly in log-log
/// space, which is exact for power laws and extends the end slopes beyond the
/// tabulated range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerTable {
    z: f64,
    ln_p: UniformGrid,
}

impl PowerTable {
    /// Tabulate `power(k)` at `n` log-spaced wavenumbers in `[k_min, k_max]`.
    pub fn tabulate<F>(z: f64, k_min: f64, k_max: f64, n: usize, power: F) -> Result<Self>
    where
        F: Fn(f64) -> f64,
    {
        let ks = crate::math::log_space(k_min, k_max, n)?;
        let mut ln_p = Vec::with_capacity(n);
        for &k in &ks {
            let p = power(k);
            if !(p.is_finite() && p > 0.0) {
                return Err(AppError::solver(format!(
                    "linear power is not positive and finite at k={k:.3e} (P={p})"
                )));
            }
            ln_p.push(p.ln());
        }

        let ln_k_min = k_min.ln();
        let d_ln_k = (k_max.ln() - ln_k_min) / (n as f64 - 1.0);
        Ok(Self {
            z,
            ln_p: UniformGrid::new(ln_k_min, d_ln_k, ln_p)?,
        })
    }

    /// Redshift the table was computed at.
    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn k_range(&self) -> (f64, f64) {
        (self.ln_p.x_min().exp(), self.ln_p.x_max().exp())
    }

    /// Linear power at wavenumber `k` (Mpc⁻¹). Requires `k > 0`.
    pub fn eval(&self, k: f64) -> f64 {
        self.ln_p.eval(k.ln()).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn power_table_is_exact_for_power_laws() {
        let table = PowerTable::tabulate(0.5, 1e-3, 1.0, 64, |k| 2.0e3 * k.powf(-1.5)).unwrap();
        for &k in &[1e-3, 3.7e-3, 0.05, 0.2, 1.0] {
            assert_relative_eq!(table.eval(k), 2.0e3 * k.powf(-1.5), max_relative = 1e-10);
        }
        // beyond the table the end slope continues
        assert_relative_eq!(table.eval(10.0), 2.0e3 * 10f64.powf(-1.5), max_relative = 1e-9);
        assert_eq!(table.z(), 0.5);
    }

    #[test]
    fn power_table_rejects_non_positive_power() {
        let err = PowerTable::tabulate(0.0, 1e-3, 1.0, 16, |k| k - 0.5).unwrap_err();
        assert!(matches!(err, AppError::CosmologySolver(_)));
    }

    #[test]
    fn power_table_survives_serde() {
        let table = PowerTable::tabulate(1.0, 1e-3, 1.0, 32, |k| 1.0 / k).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        let back: PowerTable = serde_json::from_str(&json).unwrap();
        assert_relative_eq!(back.eval(0.1), table.eval(0.1), max_relative = 1e-12);
    }

    #[test]
    fn power_table_k_range() {
        let table = PowerTable::tabulate(0.0, 1e-4, 10.0, 50, |k| k).unwrap();
        let (lo, hi) = table.k_range();
        assert_relative_eq!(lo, 1e-4, max_relative = 1e-12);
        assert_relative_eq!(hi, 10.0, max_relative = 1e-12);
    }
}
