//! The cosmology a power spectrum is evaluated against.
//!
//! A [`CosmologyModel`] is built once from a parameter set, a redshift and a
//! linear galaxy bias. All derived quantities are computed at construction and
//! never change afterwards; a different redshift or parameter set means a new
//! model.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::CosmoParams;
use crate::error::{AppError, Result};
use crate::solver::{AnalyticSolver, BoltzmannSolver, PowerTable, SolverResults};

/// σ₈ smoothing radius, in h⁻¹Mpc.
pub const SIGMA8_RADIUS_MPC_H: f64 = 8.0;

/// σ₁₂ smoothing radius, in Mpc.
pub const SIGMA12_RADIUS_MPC: f64 = 12.0;

/// Logarithmic growth rate `f(z) = Ωm(z)^(6/11)`.
///
/// Uses `Ωm(z) = Ωm (1+z)³ / (Ωm (1+z)³ − Ωm + 1)`, which assumes a flat
/// universe containing only matter and a cosmological constant. Models with
/// other energy components (evolving dark energy, curvature) need a different
/// formula; this one is not meant to be extended to them.
pub fn growth_rate(omega_m: f64, z: f64) -> f64 {
    let a3 = (1.0 + z).powi(3);
    let om_z = omega_m * a3 / (omega_m * a3 - omega_m + 1.0);
    om_z.powf(6.0 / 11.0)
}

#[derive(Debug, Clone)]
pub struct CosmologyModel {
    params: CosmoParams,
    z: f64,
    bias: f64,
    omega_m: f64,
    f: f64,
    sigma8: f64,
    sigma12: f64,
    d_a: f64,
    d_h: f64,
    power: PowerTable,
}

impl CosmologyModel {
    /// Build a model with the bundled analytic solver.
    pub fn build(params: &CosmoParams, z: f64, bias: f64) -> Result<Self> {
        Self::build_with(&AnalyticSolver::default(), params, z, bias)
    }

    /// Build a model, delegating power spectrum and distances to `solver`.
    pub fn build_with<S: BoltzmannSolver>(
        solver: &S,
        params: &CosmoParams,
        z: f64,
        bias: f64,
    ) -> Result<Self> {
        if !bias.is_finite() {
            return Err(AppError::invalid(format!("bias must be finite (got {bias})")));
        }

        let omega_m = params.omega_m();
        let f = growth_rate(omega_m, z);

        let results = solver.solve(params, z)?;
        let sigma8 = results.sigma_r(SIGMA8_RADIUS_MPC_H, true)?;
        let sigma12 = results.sigma_r(SIGMA12_RADIUS_MPC, false)?;
        let power = results.matter_power_interpolator()?;

        let d_a = results.angular_diameter_distance(z);
        let d_h = 1.0 / results.h_of_z(z);

        let derived = [
            ("f", f),
            ("sigma_8", sigma8),
            ("sigma_12", sigma12),
            ("D_A", d_a),
            ("D_H", d_h),
        ];
        for (name, value) in derived {
            if !value.is_finite() {
                return Err(AppError::solver(format!("solver produced non-finite {name} ({value})")));
            }
        }
        if power.z() != z {
            return Err(AppError::solver(format!(
                "power interpolator prepared for z={} instead of z={z}",
                power.z()
            )));
        }

        debug!(omega_m, f, sigma8, sigma12, d_a, d_h, "derived cosmology");
        info!(h0 = params.h0, z, bias, "cosmology model ready");

        Ok(Self {
            params: *params,
            z,
            bias,
            omega_m,
            f,
            sigma8,
            sigma12,
            d_a,
            d_h,
            power,
        })
    }

    pub fn params(&self) -> &CosmoParams {
        &self.params
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Matter fraction today.
    pub fn omega_m(&self) -> f64 {
        self.omega_m
    }

    /// Logarithmic growth rate at the model redshift.
    pub fn growth_rate(&self) -> f64 {
        self.f
    }

    pub fn sigma8(&self) -> f64 {
        self.sigma8
    }

    pub fn sigma12(&self) -> f64 {
        self.sigma12
    }

    pub fn fsigma8(&self) -> f64 {
        self.f * self.sigma8
    }

    pub fn bsigma8(&self) -> f64 {
        self.bias * self.sigma8
    }

    /// Angular-diameter distance in Mpc.
    pub fn angular_diameter_distance(&self) -> f64 {
        self.d_a
    }

    /// Hubble distance `c / H(z)` in Mpc.
    pub fn hubble_distance(&self) -> f64 {
        self.d_h
    }

    /// Comoving-to-observed volume factor `D_H D_A² (1+z)³`.
    pub fn volume_factor(&self) -> f64 {
        volume_factor(self.d_a, self.d_h, self.z)
    }

    /// Linear matter power (Mpc³) at wavenumber `k` (Mpc⁻¹, `k > 0`).
    pub fn linear_power(&self, k: f64) -> f64 {
        self.power.eval(k)
    }

    pub fn linear_power_many(&self, ks: &[f64]) -> Vec<f64> {
        ks.iter().map(|&k| self.power.eval(k)).collect()
    }

    pub fn summary(&self) -> CosmologySummary {
        CosmologySummary {
            params: self.params,
            z: self.z,
            bias: self.bias,
            omega_m: self.omega_m,
            f: self.f,
            sigma8: self.sigma8,
            sigma12: self.sigma12,
            d_a: self.d_a,
            d_h: self.d_h,
        }
    }
}

/// Volume of a unit observed cell in Mpc³, `D_H D_A² (1+z)³`.
pub fn volume_factor(d_a: f64, d_h: f64, z: f64) -> f64 {
    d_h * d_a * d_a * (1.0 + z).powi(3)
}

/// Serializable snapshot of a model's scalar outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmologySummary {
    pub params: CosmoParams,
    pub z: f64,
    pub bias: f64,
    pub omega_m: f64,
    pub f: f64,
    pub sigma8: f64,
    pub sigma12: f64,
    pub d_a: f64,
    pub d_h: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct FailingSolver;

    impl BoltzmannSolver for FailingSolver {
        type Results = crate::solver::analytic::AnalyticResults;

        fn solve(&self, _params: &CosmoParams, _z: f64) -> Result<Self::Results> {
            Err(AppError::solver("did not converge"))
        }
    }

    #[test]
    fn growth_rate_today_is_omega_m_power() {
        for &om in &[0.1, 0.3, 0.3163, 0.5, 1.0] {
            assert_eq!(growth_rate(om, 0.0), om.powf(6.0 / 11.0));
        }
    }

    #[test]
    fn growth_rate_tends_to_one_at_high_z() {
        assert!(growth_rate(0.3, 0.5) > growth_rate(0.3, 0.0));
        assert_relative_eq!(growth_rate(0.3, 1000.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn model_f_today_matches_params() {
        let params = CosmoParams::default();
        let cosmo = CosmologyModel::build(&params, 0.0, 2.0).unwrap();
        assert_eq!(cosmo.growth_rate(), params.omega_m().powf(6.0 / 11.0));
    }

    #[test]
    fn derived_quantities_are_consistent() {
        let cosmo = CosmologyModel::build(&CosmoParams::default(), 0.5, 2.0).unwrap();
        assert_eq!(cosmo.z(), 0.5);
        assert_relative_eq!(cosmo.bsigma8(), 2.0 * cosmo.sigma8());
        assert_relative_eq!(cosmo.fsigma8(), cosmo.growth_rate() * cosmo.sigma8());
        assert!(cosmo.angular_diameter_distance() > 1000.0 && cosmo.angular_diameter_distance() < 1600.0);
        assert!(cosmo.hubble_distance() > 3000.0 && cosmo.hubble_distance() < 3800.0);
        let dv = cosmo.hubble_distance() * cosmo.angular_diameter_distance().powi(2) * 1.5f64.powi(3);
        assert_relative_eq!(cosmo.volume_factor(), dv, max_relative = 1e-12);
    }

    #[test]
    fn linear_power_scalar_and_slice_agree() {
        let cosmo = CosmologyModel::build(&CosmoParams::default(), 0.5, 2.0).unwrap();
        let ks = [0.01, 0.05, 0.2];
        let many = cosmo.linear_power_many(&ks);
        for (k, p) in ks.iter().zip(&many) {
            assert_eq!(cosmo.linear_power(*k), *p);
            assert!(*p > 0.0);
        }
    }

    #[test]
    fn solver_failure_propagates() {
        let err = CosmologyModel::build_with(&FailingSolver, &CosmoParams::default(), 0.5, 2.0)
            .unwrap_err();
        assert_eq!(err, AppError::solver("did not converge"));
    }

    #[test]
    fn invalid_parameters_surface_as_solver_errors() {
        let params = CosmoParams { h0: 0.0, ..CosmoParams::default() };
        let err = CosmologyModel::build(&params, 0.5, 2.0).unwrap_err();
        assert!(matches!(err, AppError::CosmologySolver(_)));
    }

    #[test]
    fn summary_mirrors_accessors() {
        let cosmo = CosmologyModel::build(&CosmoParams::default(), 1.0, 1.5).unwrap();
        let s = cosmo.summary();
        assert_eq!(s.sigma8, cosmo.sigma8());
        assert_eq!(s.d_h, cosmo.hubble_distance());
        assert_eq!(s.bias, 1.5);
    }
}
