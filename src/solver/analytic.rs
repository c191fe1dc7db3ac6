//! Analytic solver backend.
//!
//! A fitting-formula stand-in for a Boltzmann code, good to a few percent for
//! flat ΛCDM:
//!
//! - background: `H(z) = H0 √(Ωm (1+z)³ + ΩΛ)`, radiation neglected
//! - transfer function: Eisenstein & Hu (1998) "no-wiggle" form
//! - growth: Carroll, Press & Turner (1992) suppression factor, `D(a) → a` early
//! - primordial spectrum: `Δ²_R = As (k / 0.05 Mpc⁻¹)^(ns−1)`
//!
//! Massive neutrinos only enter through `Ωm`; their free-streaming suppression
//! is not modelled.

use std::f64::consts::{E, PI};

use tracing::debug;

use crate::domain::{CosmoParams, SPEED_OF_LIGHT_KM_S};
use crate::error::{AppError, Result};
use crate::math::{simpson, top_hat_window};
use crate::solver::{BoltzmannSolver, PowerTable, SolverResults};

/// CMB temperature today in K.
const T_CMB: f64 = 2.7255;

/// Primordial pivot scale in Mpc⁻¹.
const K_PIVOT: f64 = 0.05;

/// Slack on `Ωm ≤ 1` so an exactly Einstein-de Sitter input survives rounding.
const OMEGA_M_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticSolver {
    /// Tabulation / integration range for the linear power (Mpc⁻¹).
    pub k_min: f64,
    pub k_max: f64,
    /// Number of points in the tabulated power.
    pub n_k: usize,
    /// Simpson panels for the comoving-distance integral.
    pub distance_intervals: usize,
    /// Simpson panels (in ln k) for `σ_R`.
    pub sigma_intervals: usize,
}

impl Default for AnalyticSolver {
    fn default() -> Self {
        Self {
            k_min: 1e-5,
            k_max: 1e2,
            n_k: 512,
            distance_intervals: 512,
            sigma_intervals: 4096,
        }
    }
}

impl BoltzmannSolver for AnalyticSolver {
    type Results = AnalyticResults;

    fn solve(&self, params: &CosmoParams, z: f64) -> Result<AnalyticResults> {
        validate(params, z)?;

        let omega_m = params.omega_m();
        let omega_l = (1.0 - omega_m).max(0.0);
        let h = params.h();
        let omh2 = params.ombh2 + params.omch2 + params.omnuh2();
        let fb = params.ombh2 / omh2;

        // Sound horizon and shape-parameter suppression (EH98 eqs. 26, 31).
        let sound_horizon =
            44.5 * (9.83 / omh2).ln() / (1.0 + 10.0 * params.ombh2.powf(0.75)).sqrt();
        let alpha_gamma =
            1.0 - 0.328 * (431.0 * omh2).ln() * fb + 0.38 * (22.3 * omh2).ln() * fb * fb;

        let mut results = AnalyticResults {
            params: *params,
            z,
            omega_m,
            omega_l,
            h,
            sound_horizon,
            alpha_gamma,
            growth: 0.0,
            k_min: self.k_min,
            k_max: self.k_max,
            n_k: self.n_k,
            distance_intervals: self.distance_intervals,
            sigma_intervals: self.sigma_intervals,
        };
        results.growth = results.growth_factor(z);

        if !(results.growth.is_finite() && results.growth > 0.0) {
            return Err(AppError::solver(format!(
                "growth factor did not converge at z={z} (D={})",
                results.growth
            )));
        }

        debug!(
            h0 = params.h0,
            omega_m,
            z,
            growth = results.growth,
            "analytic solver prepared background"
        );
        Ok(results)
    }
}

fn validate(params: &CosmoParams, z: f64) -> Result<()> {
    let fields = [
        ("H0", params.h0),
        ("ombh2", params.ombh2),
        ("omch2", params.omch2),
        ("mnu", params.mnu),
        ("As", params.a_s),
        ("ns", params.n_s),
        ("z", z),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(AppError::solver(format!("{name} must be finite (got {value})")));
        }
    }
    if params.h0 <= 0.0 {
        return Err(AppError::solver(format!("H0 must be > 0 (got {})", params.h0)));
    }
    if params.ombh2 <= 0.0 {
        return Err(AppError::solver(format!("ombh2 must be > 0 (got {})", params.ombh2)));
    }
    if params.omch2 < 0.0 || params.mnu < 0.0 {
        return Err(AppError::solver("omch2 and mnu must be non-negative"));
    }
    if params.a_s <= 0.0 {
        return Err(AppError::solver(format!("As must be > 0 (got {})", params.a_s)));
    }
    if z < 0.0 {
        return Err(AppError::solver(format!("redshift must be >= 0 (got {z})")));
    }
    let omega_m = params.omega_m();
    if omega_m > 1.0 + OMEGA_M_SLACK {
        return Err(AppError::solver(format!(
            "Omega_m = {omega_m:.4} exceeds 1; a flat background needs Omega_Lambda >= 0"
        )));
    }
    Ok(())
}

/// Background and linear power for one parameter set at one redshift.
#[derive(Debug, Clone)]
pub struct AnalyticResults {
    params: CosmoParams,
    z: f64,
    omega_m: f64,
    omega_l: f64,
    h: f64,
    sound_horizon: f64,
    alpha_gamma: f64,
    growth: f64,
    k_min: f64,
    k_max: f64,
    n_k: usize,
    distance_intervals: usize,
    sigma_intervals: usize,
}

impl AnalyticResults {
    /// Dimensionless expansion rate `E(z) = H(z)/H0`.
    pub fn e_of_z(&self, z: f64) -> f64 {
        let a3 = (1.0 + z).powi(3);
        (self.omega_m * a3 + self.omega_l).sqrt()
    }

    /// Line-of-sight comoving distance in Mpc.
    pub fn comoving_distance(&self, z: f64) -> f64 {
        let hubble_distance_0 = SPEED_OF_LIGHT_KM_S / self.params.h0;
        hubble_distance_0 * simpson(|zp| 1.0 / self.e_of_z(zp), 0.0, z, self.distance_intervals)
    }

    /// Linear growth factor normalized to `D → a` in matter domination.
    pub fn growth_factor(&self, z: f64) -> f64 {
        let e2 = self.e_of_z(z).powi(2);
        let om_z = self.omega_m * (1.0 + z).powi(3) / e2;
        let ol_z = self.omega_l / e2;
        let g = 2.5 * om_z
            / (om_z.powf(4.0 / 7.0) - ol_z + (1.0 + om_z / 2.0) * (1.0 + ol_z / 70.0));
        g / (1.0 + z)
    }

    /// Eisenstein & Hu no-wiggle transfer function, `k` in Mpc⁻¹.
    pub fn transfer(&self, k: f64) -> f64 {
        let theta2 = (T_CMB / 2.7).powi(2);
        let ks = 0.43 * k * self.sound_horizon;
        let gamma_eff = self.omega_m
            * self.h
            * (self.alpha_gamma + (1.0 - self.alpha_gamma) / (1.0 + ks.powi(4)));
        let q = k / self.h * theta2 / gamma_eff;
        let l0 = (2.0 * E + 1.8 * q).ln();
        let c0 = 14.2 + 731.0 / (1.0 + 62.5 * q);
        l0 / (l0 + c0 * q * q)
    }

    /// Dimensionless linear power `Δ²(k) = k³ P(k) / 2π²` at the solved redshift.
    pub fn delta2(&self, k: f64) -> f64 {
        let x = SPEED_OF_LIGHT_KM_S * k / self.params.h0;
        let primordial = self.params.a_s * (k / K_PIVOT).powf(self.params.n_s - 1.0);
        let t = self.transfer(k);
        let d = self.growth / self.omega_m;
        4.0 / 25.0 * primordial * x.powi(4) * t * t * d * d
    }

    /// Linear matter power in Mpc³ at the solved redshift.
    pub fn linear_power(&self, k: f64) -> f64 {
        2.0 * PI * PI * self.delta2(k) / (k * k * k)
    }
}

impl SolverResults for AnalyticResults {
    fn matter_power_interpolator(&self) -> Result<PowerTable> {
        PowerTable::tabulate(self.z, self.k_min, self.k_max, self.n_k, |k| self.linear_power(k))
    }

    fn angular_diameter_distance(&self, z: f64) -> f64 {
        self.comoving_distance(z) / (1.0 + z)
    }

    fn h_of_z(&self, z: f64) -> f64 {
        self.params.h0 * self.e_of_z(z) / SPEED_OF_LIGHT_KM_S
    }

    fn sigma_r(&self, r: f64, hubble_units: bool) -> Result<f64> {
        let radius = if hubble_units { r / self.h } else { r };
        if !(radius.is_finite() && radius > 0.0) {
            return Err(AppError::solver(format!("smoothing radius must be > 0 (got {r})")));
        }

        let integrand = |ln_k: f64| {
            let k = ln_k.exp();
            let w = top_hat_window(k * radius);
            self.delta2(k) * w * w
        };
        let variance = simpson(integrand, self.k_min.ln(), self.k_max.ln(), self.sigma_intervals);
        if !(variance.is_finite() && variance > 0.0) {
            return Err(AppError::solver(format!(
                "sigma_R integral did not converge for R={r} (variance={variance})"
            )));
        }
        Ok(variance.sqrt())
    }
}
