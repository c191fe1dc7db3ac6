//! Shared domain types.
//!
//! These are plain, serializable configuration values. Derived quantities live on
//! [`crate::cosmology::CosmologyModel`] and [`crate::survey::Survey`], never here.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// `Σmν / (Ων h²)` in eV, the standard conversion for massive neutrinos.
pub const NEUTRINO_MASS_PER_OMEGA_H2: f64 = 93.14;

/// Cosmological parameters handed to the Boltzmann solver.
///
/// Defaults describe a fiducial flat-ΛCDM-like setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmoParams {
    /// Hubble constant in km/s/Mpc.
    pub h0: f64,
    /// Physical baryon density `Ωb h²`.
    pub ombh2: f64,
    /// Physical cold dark matter density `Ωc h²`.
    pub omch2: f64,
    /// Sum of neutrino masses in eV.
    pub mnu: f64,
    /// Primordial scalar amplitude at the 0.05 Mpc⁻¹ pivot.
    pub a_s: f64,
    /// Scalar spectral index.
    pub n_s: f64,
}

impl Default for CosmoParams {
    fn default() -> Self {
        Self {
            h0: 67.0,
            ombh2: 0.022,
            omch2: 0.12,
            mnu: 0.0,
            a_s: 2e-9,
            n_s: 0.96,
        }
    }
}

impl CosmoParams {
    /// Dimensionless Hubble parameter `h = H0 / 100`.
    pub fn h(&self) -> f64 {
        self.h0 / 100.0
    }

    /// Physical massive-neutrino density `Ων h²`.
    pub fn omnuh2(&self) -> f64 {
        self.mnu / NEUTRINO_MASS_PER_OMEGA_H2
    }

    /// Total matter fraction today (baryons + CDM + massive neutrinos).
    pub fn omega_m(&self) -> f64 {
        let h = self.h();
        (self.ombh2 + self.omch2 + self.omnuh2()) / (h * h)
    }

    pub fn with_h0(mut self, h0: f64) -> Self {
        self.h0 = h0;
        self
    }

    pub fn with_omch2(mut self, omch2: f64) -> Self {
        self.omch2 = omch2;
        self
    }
}

/// Survey geometry and sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Bins per axis; the grid has `nk * nk` bins.
    pub nk: usize,
    /// Bin width in comoving wavenumber (Mpc⁻¹).
    pub dk: f64,
    /// Survey volume in Mpc³.
    pub volume_mpc3: f64,
    /// Number of galaxies in the survey.
    pub n_gal: f64,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            nk: 5,
            dk: 0.03,
            volume_mpc3: 1e9,
            n_gal: 1e6,
        }
    }
}

/// Optional per-call overrides for the Kaiser power model.
///
/// Every absent field falls back to the value derived from the cosmology the
/// model is evaluated against:
///
/// - `fsig8`: replaces `f σ₈` of the template cosmology
/// - `bsig8`: replaces `b σ₈` of the template cosmology
/// - `at`: multiplies `D_A` of the coordinate cosmology
/// - `ap`: multiplies `D_H` of the coordinate cosmology
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerOverrides {
    pub fsig8: Option<f64>,
    pub bsig8: Option<f64>,
    pub at: Option<f64>,
    pub ap: Option<f64>,
}

impl PowerOverrides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_fsig8(mut self, fsig8: f64) -> Self {
        self.fsig8 = Some(fsig8);
        self
    }

    pub fn with_bsig8(mut self, bsig8: f64) -> Self {
        self.bsig8 = Some(bsig8);
        self
    }

    pub fn with_at(mut self, at: f64) -> Self {
        self.at = Some(at);
        self
    }

    pub fn with_ap(mut self, ap: f64) -> Self {
        self.ap = Some(ap);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fsig8.is_none() && self.bsig8.is_none() && self.at.is_none() && self.ap.is_none()
    }
}

/// Which cosmology converts observed wavenumbers to comoving ones when a
/// template is compared against the truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoordSource {
    /// Use the true cosmology's distances (no AP distortion).
    True,
    /// Use the template cosmology's distances (AP distortion included).
    Template,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub params: CosmoParams,
    pub z: f64,
    pub bias: f64,
    pub survey: SurveyConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            params: CosmoParams::default(),
            z: 0.5,
            bias: 2.0,
            survey: SurveyConfig::default(),
        }
    }
}

/// Template side of a truth-vs-template comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub params: CosmoParams,
    pub bias: f64,
    pub coord: CoordSource,
    pub overrides: PowerOverrides,
}
