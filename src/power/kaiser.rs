//! Kaiser redshift-space galaxy power.
//!
//! Two entry points:
//!
//! - [`comoving_power`]: `(kt, kp)` in Mpc⁻¹ → galaxy power in Mpc³ under the
//!   linear Kaiser model `(bσ₈ + fσ₈ μ²)² P_lin(k) / σ₈²`.
//! - [`observed_power`]: dimensionless observed wavenumbers `(qt, qp)` → power in
//!   observed units. A *coordinate* cosmology (optionally rescaled by `at`/`ap`)
//!   maps `q` to `k`; a *template* cosmology supplies the power spectrum shape.
//!
//! Both have scalar (`*_at`) and elementwise slice forms. Slices must have equal
//! lengths; nothing is broadcast.

use tracing::debug;

use crate::cosmology::{CosmologyModel, volume_factor};
use crate::domain::PowerOverrides;
use crate::error::{AppError, Result};

/// `bσ₈` and `fσ₈` after applying overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KaiserAmplitudes {
    pub bsig8: f64,
    pub fsig8: f64,
}

impl KaiserAmplitudes {
    pub fn resolve(cosmo: &CosmologyModel, overrides: &PowerOverrides) -> Self {
        Self {
            bsig8: overrides.bsig8.unwrap_or_else(|| cosmo.bsigma8()),
            fsig8: overrides.fsig8.unwrap_or_else(|| cosmo.fsigma8()),
        }
    }

    /// Redshift-space amplitude `(bσ₈ + fσ₈ μ²)²`.
    pub fn kaiser_factor(&self, mu: f64) -> f64 {
        let a = self.bsig8 + self.fsig8 * mu * mu;
        a * a
    }
}

/// Maps observed wavenumbers to comoving ones for a coordinate cosmology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    pub z: f64,
    /// `D_A` after the `at` rescaling, Mpc.
    pub d_a: f64,
    /// `D_H` after the `ap` rescaling, Mpc.
    pub d_h: f64,
}

impl CoordinateTransform {
    pub fn new(coord: &CosmologyModel, overrides: &PowerOverrides) -> Self {
        let mut d_a = coord.angular_diameter_distance();
        let mut d_h = coord.hubble_distance();
        if let Some(at) = overrides.at {
            d_a *= at;
        }
        if let Some(ap) = overrides.ap {
            d_h *= ap;
        }
        Self { z: coord.z(), d_a, d_h }
    }

    /// `(qt, qp)` → `(kt, kp)` in Mpc⁻¹.
    pub fn to_comoving(&self, qt: f64, qp: f64) -> (f64, f64) {
        let z1 = 1.0 + self.z;
        (qt / self.d_a / z1, qp / self.d_h / z1)
    }

    /// Volume Jacobian `D_H D_A² (1+z)³` of the rescaled distances.
    pub fn volume_factor(&self) -> f64 {
        volume_factor(self.d_a, self.d_h, self.z)
    }
}

/// Comoving Kaiser power for one `(kt, kp)` pair.
///
/// Precondition: `kt² + kp² > 0`. At the origin `μ` is `0/0` and the result is
/// NaN; survey grids never contain that bin.
pub fn comoving_power_at(kt: f64, kp: f64, cosmo: &CosmologyModel, overrides: &PowerOverrides) -> f64 {
    let amplitudes = KaiserAmplitudes::resolve(cosmo, overrides);
    kaiser(kt, kp, cosmo, amplitudes)
}

/// Elementwise [`comoving_power_at`].
pub fn comoving_power(
    kt: &[f64],
    kp: &[f64],
    cosmo: &CosmologyModel,
    overrides: &PowerOverrides,
) -> Result<Vec<f64>> {
    check_lengths(kt, kp)?;
    let amplitudes = KaiserAmplitudes::resolve(cosmo, overrides);
    Ok(kt
        .iter()
        .zip(kp)
        .map(|(&t, &p)| kaiser(t, p, cosmo, amplitudes))
        .collect())
}

fn kaiser(kt: f64, kp: f64, cosmo: &CosmologyModel, amplitudes: KaiserAmplitudes) -> f64 {
    let k = (kt * kt + kp * kp).sqrt();
    let mu = kp / k;
    let sig8 = cosmo.sigma8();
    let p_norm = cosmo.linear_power(k) / (sig8 * sig8);
    amplitudes.kaiser_factor(mu) * p_norm
}

/// Observed-coordinate power for one `(qt, qp)` pair.
pub fn observed_power_at(
    qt: f64,
    qp: f64,
    coord: &CosmologyModel,
    template: &CosmologyModel,
    overrides: &PowerOverrides,
) -> Result<f64> {
    check_epochs(coord, template)?;
    let transform = CoordinateTransform::new(coord, overrides);
    let (kt, kp) = transform.to_comoving(qt, qp);
    Ok(comoving_power_at(kt, kp, template, overrides) / transform.volume_factor())
}

/// Elementwise [`observed_power_at`].
pub fn observed_power(
    qt: &[f64],
    qp: &[f64],
    coord: &CosmologyModel,
    template: &CosmologyModel,
    overrides: &PowerOverrides,
) -> Result<Vec<f64>> {
    check_epochs(coord, template)?;
    check_lengths(qt, qp)?;

    let transform = CoordinateTransform::new(coord, overrides);
    debug!(
        d_a = transform.d_a,
        d_h = transform.d_h,
        n = qt.len(),
        "observed power transform"
    );

    let (kt, kp): (Vec<f64>, Vec<f64>) = qt
        .iter()
        .zip(qp)
        .map(|(&t, &p)| transform.to_comoving(t, p))
        .unzip();
    let dv = transform.volume_factor();
    let power = comoving_power(&kt, &kp, template, overrides)?;
    Ok(power.into_iter().map(|p| p / dv).collect())
}

fn check_epochs(coord: &CosmologyModel, template: &CosmologyModel) -> Result<()> {
    if coord.z() != template.z() {
        return Err(AppError::CosmologyMismatch {
            coord_z: coord.z(),
            template_z: template.z(),
        });
    }
    Ok(())
}

fn check_lengths(transverse: &[f64], line_of_sight: &[f64]) -> Result<()> {
    if transverse.len() != line_of_sight.len() {
        return Err(AppError::ShapeMismatch {
            left: transverse.len(),
            right: line_of_sight.len(),
        });
    }
    Ok(())
}
