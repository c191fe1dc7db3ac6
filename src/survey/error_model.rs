//! Survey band-power error model.
//!
//! Given a cosmology and a survey geometry we:
//!
//! - lay out an `Nk × Nk` grid of observed `(qt, qp)` bin centres, starting one
//!   bin width away from the origin
//! - convert the survey volume and galaxy count to observed units
//! - predict `nP` (galaxy density times observed power) per bin
//! - compute the fractional error `sigP/P` per bin
//!
//! Bin `i` sits at transverse index `it = i / Nk` and line-of-sight index
//! `ip = i % Nk`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cosmology::CosmologyModel;
use crate::domain::{PowerOverrides, SurveyConfig};
use crate::error::{AppError, Result};
use crate::power::observed_power;

/// Shot-noise term of the fractional error, `1 + nP/nP`.
///
/// Known defect: this is `2` for every nonzero `nP`, so the error does not
/// depend on the signal-to-noise of the bin. The expression was most likely
/// meant to be `1 + 1/nP`. It is kept as-is so results stay comparable with
/// existing analyses; a NaN comes back for `nP = 0`, which
/// [`Survey::build`] reports as [`AppError::EmptyBin`].
#[allow(clippy::eq_op)]
pub fn shot_noise_factor(np: f64) -> f64 {
    1.0 + np / np
}

/// One cell of the survey grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyBin {
    pub index: usize,
    pub it: usize,
    pub ip: usize,
    pub qt: f64,
    pub qp: f64,
    pub np: f64,
    pub sigp_p: f64,
}

/// A survey and its per-bin error forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub z: f64,
    /// Distances copied from the cosmology the survey was built with (Mpc).
    pub d_a: f64,
    pub d_h: f64,
    /// `D_H D_A² (1+z)³` in Mpc³.
    pub volume_factor: f64,
    pub nk: usize,
    /// Comoving bin width (Mpc⁻¹).
    pub dk: f64,
    /// Observed bin widths.
    pub dqt: f64,
    pub dqp: f64,
    pub qt: Vec<f64>,
    pub qp: Vec<f64>,
    pub volume_mpc3: f64,
    pub volume_obs: f64,
    pub n_gal: f64,
    pub ng_obs: f64,
    pub np: Vec<f64>,
    pub sigp_p: Vec<f64>,
}

impl Survey {
    pub fn build(cosmo: &CosmologyModel, config: &SurveyConfig) -> Result<Self> {
        validate(config)?;

        let z = cosmo.z();
        let z1 = 1.0 + z;
        let d_a = cosmo.angular_diameter_distance();
        let d_h = cosmo.hubble_distance();
        if !(d_a > 0.0 && d_h > 0.0) {
            return Err(AppError::invalid(format!(
                "survey needs positive distances (D_A={d_a}, D_H={d_h} at z={z})"
            )));
        }

        let nk = config.nk;
        let dqt = config.dk * d_a * z1;
        let dqp = config.dk * d_h * z1;
        let (qt, qp) = bin_centres(nk, dqt, dqp);

        // Survey volume and galaxy density in observed units.
        let volume_factor = cosmo.volume_factor();
        let volume_obs = config.volume_mpc3 / volume_factor;
        let ng_obs = config.n_gal / volume_obs;

        let power = observed_power(&qt, &qp, cosmo, cosmo, &PowerOverrides::none())?;
        let np: Vec<f64> = power.iter().map(|p| ng_obs * p).collect();

        let sigp_p = fractional_errors(&qt, &qp, &np, volume_obs, dqt, dqp)?;

        debug!(dqt, dqp, volume_obs, ng_obs, "survey geometry");
        info!(z, bins = np.len(), "survey error model built");

        Ok(Self {
            z,
            d_a,
            d_h,
            volume_factor,
            nk,
            dk: config.dk,
            dqt,
            dqp,
            qt,
            qp,
            volume_mpc3: config.volume_mpc3,
            volume_obs,
            n_gal: config.n_gal,
            ng_obs,
            np,
            sigp_p,
        })
    }

    pub fn n_bins(&self) -> usize {
        self.qt.len()
    }

    /// Check that every per-bin column holds exactly `nk * nk` entries.
    ///
    /// Surveys built here always pass; ones read back from disk or edited by
    /// hand may not.
    pub fn check_shape(&self) -> Result<()> {
        let expected = self.nk * self.nk;
        for len in [self.qt.len(), self.qp.len(), self.np.len(), self.sigp_p.len()] {
            if len != expected {
                return Err(AppError::ShapeMismatch { left: expected, right: len });
            }
        }
        Ok(())
    }

    /// Flat bin index for grid position `(it, ip)`.
    pub fn bin_index(&self, it: usize, ip: usize) -> usize {
        it * self.nk + ip
    }

    /// Bin `index`, or `None` when it is out of range for any column.
    pub fn bin(&self, index: usize) -> Option<SurveyBin> {
        if self.nk == 0 {
            return None;
        }
        Some(SurveyBin {
            index,
            it: index / self.nk,
            ip: index % self.nk,
            qt: *self.qt.get(index)?,
            qp: *self.qp.get(index)?,
            np: *self.np.get(index)?,
            sigp_p: *self.sigp_p.get(index)?,
        })
    }

    pub fn bins(&self) -> impl Iterator<Item = SurveyBin> + '_ {
        (0..self.n_bins()).filter_map(|i| self.bin(i))
    }
}

/// `sigP/P = 2π √(2 / (V_obs qt dqt dqp)) (1 + nP/nP)` per bin.
pub fn fractional_errors(
    qt: &[f64],
    qp: &[f64],
    np: &[f64],
    volume_obs: f64,
    dqt: f64,
    dqp: f64,
) -> Result<Vec<f64>> {
    for len in [qt.len(), qp.len()] {
        if len != np.len() {
            return Err(AppError::ShapeMismatch { left: np.len(), right: len });
        }
    }
    let mut sigp_p = Vec::with_capacity(np.len());
    for (i, &bin_np) in np.iter().enumerate() {
        if bin_np == 0.0 {
            return Err(AppError::EmptyBin { index: i, qt: qt[i], qp: qp[i] });
        }
        if !bin_np.is_finite() {
            return Err(AppError::NonFinite { what: "nP", index: i });
        }
        let cell = volume_obs * qt[i] * dqt * dqp;
        let sigma = 2.0 * PI * (2.0 / cell).sqrt() * shot_noise_factor(bin_np);
        if !sigma.is_finite() {
            return Err(AppError::NonFinite { what: "sigP/P", index: i });
        }
        sigp_p.push(sigma);
    }
    Ok(sigp_p)
}

fn validate(config: &SurveyConfig) -> Result<()> {
    if config.nk == 0 {
        return Err(AppError::invalid("Survey needs at least one bin per axis."));
    }
    if !(config.dk.is_finite() && config.dk > 0.0) {
        return Err(AppError::invalid(format!("Bin width dk must be > 0 (got {}).", config.dk)));
    }
    if !(config.volume_mpc3.is_finite() && config.volume_mpc3 > 0.0) {
        return Err(AppError::invalid(format!(
            "Survey volume must be > 0 (got {}).",
            config.volume_mpc3
        )));
    }
    if !(config.n_gal.is_finite() && config.n_gal > 0.0) {
        return Err(AppError::invalid(format!(
            "Galaxy count must be > 0 (got {}).",
            config.n_gal
        )));
    }
    Ok(())
}

fn bin_centres(nk: usize, dqt: f64, dqp: f64) -> (Vec<f64>, Vec<f64>) {
    let n = nk * nk;
    let mut qt = vec![0.0; n];
    let mut qp = vec![0.0; n];
    for it in 0..nk {
        let iqt = dqt * (it + 1) as f64;
        for ip in 0..nk {
            let i = it * nk + ip;
            qt[i] = iqt;
            qp[i] = dqp * (ip + 1) as f64;
        }
    }
    (qt, qp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CosmoParams;
    use approx::assert_relative_eq;

    fn fiducial(z: f64) -> CosmologyModel {
        CosmologyModel::build(&CosmoParams::default(), z, 2.0).unwrap()
    }

    #[test]
    fn shot_noise_factor_is_two_for_any_signal() {
        // Documents the current behaviour; `1 + 1/nP` would depend on nP.
        for &np in &[1e-6, 0.3, 1.0, 42.0, 1e9, -5.0] {
            assert_eq!(shot_noise_factor(np), 2.0);
        }
        assert!(shot_noise_factor(0.0).is_nan());
    }

    #[test]
    fn grid_starts_one_bin_from_origin() {
        let cosmo = fiducial(0.5);
        let config = SurveyConfig { nk: 3, ..SurveyConfig::default() };
        let survey = Survey::build(&cosmo, &config).unwrap();
        assert_eq!(survey.n_bins(), 9);
        for it in 0..3 {
            for ip in 0..3 {
                let i = survey.bin_index(it, ip);
                assert_eq!(i, it * 3 + ip);
                assert_eq!(survey.qt[i], survey.dqt * (it + 1) as f64);
                assert_eq!(survey.qp[i], survey.dqp * (ip + 1) as f64);
            }
        }
        assert!(survey.qt.iter().all(|&q| q > 0.0));
        assert!(survey.qp.iter().all(|&q| q > 0.0));
    }

    #[test]
    fn bin_widths_follow_distances() {
        let cosmo = fiducial(0.5);
        let survey = Survey::build(&cosmo, &SurveyConfig::default()).unwrap();
        assert_relative_eq!(survey.dqt, 0.03 * cosmo.angular_diameter_distance() * 1.5);
        assert_relative_eq!(survey.dqp, 0.03 * cosmo.hubble_distance() * 1.5);
        assert_relative_eq!(survey.volume_obs, 1e9 / cosmo.volume_factor());
        assert_relative_eq!(survey.ng_obs, 1e6 / survey.volume_obs);
    }

    #[test]
    fn fiducial_survey_has_finite_errors() {
        let survey = Survey::build(&fiducial(0.5), &SurveyConfig::default()).unwrap();
        assert_eq!(survey.n_bins(), 25);
        assert_eq!(survey.np.len(), 25);
        assert_eq!(survey.sigp_p.len(), 25);
        for bin in survey.bins() {
            assert!(bin.np > 0.0, "bin {} has nP={}", bin.index, bin.np);
            assert!(bin.sigp_p.is_finite() && bin.sigp_p > 0.0);
        }
    }

    #[test]
    fn errors_shrink_with_transverse_wavenumber() {
        let survey = Survey::build(&fiducial(0.5), &SurveyConfig::default()).unwrap();
        // sigP/P ∝ 1/sqrt(qt) along a row of fixed qp
        let a = survey.bin(survey.bin_index(0, 2)).unwrap();
        let b = survey.bin(survey.bin_index(3, 2)).unwrap();
        assert_relative_eq!(a.sigp_p / b.sigp_p, 2.0, max_relative = 1e-12);
    }

    #[test]
    fn fractional_error_matches_formula() {
        let survey = Survey::build(&fiducial(0.8), &SurveyConfig::default()).unwrap();
        let bin = survey.bin(7).unwrap();
        assert_eq!((bin.it, bin.ip), (1, 2));
        let expected = 2.0 * PI * (2.0 / (survey.volume_obs * bin.qt * survey.dqt * survey.dqp)).sqrt() * 2.0;
        assert_relative_eq!(bin.sigp_p, expected, max_relative = 1e-12);
        assert!(survey.bin(25).is_none());
    }

    #[test]
    fn galaxy_count_sets_density() {
        let cosmo = fiducial(0.5);
        let sparse = Survey::build(&cosmo, &SurveyConfig { n_gal: 1e5, ..SurveyConfig::default() }).unwrap();
        let dense = Survey::build(&cosmo, &SurveyConfig::default()).unwrap();
        assert_relative_eq!(dense.np[0] / sparse.np[0], 10.0, max_relative = 1e-12);
        // the literal shot-noise term leaves the error untouched
        assert_eq!(dense.sigp_p, sparse.sigp_p);
    }

    #[test]
    fn zero_signal_bins_abort_construction() {
        let qt = [1.0, 2.0, 3.0];
        let qp = [5.0, 5.0, 5.0];
        let err = fractional_errors(&qt, &qp, &[0.4, 0.0, 0.2], 1.0, 1.0, 1.0).unwrap_err();
        assert_eq!(err, AppError::EmptyBin { index: 1, qt: 2.0, qp: 5.0 });
        assert_eq!(err.exit_code(), 3);

        let err = fractional_errors(&qt, &qp, &[0.4, f64::NAN, 0.2], 1.0, 1.0, 1.0).unwrap_err();
        assert_eq!(err, AppError::NonFinite { what: "nP", index: 1 });
    }

    #[test]
    fn fractional_errors_reject_mismatched_columns() {
        let err = fractional_errors(&[1.0], &[1.0], &[0.5, 0.5], 1.0, 1.0, 1.0).unwrap_err();
        assert_eq!(err, AppError::ShapeMismatch { left: 2, right: 1 });
        let err = fractional_errors(&[1.0, 2.0], &[1.0], &[0.5, 0.5], 1.0, 1.0, 1.0).unwrap_err();
        assert_eq!(err, AppError::ShapeMismatch { left: 2, right: 1 });
    }

    #[test]
    fn built_surveys_have_consistent_shape() {
        let mut survey = Survey::build(&fiducial(0.5), &SurveyConfig::default()).unwrap();
        assert!(survey.check_shape().is_ok());
        survey.sigp_p.truncate(3);
        assert_eq!(
            survey.check_shape().unwrap_err(),
            AppError::ShapeMismatch { left: 25, right: 3 }
        );
        assert!(survey.bin(2).is_some());
        assert!(survey.bin(3).is_none());
    }

    #[test]
    fn zero_bias_still_has_signal_off_the_transverse_axis() {
        // Every grid bin has qp > 0, so f σ8 μ² keeps nP positive even for b = 0.
        let zero_bias = CosmologyModel::build(&CosmoParams::default(), 0.5, 0.0).unwrap();
        let survey = Survey::build(&zero_bias, &SurveyConfig::default()).unwrap();
        assert!(survey.np.iter().all(|&np| np > 0.0));
    }

    #[test]
    fn rejects_invalid_geometry() {
        let cosmo = fiducial(0.5);
        for config in [
            SurveyConfig { nk: 0, ..SurveyConfig::default() },
            SurveyConfig { dk: 0.0, ..SurveyConfig::default() },
            SurveyConfig { volume_mpc3: -1.0, ..SurveyConfig::default() },
            SurveyConfig { n_gal: f64::NAN, ..SurveyConfig::default() },
        ] {
            assert!(matches!(
                Survey::build(&cosmo, &config),
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn zero_redshift_has_no_observed_grid() {
        let cosmo = fiducial(0.0);
        assert!(matches!(
            Survey::build(&cosmo, &SurveyConfig::default()),
            Err(AppError::InvalidInput(_))
        ));
    }
}
