//! Mock band-power realizations.
//!
//! Each draw takes the noiseless observed power of every survey bin, turns the
//! survey's fractional error into an absolute one and adds an independent
//! Gaussian deviate. Bins are treated as uncorrelated.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cosmology::CosmologyModel;
use crate::domain::PowerOverrides;
use crate::error::{AppError, Result};
use crate::power::observed_power;
use crate::survey::Survey;

/// One noisy realization, aligned with the survey's bin ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockRealization {
    /// Noiseless prediction per bin.
    pub expected: Vec<f64>,
    /// Realized (noisy) band power per bin.
    pub power: Vec<f64>,
    /// Absolute 1σ error per bin.
    pub error: Vec<f64>,
}

impl MockRealization {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// `(realized − expected) / error` per bin.
    pub fn pulls(&self) -> Vec<f64> {
        self.power
            .iter()
            .zip(&self.expected)
            .zip(&self.error)
            .map(|((p, e), s)| (p - e) / s)
            .collect()
    }
}

/// Draws mock band powers from an owned random source.
///
/// Successive draws from one generator are independent; two generators seeded
/// identically produce identical sequences of draws.
#[derive(Debug, Clone)]
pub struct MockGenerator<R = StdRng> {
    rng: R,
}

impl MockGenerator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> MockGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw one realization of the survey's band powers under `cosmo`.
    pub fn draw(&mut self, survey: &Survey, cosmo: &CosmologyModel) -> Result<MockRealization> {
        if survey.z != cosmo.z() {
            return Err(AppError::CosmologyMismatch {
                coord_z: survey.z,
                template_z: cosmo.z(),
            });
        }
        survey.check_shape()?;

        let expected = observed_power(&survey.qt, &survey.qp, cosmo, cosmo, &PowerOverrides::none())?;
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| AppError::invalid(format!("Noise distribution error: {e}")))?;

        let mut power = Vec::with_capacity(expected.len());
        let mut error = Vec::with_capacity(expected.len());
        for (i, (&p, &rel)) in expected.iter().zip(&survey.sigp_p).enumerate() {
            let sigma = p * rel;
            if !sigma.is_finite() {
                return Err(AppError::NonFinite { what: "mock error", index: i });
            }
            let deviate: f64 = normal.sample(&mut self.rng);
            power.push(p + sigma * deviate);
            error.push(sigma);
        }

        debug!(bins = power.len(), "drew mock band powers");
        Ok(MockRealization { expected, power, error })
    }
}
