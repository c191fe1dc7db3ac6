//! Command-line parsing for the sigmaX band-power forecaster.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! cosmology and survey code. Flags are grouped into flattened structs so every
//! subcommand shares the same spelling for the same parameter.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{CoordSource, CosmoParams, PowerOverrides, RunConfig, SurveyConfig, TemplateConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sigmax",
    version,
    about = "Anisotropic galaxy power spectrum forecasts (Kaiser model + survey errors)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print derived cosmology quantities (f, sig8, sig12, DA, DH).
    Info(CosmoArgs),
    /// Forecast band-power errors on the survey grid.
    Survey(SurveyCmdArgs),
    /// Draw one Gaussian mock realization of the observed band powers.
    Mock(MockArgs),
    /// Compare a template cosmology's prediction against the truth on the survey grid.
    Compare(CompareArgs),
}

/// Cosmological parameters plus redshift and bias of the (true) cosmology.
#[derive(Debug, Args, Clone)]
pub struct CosmoArgs {
    /// Hubble constant (km/s/Mpc).
    #[arg(long, default_value_t = 67.0)]
    pub h0: f64,

    /// Physical baryon density Omega_b h^2.
    #[arg(long, default_value_t = 0.022)]
    pub ombh2: f64,

    /// Physical cold dark matter density Omega_c h^2.
    #[arg(long, default_value_t = 0.12)]
    pub omch2: f64,

    /// Sum of neutrino masses (eV).
    #[arg(long, default_value_t = 0.0)]
    pub mnu: f64,

    /// Primordial scalar amplitude.
    #[arg(long = "as", default_value_t = 2e-9)]
    pub a_s: f64,

    /// Scalar spectral index.
    #[arg(long = "ns", default_value_t = 0.96)]
    pub n_s: f64,

    /// Redshift.
    #[arg(long, default_value_t = 0.5)]
    pub z: f64,

    /// Linear galaxy bias.
    #[arg(short = 'b', long, default_value_t = 2.0)]
    pub bias: f64,
}

impl CosmoArgs {
    pub fn params(&self) -> CosmoParams {
        CosmoParams {
            h0: self.h0,
            ombh2: self.ombh2,
            omch2: self.omch2,
            mnu: self.mnu,
            a_s: self.a_s,
            n_s: self.n_s,
        }
    }
}

/// Survey geometry.
#[derive(Debug, Args, Clone)]
pub struct SurveyArgs {
    /// Bins per axis (grid has nk*nk bins).
    #[arg(long, default_value_t = 5)]
    pub nk: usize,

    /// Bin width in comoving k (1/Mpc).
    #[arg(long, default_value_t = 0.03)]
    pub dk: f64,

    /// Survey volume (Mpc^3).
    #[arg(long, default_value_t = 1e9)]
    pub volume: f64,

    /// Number of galaxies.
    #[arg(long = "n-gal", default_value_t = 1e6)]
    pub n_gal: f64,
}

impl SurveyArgs {
    pub fn config(&self) -> SurveyConfig {
        SurveyConfig {
            nk: self.nk,
            dk: self.dk,
            volume_mpc3: self.volume,
            n_gal: self.n_gal,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct SurveyCmdArgs {
    #[command(flatten)]
    pub cosmo: CosmoArgs,

    #[command(flatten)]
    pub survey: SurveyArgs,

    /// Export the forecast (cosmology summary + per-bin errors) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct MockArgs {
    #[command(flatten)]
    pub cosmo: CosmoArgs,

    #[command(flatten)]
    pub survey: SurveyArgs,

    /// Random seed for the realization.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Draw against a survey JSON written by `sigmax survey --export`
    /// (cosmology and survey flags are then ignored).
    #[arg(long = "from-survey", value_name = "JSON")]
    pub from_survey: Option<PathBuf>,

    /// Export the realization to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Overrides applied to the template prediction.
#[derive(Debug, Args, Clone, Default)]
pub struct OverrideArgs {
    /// Replace the template's f*sig8.
    #[arg(long)]
    pub fsig8: Option<f64>,

    /// Replace the template's b*sig8.
    #[arg(long)]
    pub bsig8: Option<f64>,

    /// Scale the coordinate cosmology's DA (> 0).
    #[arg(long, value_parser = parse_scale_factor)]
    pub at: Option<f64>,

    /// Scale the coordinate cosmology's DH (> 0).
    #[arg(long, value_parser = parse_scale_factor)]
    pub ap: Option<f64>,
}

impl OverrideArgs {
    pub fn overrides(&self) -> PowerOverrides {
        PowerOverrides {
            fsig8: self.fsig8,
            bsig8: self.bsig8,
            at: self.at,
            ap: self.ap,
        }
    }
}

/// Distance rescaling factors must be positive and finite.
fn parse_scale_factor(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if !(value.is_finite() && value > 0.0) {
        return Err(format!("must be a positive, finite factor (got {raw})"));
    }
    Ok(value)
}

/// Template cosmology. Unset values fall back to the true cosmology's.
#[derive(Debug, Args, Clone)]
pub struct TemplateArgs {
    #[arg(long)]
    pub template_h0: Option<f64>,

    #[arg(long)]
    pub template_ombh2: Option<f64>,

    #[arg(long)]
    pub template_omch2: Option<f64>,

    #[arg(long)]
    pub template_mnu: Option<f64>,

    #[arg(long = "template-as")]
    pub template_a_s: Option<f64>,

    #[arg(long = "template-ns")]
    pub template_n_s: Option<f64>,

    #[arg(long)]
    pub template_bias: Option<f64>,

    /// Which cosmology converts observed to comoving wavenumbers.
    #[arg(long, value_enum, default_value_t = CoordSource::Template)]
    pub coord: CoordSource,
}

impl TemplateArgs {
    pub fn config(&self, truth: &RunConfig, overrides: PowerOverrides) -> TemplateConfig {
        let t = truth.params;
        TemplateConfig {
            params: CosmoParams {
                h0: self.template_h0.unwrap_or(t.h0),
                ombh2: self.template_ombh2.unwrap_or(t.ombh2),
                omch2: self.template_omch2.unwrap_or(t.omch2),
                mnu: self.template_mnu.unwrap_or(t.mnu),
                a_s: self.template_a_s.unwrap_or(t.a_s),
                n_s: self.template_n_s.unwrap_or(t.n_s),
            },
            bias: self.template_bias.unwrap_or(truth.bias),
            coord: self.coord,
            overrides,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub cosmo: CosmoArgs,

    #[command(flatten)]
    pub survey: SurveyArgs,

    #[command(flatten)]
    pub template: TemplateArgs,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}
