//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - runs the pipeline for the chosen subcommand
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, CompareArgs, CosmoArgs, MockArgs, SurveyArgs, SurveyCmdArgs};
use crate::domain::RunConfig;
use crate::error::Result;

pub mod pipeline;

/// Entry point for the `sigmax` binary.
pub fn run() -> Result<()> {
    // `.env` may set RUST_LOG; a missing file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Info(args) => handle_info(&args),
        Command::Survey(args) => handle_survey(&args),
        Command::Mock(args) => handle_mock(&args),
        Command::Compare(args) => handle_compare(&args),
    }
}

fn handle_info(args: &CosmoArgs) -> Result<()> {
    let config = run_config_from_args(args, &default_survey_args());
    let cosmo = pipeline::build_cosmology(&config)?;
    println!("{}", crate::report::format_cosmology(&cosmo));
    Ok(())
}

fn handle_survey(args: &SurveyCmdArgs) -> Result<()> {
    let config = run_config_from_args(&args.cosmo, &args.survey);
    let run = pipeline::run_survey(&config)?;

    println!("{}", crate::report::format_cosmology(&run.cosmology));
    println!("{}", crate::report::format_survey(&run.survey));

    if let Some(path) = &args.export {
        crate::io::write_survey_json(path, &run.cosmology, &run.survey)?;
        info!(path = %path.display(), "survey forecast exported");
    }
    Ok(())
}

fn handle_mock(args: &MockArgs) -> Result<()> {
    let run = match &args.from_survey {
        Some(path) => pipeline::run_mock_from_file(path, args.seed)?,
        None => pipeline::run_mock(&run_config_from_args(&args.cosmo, &args.survey), args.seed)?,
    };

    println!("{}", crate::report::format_survey(&run.survey));
    println!("{}", crate::report::format_mock(&run.survey, &run.mock, run.seed));

    if let Some(path) = &args.export {
        crate::io::write_mock_csv(path, &run.survey, &run.mock)?;
        info!(path = %path.display(), "mock realization exported");
    }
    Ok(())
}

fn handle_compare(args: &CompareArgs) -> Result<()> {
    let config = run_config_from_args(&args.cosmo, &args.survey);
    let template = args.template.config(&config, args.overrides.overrides());
    let cmp = pipeline::run_comparison(&config, &template)?;

    println!("{}", crate::report::format_comparison(&cmp));
    Ok(())
}

pub fn run_config_from_args(cosmo: &CosmoArgs, survey: &SurveyArgs) -> RunConfig {
    RunConfig {
        params: cosmo.params(),
        z: cosmo.z,
        bias: cosmo.bias,
        survey: survey.config(),
    }
}

// `info` has no survey flags; its config still carries the default geometry.
fn default_survey_args() -> SurveyArgs {
    let survey = crate::domain::SurveyConfig::default();
    SurveyArgs {
        nk: survey.nk,
        dk: survey.dk,
        volume: survey.volume_mpc3,
        n_gal: survey.n_gal,
    }
}
