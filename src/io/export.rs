//! Survey and mock exports.
//!
//! - survey forecasts as JSON (`SurveyFile`), readable back with [`read_survey_json`]
//! - mock realizations as CSV, one row per bin

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cosmology::{CosmologyModel, CosmologySummary};
use crate::error::{AppError, Result};
use crate::mock::MockRealization;
use crate::survey::Survey;

/// On-disk representation of a survey forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub cosmology: CosmologySummary,
    pub survey: Survey,
}

/// Write a survey forecast JSON file.
pub fn write_survey_json(path: &Path, cosmo: &CosmologyModel, survey: &Survey) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create survey JSON '{}': {e}", path.display())))?;

    let out = SurveyFile {
        tool: "sigmax".to_string(),
        generated: Utc::now(),
        cosmology: cosmo.summary(),
        survey: survey.clone(),
    };

    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, &out)
        .map_err(|e| AppError::Io(format!("Failed to write survey JSON: {e}")))?;
    w.flush()
        .map_err(|e| AppError::Io(format!("Failed to write survey JSON: {e}")))?;
    Ok(())
}

/// Read a survey forecast JSON file.
pub fn read_survey_json(path: &Path) -> Result<SurveyFile> {
    let file = File::open(path)
        .map_err(|e| AppError::Io(format!("Failed to open survey JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::Io(format!("Invalid survey JSON: {e}")))
}

/// Write a mock realization to CSV.
pub fn write_mock_csv(path: &Path, survey: &Survey, mock: &MockRealization) -> Result<()> {
    survey.check_shape()?;
    if survey.n_bins() != mock.len() {
        return Err(AppError::ShapeMismatch {
            left: survey.n_bins(),
            right: mock.len(),
        });
    }

    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create mock CSV '{}': {e}", path.display())))?;
    let mut w = BufWriter::new(file);
    let row_err = |e: std::io::Error| AppError::Io(format!("Failed to write mock CSV row: {e}"));

    writeln!(w, "index,qt,qp,p_expected,p_mock,sigma,sigp_p").map_err(row_err)?;
    for i in 0..mock.len() {
        writeln!(
            w,
            "{},{:.10},{:.10},{:.10e},{:.10e},{:.10e},{:.10}",
            i, survey.qt[i], survey.qp[i], mock.expected[i], mock.power[i], mock.error[i], survey.sigp_p[i]
        )
        .map_err(row_err)?;
    }
    w.flush().map_err(row_err)?;
    Ok(())
}
