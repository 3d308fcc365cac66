//! Export per-unit scores to CSV and the estimate record to JSON.
//!
//! The score export is meant to be easy to consume in spreadsheets or
//! downstream scripts; the JSON file is the "portable" representation of a
//! run (record plus enough configuration to reproduce it).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{EstimateConfig, EstimateRecord};
use crate::error::AppError;

/// Write per-unit scores and influence values to a CSV file.
///
/// Rows are in fold-traversal order; `unit` is the original row index, so
/// the fold assignment is fully recoverable from the export.
pub fn write_scores_csv(
    path: &Path,
    folds: &[Vec<usize>],
    scores: &[f64],
    influence: &[f64],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::invalid_config(format!(
            "Failed to create score CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "fold,unit,score,influence")
        .map_err(|e| AppError::invalid_config(format!("Failed to write score CSV header: {e}")))?;

    let mut pos = 0usize;
    for (l, fold) in folds.iter().enumerate() {
        for &unit in fold {
            writeln!(
                file,
                "{},{},{:.10},{:.10}",
                l + 1,
                unit,
                scores[pos],
                influence[pos]
            )
            .map_err(|e| AppError::invalid_config(format!("Failed to write score CSV row: {e}")))?;
            pos += 1;
        }
    }
    Ok(())
}

/// The JSON schema for a saved run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateFile {
    pub tool: String,
    pub n_units: usize,
    pub folds: usize,
    pub mode: crate::domain::ScoreMode,
    pub alpha: crate::domain::AlphaMode,
    pub gamma: crate::domain::GammaMode,
    pub degree: crate::domain::BasisDegree,
    pub seed: u64,
    pub record: EstimateRecord,
}

/// Write the estimate JSON file.
pub fn write_estimate_json(
    path: &Path,
    record: &EstimateRecord,
    config: &EstimateConfig,
    n_units: usize,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::invalid_config(format!(
            "Failed to create estimate JSON '{}': {e}",
            path.display()
        ))
    })?;

    let out = EstimateFile {
        tool: "ate".to_string(),
        n_units,
        folds: config.folds,
        mode: config.mode,
        alpha: config.alpha_mode,
        gamma: config.gamma_mode,
        degree: config.degree,
        seed: config.seed,
        record: record.clone(),
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::invalid_config(format!("Failed to write estimate JSON: {e}")))?;
    Ok(())
}
