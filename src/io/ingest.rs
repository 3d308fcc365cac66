//! CSV ingest and normalization.
//!
//! Turns a unit-level CSV into a clean `Dataset` that is safe to cross-fit.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no estimation logic here
//!
//! Expected schema: an `outcome` column, a binary `treatment` column, and
//! covariate columns whose names start with `x`, taken in header order.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use nalgebra::DMatrix;

use crate::domain::{Dataset, DatasetStats};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// The ingested dataset plus stats and the row-level skip list.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
}

/// Load and validate a CSV file.
pub fn load_csv(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::invalid_config(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    ingest_reader(file)
}

/// Ingest from any reader (unit tests feed byte slices here).
pub fn ingest_reader<R: std::io::Read>(reader: R) -> Result<IngestedData, AppError> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| AppError::invalid_config(format!("Failed to read CSV header: {e}")))?
        .clone();

    let outcome_col = find_column(&headers, "outcome")?;
    let treatment_col = find_column(&headers, "treatment")?;
    let covariate_cols: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with('x'))
        .map(|(i, _)| i)
        .collect();
    if covariate_cols.is_empty() {
        return Err(AppError::invalid_config(
            "CSV has no covariate columns (names must start with 'x').",
        ));
    }

    let p = covariate_cols.len();
    let mut y = Vec::new();
    let mut treatment = Vec::new();
    let mut x_rows: Vec<Vec<f64>> = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        let line = idx + 2; // 1-based, after the header
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("Unreadable row: {e}"),
                });
                continue;
            }
        };
        match parse_row(&record, outcome_col, treatment_col, &covariate_cols) {
            Ok((yi, ti, xi)) => {
                y.push(yi);
                treatment.push(ti);
                x_rows.push(xi);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let n = y.len();
    if n == 0 {
        return Err(AppError::degenerate(format!(
            "No usable rows in CSV ({} skipped).",
            row_errors.len()
        )));
    }

    let mut x = DMatrix::<f64>::zeros(n, p);
    for (i, row) in x_rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            x[(i, j)] = v;
        }
    }

    let dataset = Dataset { y, treatment, x };
    dataset.validate()?;
    let stats = DatasetStats::from_dataset(&dataset);

    Ok(IngestedData {
        dataset,
        stats,
        row_errors,
    })
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, AppError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| AppError::invalid_config(format!("CSV is missing a '{name}' column.")))
}

fn parse_row(
    record: &StringRecord,
    outcome_col: usize,
    treatment_col: usize,
    covariate_cols: &[usize],
) -> Result<(f64, f64, Vec<f64>), String> {
    let yi = parse_field(record, outcome_col, "outcome")?;
    let ti = parse_field(record, treatment_col, "treatment")?;
    if ti != 0.0 && ti != 1.0 {
        return Err(format!("treatment must be 0 or 1 (got {ti})"));
    }
    let mut xi = Vec::with_capacity(covariate_cols.len());
    for &col in covariate_cols {
        xi.push(parse_field(record, col, "covariate")?);
    }
    Ok((yi, ti, xi))
}

fn parse_field(record: &StringRecord, col: usize, label: &str) -> Result<f64, String> {
    let raw = record
        .get(col)
        .ok_or_else(|| format!("missing {label} field"))?
        .trim();
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("unparseable {label} value '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("non-finite {label} value '{raw}'"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_well_formed_csv() {
        let csv = "outcome,treatment,x1,x2\n1.5,1,0.1,0.2\n2.5,0,0.3,0.4\n";
        let ingest = ingest_reader(csv.as_bytes()).unwrap();
        assert_eq!(ingest.dataset.n(), 2);
        assert_eq!(ingest.dataset.dim(), 2);
        assert_eq!(ingest.stats.n_treated, 1);
        assert!(ingest.row_errors.is_empty());
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "outcome,treatment,x1\n1.0,1,0.5\nnope,0,0.5\n2.0,2,0.5\n3.0,0,0.5\n";
        let ingest = ingest_reader(csv.as_bytes()).unwrap();
        assert_eq!(ingest.dataset.n(), 2);
        assert_eq!(ingest.row_errors.len(), 2);
        assert_eq!(ingest.row_errors[0].line, 3);
    }

    #[test]
    fn missing_required_column_is_config_error() {
        let csv = "outcome,x1\n1.0,0.5\n";
        let err = ingest_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn all_rows_bad_is_degenerate() {
        let csv = "outcome,treatment,x1\nbad,1,0.5\n";
        let err = ingest_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
