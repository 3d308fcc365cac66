//! Score aggregation and asymptotic inference.
//!
//! Given the concatenated per-unit scores:
//!
//! ```text
//! ate        = mean(scores)
//! influence  = scores - ate          (mean-zero by construction)
//! variance   = mean(influence^2)
//! se         = sqrt(variance / n)
//! ```
//!
//! All arithmetic is in f64. An empty score vector is a degenerate-sample
//! error, never a silent NaN.

use crate::error::AppError;

/// Aggregated point estimate plus inference inputs.
#[derive(Debug, Clone)]
pub struct EstimateSummary {
    pub n: usize,
    pub ate: f64,
    pub variance: f64,
    pub se: f64,
    /// Per-unit influence values, in the same (fold-traversal) order as the
    /// input scores. Kept for exports and diagnostics.
    pub influence: Vec<f64>,
}

/// Aggregate the concatenated per-unit scores into an ATE and its SE.
pub fn summarize_scores(scores: &[f64]) -> Result<EstimateSummary, AppError> {
    let n = scores.len();
    if n == 0 {
        return Err(AppError::degenerate("No scores to aggregate."));
    }
    if let Some(i) = scores.iter().position(|v| !v.is_finite()) {
        return Err(AppError::numeric(format!(
            "Non-finite score at position {i}."
        )));
    }

    let ate = scores.iter().sum::<f64>() / n as f64;
    let influence: Vec<f64> = scores.iter().map(|s| s - ate).collect();
    let variance = influence.iter().map(|v| v * v).sum::<f64>() / n as f64;
    let se = (variance / n as f64).sqrt();

    Ok(EstimateSummary {
        n,
        ate,
        variance,
        se,
        influence,
    })
}
