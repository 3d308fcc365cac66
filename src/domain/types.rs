//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during cross-fitting
//! - echoed into JSON exports
//! - reloaded later for comparisons across runs

use std::path::PathBuf;

use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which per-unit score the cross-fit driver evaluates on each held-out fold.
///
/// Both scores are un-centered; centering happens once, in the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    /// Plug-in score: `gamma(1,x) - gamma(0,x)` (no orthogonalizing correction).
    Plugin,
    /// Neyman-orthogonal score: plug-in plus `alpha(t,x) * (y - gamma(t,x))`.
    Dml,
}

/// How the Riesz representer `alpha` is estimated in stage 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AlphaMode {
    /// Closed-form minimax fit over the treatment-interacted dictionary.
    Minimax,
    /// Inverse-propensity weights from a clipped logistic fit.
    Propensity,
}

/// How the outcome regression `gamma` is estimated in stage 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GammaMode {
    /// Ridge regression on the treatment-interacted dictionary.
    Ridge,
    /// Per-arm outcome means (null model; useful as a baseline).
    ArmMeans,
}

/// Polynomial degree of the covariate dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BasisDegree {
    /// `[1, x]`, fully interacted with the treatment indicator.
    Linear,
    /// `[1, x, x^2]`, fully interacted with the treatment indicator.
    Quadratic,
}

/// Output rendering for the estimate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Labeled single-line summary.
    Text,
    /// Ampersand-delimited table row for typeset output.
    Tex,
}

/// The in-memory observation table: one row per unit.
///
/// Invariants (enforced by `validate`):
/// - `y`, `treatment` and the rows of `x` all have length `n`
/// - every treatment value is exactly `0.0` or `1.0`
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Outcome vector (length n).
    pub y: Vec<f64>,
    /// Binary treatment indicator (length n, values 0/1).
    pub treatment: Vec<f64>,
    /// Covariate matrix (n x p).
    pub x: DMatrix<f64>,
}

impl Dataset {
    pub fn n(&self) -> usize {
        self.y.len()
    }

    pub fn dim(&self) -> usize {
        self.x.ncols()
    }

    /// Check shape and value invariants. Run once, before any fold work.
    pub fn validate(&self) -> Result<(), AppError> {
        let n = self.y.len();
        if n == 0 {
            return Err(AppError::degenerate("Dataset is empty."));
        }
        if self.treatment.len() != n || self.x.nrows() != n {
            return Err(AppError::invalid_config(format!(
                "Mismatched input lengths: y={n}, treatment={}, covariate rows={}.",
                self.treatment.len(),
                self.x.nrows()
            )));
        }
        if self.y.iter().any(|v| !v.is_finite()) {
            return Err(AppError::invalid_config("Non-finite outcome value."));
        }
        if self.x.iter().any(|v| !v.is_finite()) {
            return Err(AppError::invalid_config("Non-finite covariate value."));
        }
        for (i, &t) in self.treatment.iter().enumerate() {
            if t != 0.0 && t != 1.0 {
                return Err(AppError::invalid_config(format!(
                    "Treatment must be 0 or 1 (unit {i} has {t})."
                )));
            }
        }
        Ok(())
    }

    /// Number of treated units.
    pub fn n_treated(&self) -> usize {
        self.treatment.iter().filter(|&&t| t == 1.0).count()
    }

    /// Gather the given rows into a new dataset (fold / complement views).
    pub fn gather(&self, indices: &[usize]) -> Dataset {
        let m = indices.len();
        let p = self.x.ncols();
        let mut y = Vec::with_capacity(m);
        let mut treatment = Vec::with_capacity(m);
        let mut x = DMatrix::<f64>::zeros(m, p);
        for (row, &i) in indices.iter().enumerate() {
            y.push(self.y[i]);
            treatment.push(self.treatment[i]);
            for j in 0..p {
                x[(row, j)] = self.x[(i, j)];
            }
        }
        Dataset { y, treatment, x }
    }
}

/// Summary stats about the units actually used for estimation.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_units: usize,
    pub n_treated: usize,
    pub n_untreated: usize,
    pub dim: usize,
    pub y_min: f64,
    pub y_max: f64,
}

impl DatasetStats {
    pub fn from_dataset(data: &Dataset) -> Self {
        let n_treated = data.n_treated();
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &v in &data.y {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }
        Self {
            n_units: data.n(),
            n_treated,
            n_untreated: data.n() - n_treated,
            dim: data.dim(),
            y_min,
            y_max,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct EstimateConfig {
    /// Number of cross-fitting folds (L >= 2).
    pub folds: usize,
    /// Scoring mode (plug-in vs. debiased).
    pub mode: ScoreMode,
    /// Stage-1 estimator selectors.
    pub alpha_mode: AlphaMode,
    pub gamma_mode: GammaMode,
    /// Dictionary degree for stage 1.
    pub degree: BasisDegree,
    /// Ridge weights for the alpha / gamma fits.
    pub reg_alpha: f64,
    pub reg_gamma: f64,
    /// Propensity clipping threshold: fitted e(x) is clipped to `[clip, 1-clip]`.
    pub prop_clip: f64,
    /// Lower bound on IRLS working weights (keeps the Newton step bounded).
    pub weight_floor: f64,
    /// Additive diagonal adjustment applied when a Gram factorization fails.
    pub gram_jitter: f64,
    /// Max IRLS iterations for the logistic propensity fit.
    pub max_iters: usize,
    /// Seed for the random fold assignment (and sample generation).
    pub seed: u64,
    /// Dispatch folds across the rayon pool instead of the sequential loop.
    pub parallel: bool,
    /// Per-fold progress lines on stderr.
    pub progress: bool,
    /// Output rendering.
    pub render: RenderMode,
    /// Append an ASCII histogram of influence values to the summary.
    pub histogram: bool,

    pub export_scores: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl EstimateConfig {
    /// Eager validation of everything that does not depend on the data size.
    ///
    /// The `folds <= n` check lives in the fold partitioner, which knows `n`.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.folds < 2 {
            return Err(AppError::invalid_config(format!(
                "Fold count must be >= 2 (got {}).",
                self.folds
            )));
        }
        for (name, v) in [
            ("reg-alpha", self.reg_alpha),
            ("reg-gamma", self.reg_gamma),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(AppError::invalid_config(format!(
                    "Regularization weight --{name} must be finite and >= 0 (got {v})."
                )));
            }
        }
        if !(self.prop_clip.is_finite() && self.prop_clip > 0.0 && self.prop_clip < 0.5) {
            return Err(AppError::invalid_config(format!(
                "Propensity clip must be in (0, 0.5) (got {}).",
                self.prop_clip
            )));
        }
        if !(self.weight_floor.is_finite() && self.weight_floor > 0.0) {
            return Err(AppError::invalid_config(
                "IRLS weight floor must be finite and > 0.",
            ));
        }
        if !(self.gram_jitter.is_finite() && self.gram_jitter > 0.0) {
            return Err(AppError::invalid_config(
                "Gram jitter must be finite and > 0.",
            ));
        }
        if self.max_iters == 0 {
            return Err(AppError::invalid_config("Max iterations must be >= 1."));
        }
        Ok(())
    }
}

/// The final 4-field summary. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    pub treated_count: usize,
    pub untreated_count: usize,
    pub ate: f64,
    pub se: f64,
}
