//! Stage-1 nuisance estimation.
//!
//! Each fold's complement is handed to a `NuisanceEstimator`, which returns a
//! `NuisancePair` — the fitted Riesz representer `alpha` and the fitted
//! outcome regression `gamma`. The pair is scoped to one fold: the driver
//! produces it, evaluates it on the held-out fold, and drops it.
//!
//! The pair is a named record rather than a positional tuple so the two
//! nuisances cannot be swapped silently at a call site.

use nalgebra::{DMatrix, DVector};

use crate::domain::{AlphaMode, Dataset, EstimateConfig, GammaMode};
use crate::error::AppError;
use crate::math::Dictionary;

pub mod alpha;
pub mod gamma;

pub use alpha::FittedAlpha;
pub use gamma::FittedGamma;

/// The fitted nuisances for one training complement.
#[derive(Debug, Clone)]
pub struct NuisancePair {
    pub alpha: FittedAlpha,
    pub gamma: FittedGamma,
}

/// Fits `(alpha, gamma)` on a training set.
///
/// `Sync` so the driver can dispatch folds across the rayon pool.
pub trait NuisanceEstimator: Sync {
    fn fit(&self, train: &Dataset) -> Result<NuisancePair, AppError>;
}

/// The default stage-1 estimator: dictionary-based minimax / ridge fits with
/// an optional propensity-based alpha.
#[derive(Debug, Clone)]
pub struct Stage1Estimator {
    pub alpha_mode: AlphaMode,
    pub gamma_mode: GammaMode,
    pub dict: Dictionary,
    pub reg_alpha: f64,
    pub reg_gamma: f64,
    pub prop_clip: f64,
    pub weight_floor: f64,
    pub gram_jitter: f64,
    pub max_iters: usize,
}

impl Stage1Estimator {
    pub fn from_config(config: &EstimateConfig, dim: usize) -> Self {
        Self {
            alpha_mode: config.alpha_mode,
            gamma_mode: config.gamma_mode,
            dict: Dictionary::new(config.degree, dim),
            reg_alpha: config.reg_alpha,
            reg_gamma: config.reg_gamma,
            prop_clip: config.prop_clip,
            weight_floor: config.weight_floor,
            gram_jitter: config.gram_jitter,
            max_iters: config.max_iters,
        }
    }
}

impl NuisanceEstimator for Stage1Estimator {
    fn fit(&self, train: &Dataset) -> Result<NuisancePair, AppError> {
        if train.n() == 0 {
            return Err(AppError::degenerate("Training complement is empty."));
        }
        let n_treated = train.n_treated();
        if n_treated == 0 || n_treated == train.n() {
            return Err(AppError::numeric(
                "Training complement has a single treatment class.",
            ));
        }

        let alpha = match self.alpha_mode {
            AlphaMode::Minimax => {
                alpha::fit_minimax(&self.dict, train, self.reg_alpha, self.gram_jitter)?
            }
            AlphaMode::Propensity => alpha::fit_propensity(
                &self.dict,
                train,
                self.reg_alpha,
                self.prop_clip,
                self.weight_floor,
                self.gram_jitter,
                self.max_iters,
            )?,
        };
        let gamma = match self.gamma_mode {
            GammaMode::Ridge => {
                gamma::fit_ridge(&self.dict, train, self.reg_gamma, self.gram_jitter)?
            }
            GammaMode::ArmMeans => gamma::fit_arm_means(train)?,
        };
        Ok(NuisancePair { alpha, gamma })
    }
}

/// Copy row `i` of the covariate matrix into `out`.
pub(crate) fn copy_x_row(data: &Dataset, i: usize, out: &mut [f64]) {
    for (j, v) in out.iter_mut().enumerate() {
        *v = data.x[(i, j)];
    }
}

/// Build the `n x d` dictionary design matrix for a dataset.
pub(crate) fn design_matrix(dict: &Dictionary, data: &Dataset) -> DMatrix<f64> {
    let n = data.n();
    let d = dict.width();
    let mut xbuf = vec![0.0; data.dim()];
    let mut row = vec![0.0; d];
    let mut out = DMatrix::<f64>::zeros(n, d);
    for i in 0..n {
        copy_x_row(data, i, &mut xbuf);
        dict.fill_row(data.treatment[i], &xbuf, &mut row);
        for j in 0..d {
            out[(i, j)] = row[j];
        }
    }
    out
}

/// Sample mean of the ATE moment rows `b(1, x_i) - b(0, x_i)`.
pub(crate) fn moment_mean(dict: &Dictionary, data: &Dataset) -> DVector<f64> {
    let n = data.n();
    let d = dict.width();
    let mut xbuf = vec![0.0; data.dim()];
    let mut row = vec![0.0; d];
    let mut acc = DVector::<f64>::zeros(d);
    for i in 0..n {
        copy_x_row(data, i, &mut xbuf);
        dict.fill_moment_row(&xbuf, &mut row);
        for j in 0..d {
            acc[j] += row[j];
        }
    }
    acc / n as f64
}
