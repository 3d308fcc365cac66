//! Synthetic observational sample with a known average treatment effect.
//!
//! The generator is the workbench for the `simulate` subcommand: covariates
//! are standard normal, treatment follows a logistic propensity in the
//! covariates (so the sample is confounded, not randomized), and the outcome
//! is linear with a homogeneous effect. The true ATE is the `effect`
//! parameter exactly, which makes end-to-end recovery checks direct.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::Dataset;
use crate::error::AppError;
use nalgebra::DMatrix;

/// Generator settings (from CLI flags).
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub n_units: usize,
    pub dim: usize,
    /// Homogeneous treatment effect (the true ATE).
    pub effect: f64,
    /// Scale of the covariate coefficients in the propensity.
    pub confounding: f64,
    /// Outcome noise standard deviation.
    pub noise: f64,
    pub seed: u64,
}

/// A generated sample plus its ground truth.
#[derive(Debug, Clone)]
pub struct SampleData {
    pub dataset: Dataset,
    pub true_ate: f64,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.n_units == 0 {
        return Err(AppError::invalid_config("Sample count must be > 0."));
    }
    if config.dim == 0 {
        return Err(AppError::invalid_config("Covariate dimension must be > 0."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::invalid_config("Noise sd must be finite and >= 0."));
    }
    if !(config.effect.is_finite() && config.confounding.is_finite()) {
        return Err(AppError::invalid_config(
            "Effect and confounding must be finite.",
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::numeric(format!("Noise distribution error: {e}")))?;

    // Fixed coefficient patterns: alternating signs for the propensity,
    // decaying magnitudes for the outcome.
    let w_prop: Vec<f64> = (0..config.dim)
        .map(|j| config.confounding * if j % 2 == 0 { 1.0 } else { -1.0 })
        .collect();
    let w_out: Vec<f64> = (0..config.dim).map(|j| 1.0 / (j + 1) as f64).collect();

    let n = config.n_units;
    let p = config.dim;
    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut treatment = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for i in 0..n {
        let mut eta = 0.0;
        let mut signal = 0.0;
        for j in 0..p {
            let v = normal.sample(&mut rng);
            x[(i, j)] = v;
            eta += w_prop[j] * v;
            signal += w_out[j] * v;
        }
        let e = 1.0 / (1.0 + (-eta).exp());
        let t = if rng.gen_range(0.0..1.0) < e { 1.0 } else { 0.0 };
        let noise = config.noise * normal.sample(&mut rng);
        treatment.push(t);
        y.push(config.effect * t + signal + noise);
    }

    Ok(SampleData {
        dataset: Dataset { y, treatment, x },
        true_ate: config.effect,
    })
}
