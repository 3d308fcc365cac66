//! Per-unit scoring of a held-out fold.
//!
//! Both scorers return **un-centered** scores; the aggregator subtracts the
//! overall mean once, at the end. Mode selection is a two-variant trait
//! dispatch — the driver never branches on a boolean.

use crate::domain::{Dataset, ScoreMode};
use crate::error::AppError;
use crate::nuisance::NuisancePair;

/// Reserved auxiliary model handle.
///
/// The upstream scoring interface carries a slot for a previously fitted
/// model; its role is unclarified, so neither scorer consults it today. It is
/// threaded explicitly (never a free variable) so callers that do have one
/// can pass it without an interface change.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuxModel;

/// Evaluates one score per unit of the held-out fold.
///
/// `Sync` so the driver can dispatch folds across the rayon pool.
pub trait Scorer: Sync {
    fn score(
        &self,
        fold: &Dataset,
        aux: Option<&AuxModel>,
        nuisances: &NuisancePair,
    ) -> Result<Vec<f64>, AppError>;
}

/// Plug-in score: `gamma(1, x) - gamma(0, x)`.
///
/// No orthogonalizing correction; kept for bias diagnostics against the
/// debiased estimate.
#[derive(Debug, Clone, Copy)]
pub struct PluginScorer;

impl Scorer for PluginScorer {
    fn score(
        &self,
        fold: &Dataset,
        aux: Option<&AuxModel>,
        nuisances: &NuisancePair,
    ) -> Result<Vec<f64>, AppError> {
        let _ = aux;
        let mut out = Vec::with_capacity(fold.n());
        let mut xbuf = vec![0.0; fold.dim()];
        for i in 0..fold.n() {
            crate::nuisance::copy_x_row(fold, i, &mut xbuf);
            let psi = nuisances.gamma.predict(1.0, &xbuf) - nuisances.gamma.predict(0.0, &xbuf);
            if !psi.is_finite() {
                return Err(AppError::numeric(format!(
                    "Non-finite plug-in score for unit {i}."
                )));
            }
            out.push(psi);
        }
        Ok(out)
    }
}

/// Neyman-orthogonal score:
/// `gamma(1, x) - gamma(0, x) + alpha(t, x) * (y - gamma(t, x))`.
#[derive(Debug, Clone, Copy)]
pub struct DmlScorer;

impl Scorer for DmlScorer {
    fn score(
        &self,
        fold: &Dataset,
        aux: Option<&AuxModel>,
        nuisances: &NuisancePair,
    ) -> Result<Vec<f64>, AppError> {
        let _ = aux;
        let mut out = Vec::with_capacity(fold.n());
        let mut xbuf = vec![0.0; fold.dim()];
        for i in 0..fold.n() {
            crate::nuisance::copy_x_row(fold, i, &mut xbuf);
            let t = fold.treatment[i];
            let plug =
                nuisances.gamma.predict(1.0, &xbuf) - nuisances.gamma.predict(0.0, &xbuf);
            let resid = fold.y[i] - nuisances.gamma.predict(t, &xbuf);
            let psi = plug + nuisances.alpha.evaluate(t, &xbuf) * resid;
            if !psi.is_finite() {
                return Err(AppError::numeric(format!(
                    "Non-finite debiased score for unit {i}."
                )));
            }
            out.push(psi);
        }
        Ok(out)
    }
}

/// Map a scoring mode to its scorer.
pub fn scorer_for(mode: ScoreMode) -> &'static dyn Scorer {
    match mode {
        ScoreMode::Plugin => &PluginScorer,
        ScoreMode::Dml => &DmlScorer,
    }
}
