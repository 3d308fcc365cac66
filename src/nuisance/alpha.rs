//! Riesz representer (`alpha`) estimation.
//!
//! Two estimators, selected by `AlphaMode`:
//!
//! - **Minimax**: the representer is constrained to the dictionary span,
//!   `alpha(t, x) = b(t, x)' rho`. Minimizing the population objective
//!   `E[alpha^2 - 2 m(W; alpha)]` over that span has the closed form
//!
//!   ```text
//!   (G + reg * I) rho = q,   G = mean(b b'),   q = mean(b(1,x) - b(0,x))
//!   ```
//!
//!   No propensity model is ever inverted, which keeps the fit stable when
//!   overlap is thin.
//!
//! - **Propensity**: classic inverse-propensity weights. The propensity is a
//!   ridge-penalized logistic fit on the base features (IRLS), clipped to
//!   `[clip, 1 - clip]` before inversion.

use nalgebra::{DMatrix, DVector};

use crate::domain::Dataset;
use crate::error::AppError;
use crate::math::{solve_regularized, Dictionary};
use crate::nuisance::copy_x_row;

/// IRLS stops when the largest coefficient update falls below this.
const IRLS_TOL: f64 = 1e-8;

/// A fitted Riesz representer, evaluable on held-out units.
#[derive(Debug, Clone)]
pub enum FittedAlpha {
    Dictionary {
        dict: Dictionary,
        rho: DVector<f64>,
    },
    Propensity {
        dict: Dictionary,
        beta: DVector<f64>,
        clip: f64,
    },
}

impl FittedAlpha {
    /// Evaluate `alpha(t, x)`.
    pub fn evaluate(&self, t: f64, x: &[f64]) -> f64 {
        match self {
            FittedAlpha::Dictionary { dict, rho } => {
                let mut row = vec![0.0; dict.width()];
                dict.fill_row(t, x, &mut row);
                row.iter().zip(rho.iter()).map(|(b, r)| b * r).sum()
            }
            FittedAlpha::Propensity { dict, beta, clip } => {
                let mut base = vec![0.0; dict.base_len()];
                dict.fill_base(x, &mut base);
                let eta: f64 = base.iter().zip(beta.iter()).map(|(b, c)| b * c).sum();
                let e = sigmoid(eta).clamp(*clip, 1.0 - *clip);
                t / e - (1.0 - t) / (1.0 - e)
            }
        }
    }
}

/// Closed-form minimax fit over the dictionary span.
pub fn fit_minimax(
    dict: &Dictionary,
    train: &Dataset,
    reg: f64,
    jitter: f64,
) -> Result<FittedAlpha, AppError> {
    let b = crate::nuisance::design_matrix(dict, train);
    let scale = 1.0 / train.n() as f64;
    let gram = b.transpose() * &b * scale;
    let q = crate::nuisance::moment_mean(dict, train);
    let rho = solve_regularized(&gram, &q, reg, jitter)
        .map_err(|e| AppError::numeric(format!("Minimax alpha fit failed: {e}")))?;
    Ok(FittedAlpha::Dictionary { dict: *dict, rho })
}

/// Ridge-penalized logistic propensity fit via IRLS, then clipped inversion.
pub fn fit_propensity(
    dict: &Dictionary,
    train: &Dataset,
    reg: f64,
    clip: f64,
    weight_floor: f64,
    jitter: f64,
    max_iters: usize,
) -> Result<FittedAlpha, AppError> {
    let n = train.n();
    let k = dict.base_len();

    // Base-feature design (propensity depends on x only).
    let mut design = DMatrix::<f64>::zeros(n, k);
    let mut xbuf = vec![0.0; train.dim()];
    let mut base = vec![0.0; k];
    for i in 0..n {
        copy_x_row(train, i, &mut xbuf);
        dict.fill_base(&xbuf, &mut base);
        for j in 0..k {
            design[(i, j)] = base[j];
        }
    }

    let mut beta = DVector::<f64>::zeros(k);
    let mut converged = false;

    for _ in 0..max_iters {
        let eta = &design * &beta;

        // Weighted Gram and working response for the Newton step. The weight
        // floor keeps the step bounded when fitted probabilities saturate.
        let mut gram = DMatrix::<f64>::zeros(k, k);
        let mut rhs = DVector::<f64>::zeros(k);
        for i in 0..n {
            let p = sigmoid(eta[i]);
            let w = (p * (1.0 - p)).max(weight_floor);
            let z = eta[i] + (train.treatment[i] - p) / w;
            for a in 0..k {
                let da = design[(i, a)];
                rhs[a] += w * da * z;
                for c in 0..k {
                    gram[(a, c)] += w * da * design[(i, c)];
                }
            }
        }
        let scale = 1.0 / n as f64;
        gram *= scale;
        rhs *= scale;

        let next = solve_regularized(&gram, &rhs, reg, jitter)
            .map_err(|e| AppError::numeric(format!("Propensity IRLS step failed: {e}")))?;

        let delta = (&next - &beta).amax();
        beta = next;
        if delta < IRLS_TOL {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(AppError::numeric(format!(
            "Propensity IRLS did not converge in {max_iters} iterations."
        )));
    }

    Ok(FittedAlpha::Propensity {
        dict: *dict,
        beta,
        clip,
    })
}

fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}
