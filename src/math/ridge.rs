//! Regularized symmetric solves.
//!
//! Stage 1 repeatedly solves small systems of the form
//!
//! ```text
//! (G + reg * I) beta = rhs
//! ```
//!
//! where `G` is a Gram matrix (symmetric positive semi-definite). We factor
//! with Cholesky and, if the factorization fails (collinear dictionary
//! columns, reg = 0), retry with an escalating additive diagonal adjustment
//! before giving up.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;

/// Number of jitter escalations before the solve is declared failed.
const JITTER_RETRIES: usize = 3;

/// Solve `(gram + reg * I) beta = rhs` via Cholesky with jitter fallback.
pub fn solve_regularized(
    gram: &DMatrix<f64>,
    rhs: &DVector<f64>,
    reg: f64,
    jitter: f64,
) -> Result<DVector<f64>, AppError> {
    let d = gram.nrows();
    if gram.ncols() != d || rhs.len() != d {
        return Err(AppError::numeric(format!(
            "Gram/rhs shape mismatch: {}x{} vs {}.",
            gram.nrows(),
            gram.ncols(),
            rhs.len()
        )));
    }

    let mut extra = 0.0;
    for _ in 0..=JITTER_RETRIES {
        let mut a = gram.clone();
        for i in 0..d {
            a[(i, i)] += reg + extra;
        }
        if let Some(chol) = a.cholesky() {
            let beta = chol.solve(rhs);
            if beta.iter().all(|v| v.is_finite()) {
                return Ok(beta);
            }
        }
        extra = if extra == 0.0 { jitter } else { extra * 10.0 };
    }

    Err(AppError::numeric(
        "Gram matrix not positive definite even after jitter.",
    ))
}

/// Ridge regression: minimize `mean((y - X beta)^2) + reg * |beta|^2`.
///
/// Normal equations with the Gram scaled by `1/n`, so `reg` is comparable
/// across sample sizes.
pub fn ridge_solve(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    reg: f64,
    jitter: f64,
) -> Result<DVector<f64>, AppError> {
    let n = x.nrows();
    if n == 0 {
        return Err(AppError::degenerate("Ridge regression on empty design."));
    }
    if y.len() != n {
        return Err(AppError::numeric(format!(
            "Design/response length mismatch: {n} vs {}.",
            y.len()
        )));
    }
    let scale = 1.0 / n as f64;
    let gram = x.transpose() * x * scale;
    let rhs = x.transpose() * y * scale;
    solve_regularized(&gram, &rhs, reg, jitter)
}
