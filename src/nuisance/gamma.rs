//! Outcome regression (`gamma`) estimation.

use nalgebra::DVector;

use crate::domain::Dataset;
use crate::error::AppError;
use crate::math::{ridge_solve, Dictionary};

/// A fitted outcome regression, evaluable on held-out units at either arm.
#[derive(Debug, Clone)]
pub enum FittedGamma {
    Ridge {
        dict: Dictionary,
        beta: DVector<f64>,
    },
    /// Per-arm means. `mean1` for treated, `mean0` for control.
    ArmMeans { mean1: f64, mean0: f64 },
}

impl FittedGamma {
    /// Predict `gamma(t, x)`.
    pub fn predict(&self, t: f64, x: &[f64]) -> f64 {
        match self {
            FittedGamma::Ridge { dict, beta } => {
                let mut row = vec![0.0; dict.width()];
                dict.fill_row(t, x, &mut row);
                row.iter().zip(beta.iter()).map(|(b, c)| b * c).sum()
            }
            FittedGamma::ArmMeans { mean1, mean0 } => {
                if t == 1.0 { *mean1 } else { *mean0 }
            }
        }
    }
}

/// Ridge regression of the outcome on the treatment-interacted dictionary.
pub fn fit_ridge(
    dict: &Dictionary,
    train: &Dataset,
    reg: f64,
    jitter: f64,
) -> Result<FittedGamma, AppError> {
    let b = crate::nuisance::design_matrix(dict, train);
    let y = DVector::from_column_slice(&train.y);
    let beta = ridge_solve(&b, &y, reg, jitter)
        .map_err(|e| AppError::numeric(format!("Outcome regression failed: {e}")))?;
    Ok(FittedGamma::Ridge { dict: *dict, beta })
}

/// Per-arm outcome means.
///
/// The caller guarantees both arms are present in the training set.
pub fn fit_arm_means(train: &Dataset) -> Result<FittedGamma, AppError> {
    let mut sum1 = 0.0;
    let mut n1 = 0usize;
    let mut sum0 = 0.0;
    let mut n0 = 0usize;
    for (yi, &ti) in train.y.iter().zip(train.treatment.iter()) {
        if ti == 1.0 {
            sum1 += yi;
            n1 += 1;
        } else {
            sum0 += yi;
            n0 += 1;
        }
    }
    if n1 == 0 || n0 == 0 {
        return Err(AppError::numeric(
            "Arm-means outcome model requires both treatment classes.",
        ));
    }
    Ok(FittedGamma::ArmMeans {
        mean1: sum1 / n1 as f64,
        mean0: sum0 / n0 as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BasisDegree;
    use nalgebra::DMatrix;

    #[test]
    fn ridge_gamma_fits_exact_interacted_model() {
        // y = 1 + 0.5x + t * (2 + x); the dictionary spans this exactly.
        let n = 20;
        let mut y = Vec::with_capacity(n);
        let mut t = Vec::with_capacity(n);
        let mut x = DMatrix::<f64>::zeros(n, 1);
        for i in 0..n {
            let ti = (i % 2) as f64;
            let xi = i as f64 / n as f64;
            x[(i, 0)] = xi;
            t.push(ti);
            y.push(1.0 + 0.5 * xi + ti * (2.0 + xi));
        }
        let data = Dataset { y, treatment: t, x };
        let dict = Dictionary::new(BasisDegree::Linear, 1);
        let gamma = fit_ridge(&dict, &data, 0.0, 1e-10).unwrap();

        let g1 = gamma.predict(1.0, &[0.25]);
        let g0 = gamma.predict(0.0, &[0.25]);
        assert!((g1 - (1.0 + 0.125 + 2.0 + 0.25)).abs() < 1e-6);
        assert!((g0 - 1.125).abs() < 1e-6);
    }

    #[test]
    fn arm_means_split_by_treatment() {
        let data = Dataset {
            y: vec![10.0, 0.0, 20.0, 2.0],
            treatment: vec![1.0, 0.0, 1.0, 0.0],
            x: DMatrix::<f64>::zeros(4, 0),
        };
        let gamma = fit_arm_means(&data).unwrap();
        assert!((gamma.predict(1.0, &[]) - 15.0).abs() < 1e-12);
        assert!((gamma.predict(0.0, &[]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn arm_means_reject_single_class() {
        let data = Dataset {
            y: vec![1.0, 2.0],
            treatment: vec![1.0, 1.0],
            x: DMatrix::<f64>::zeros(2, 0),
        };
        assert!(fit_arm_means(&data).is_err());
    }
}
