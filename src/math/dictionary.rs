//! Treatment-interacted polynomial dictionary.
//!
//! Stage 1 works in the span of a fixed dictionary `b(t, x)`:
//!
//! ```text
//! g(x) = [1, x_1..x_p]                     (linear)
//! g(x) = [1, x_1..x_p, x_1^2..x_p^2]       (quadratic)
//! b(t, x) = [g(x), t * g(x)]
//! ```
//!
//! Interacting every base feature with the treatment indicator lets both the
//! outcome regression and the Riesz representer vary freely across arms.
//! The ATE moment only touches the interacted block:
//!
//! `b(1, x) - b(0, x) = [0, g(x)]`

use crate::domain::BasisDegree;

/// A fixed dictionary: polynomial degree plus covariate dimension.
#[derive(Debug, Clone, Copy)]
pub struct Dictionary {
    degree: BasisDegree,
    dim: usize,
}

impl Dictionary {
    pub fn new(degree: BasisDegree, dim: usize) -> Self {
        Self { degree, dim }
    }

    /// Number of base features `g(x)`.
    pub fn base_len(&self) -> usize {
        match self.degree {
            BasisDegree::Linear => 1 + self.dim,
            BasisDegree::Quadratic => 1 + 2 * self.dim,
        }
    }

    /// Total dictionary width (base block plus interacted block).
    pub fn width(&self) -> usize {
        2 * self.base_len()
    }

    /// Fill `out` with the base features `g(x)` alone.
    ///
    /// The propensity design uses this block directly: the propensity is a
    /// function of the covariates only, never of the treatment.
    pub fn fill_base(&self, x: &[f64], out: &mut [f64]) {
        out[0] = 1.0;
        for (j, &v) in x.iter().enumerate() {
            out[1 + j] = v;
        }
        if self.degree == BasisDegree::Quadratic {
            for (j, &v) in x.iter().enumerate() {
                out[1 + self.dim + j] = v * v;
            }
        }
    }

    /// Fill `out` with `b(t, x)`.
    ///
    /// # Panics
    /// Panics if `x.len() != dim` or `out.len() != self.width()`. Callers size
    /// these buffers from the same `Dictionary`.
    pub fn fill_row(&self, t: f64, x: &[f64], out: &mut [f64]) {
        assert_eq!(x.len(), self.dim);
        assert_eq!(out.len(), self.width());
        let k = self.base_len();
        let (base, interact) = out.split_at_mut(k);
        self.fill_base(x, base);
        for j in 0..k {
            interact[j] = t * base[j];
        }
    }

    /// Fill `out` with the ATE moment row `b(1, x) - b(0, x)`.
    pub fn fill_moment_row(&self, x: &[f64], out: &mut [f64]) {
        assert_eq!(out.len(), self.width());
        let k = self.base_len();
        let (base, interact) = out.split_at_mut(k);
        for v in base.iter_mut() {
            *v = 0.0;
        }
        self.fill_base(x, interact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_widths_by_degree() {
        let lin = Dictionary::new(BasisDegree::Linear, 3);
        assert_eq!(lin.width(), 8);
        let quad = Dictionary::new(BasisDegree::Quadratic, 3);
        assert_eq!(quad.width(), 14);
    }

    #[test]
    fn moment_row_is_arm_difference() {
        let dict = Dictionary::new(BasisDegree::Quadratic, 2);
        let x = [0.5, -1.5];
        let mut b1 = vec![0.0; dict.width()];
        let mut b0 = vec![0.0; dict.width()];
        let mut m = vec![0.0; dict.width()];
        dict.fill_row(1.0, &x, &mut b1);
        dict.fill_row(0.0, &x, &mut b0);
        dict.fill_moment_row(&x, &mut m);
        for j in 0..dict.width() {
            assert!((m[j] - (b1[j] - b0[j])).abs() < 1e-15);
        }
    }

    #[test]
    fn interacted_block_vanishes_for_control() {
        let dict = Dictionary::new(BasisDegree::Linear, 2);
        let mut row = vec![0.0; dict.width()];
        dict.fill_row(0.0, &[2.0, 3.0], &mut row);
        assert_eq!(&row[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&row[3..], &[0.0, 0.0, 0.0]);
    }
}
