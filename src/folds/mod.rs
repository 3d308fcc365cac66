//! Random fold partitioning for cross-fitting.
//!
//! The partition is a uniformly random permutation of `0..n` cut into L
//! near-equal contiguous blocks. The first `n % L` folds receive the extra
//! unit, so fold sizes differ by at most one.
//!
//! The assignment is generated once per run and treated as read-only
//! afterwards (the parallel driver only ever reads it).

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::AppError;

/// Partition `0..n` into `l` disjoint folds.
///
/// Fails with a configuration error when `l < 1` or `l > n`.
pub fn make_folds(n: usize, l: usize, rng: &mut StdRng) -> Result<Vec<Vec<usize>>, AppError> {
    if l < 1 || l > n {
        return Err(AppError::invalid_config(format!(
            "Fold count must satisfy 1 <= L <= n (got L={l}, n={n})."
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let base = n / l;
    let extra = n % l;

    let mut folds = Vec::with_capacity(l);
    let mut start = 0;
    for k in 0..l {
        let size = base + usize::from(k < extra);
        folds.push(order[start..start + size].to_vec());
        start += size;
    }
    Ok(folds)
}

/// All indices of `0..n` not in `fold` (the training complement).
pub fn complement(n: usize, fold: &[usize]) -> Vec<usize> {
    let mut in_fold = vec![false; n];
    for &i in fold {
        in_fold[i] = true;
    }
    (0..n).filter(|&i| !in_fold[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn folds_partition_exactly() {
        for &(n, l) in &[(10usize, 5usize), (11, 5), (7, 7), (23, 4), (1, 1)] {
            let mut rng = StdRng::seed_from_u64(7);
            let folds = make_folds(n, l, &mut rng).unwrap();
            assert_eq!(folds.len(), l);

            let mut seen = vec![0usize; n];
            for fold in &folds {
                for &i in fold {
                    seen[i] += 1;
                }
            }
            assert!(seen.iter().all(|&c| c == 1), "n={n} l={l}: not a partition");

            let sizes: Vec<usize> = folds.iter().map(|f| f.len()).collect();
            let max = sizes.iter().max().unwrap();
            let min = sizes.iter().min().unwrap();
            assert!(max - min <= 1, "n={n} l={l}: sizes {sizes:?}");
        }
    }

    #[test]
    fn fold_count_out_of_range_is_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(make_folds(5, 0, &mut rng).unwrap_err().exit_code(), 2);
        assert_eq!(make_folds(5, 6, &mut rng).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn same_seed_same_partition() {
        let a = make_folds(20, 4, &mut StdRng::seed_from_u64(99)).unwrap();
        let b = make_folds(20, 4, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn complement_is_disjoint_and_covering() {
        let mut rng = StdRng::seed_from_u64(3);
        let folds = make_folds(12, 3, &mut rng).unwrap();
        for fold in &folds {
            let comp = complement(12, fold);
            assert_eq!(comp.len() + fold.len(), 12);
            for &i in &comp {
                assert!(!fold.contains(&i));
            }
        }
    }
}
