//! Reporting: the output record and its renderings.

use crate::aggregate::EstimateSummary;
use crate::domain::EstimateRecord;

pub mod format;

pub use format::*;

/// Package treated/untreated counts and the aggregated estimate into the
/// final record.
///
/// Counts are taken over the full original sample, not any fold.
pub fn build_record(treatment: &[f64], summary: &EstimateSummary) -> EstimateRecord {
    let treated_count = treatment.iter().filter(|&&t| t == 1.0).count();
    EstimateRecord {
        treated_count,
        untreated_count: treatment.len() - treated_count,
        ate: summary.ate,
        se: summary.se,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(ate: f64, se: f64) -> EstimateSummary {
        EstimateSummary {
            n: 4,
            ate,
            variance: se * se * 4.0,
            se,
            influence: vec![0.0; 4],
        }
    }

    #[test]
    fn counts_conserve_total() {
        let treatment = [1.0, 0.0, 1.0, 0.0, 0.0];
        let record = build_record(&treatment, &summary(1.0, 0.1));
        assert_eq!(record.treated_count + record.untreated_count, treatment.len());
        assert_eq!(record.treated_count, 2);
    }

    #[test]
    fn record_carries_estimate_unchanged() {
        let record = build_record(&[1.0, 0.0], &summary(2.5, 0.75));
        assert_eq!(record.ate, 2.5);
        assert_eq!(record.se, 0.75);
    }
}
