//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{DatasetStats, EstimateConfig, EstimateRecord, RenderMode};

/// Render the record in the requested mode.
pub fn format_record(record: &EstimateRecord, mode: RenderMode) -> String {
    match mode {
        RenderMode::Text => format_text(record),
        RenderMode::Tex => format_tex_row(record),
    }
}

/// Human-readable single line, ate/se rounded to 2 decimals.
pub fn format_text(record: &EstimateRecord) -> String {
    format!(
        "treated: {} | untreated: {} | ATE: {:.2} | SE: {:.2}",
        record.treated_count, record.untreated_count, record.ate, record.se
    )
}

/// Ampersand-delimited table row for typeset output, same rounding.
pub fn format_tex_row(record: &EstimateRecord) -> String {
    format!(
        "{} & {} & {:.2} & {:.2} \\\\",
        record.treated_count, record.untreated_count, record.ate, record.se
    )
}

/// Full run summary (dataset stats + configuration + estimate).
pub fn format_run_summary(
    stats: &DatasetStats,
    config: &EstimateConfig,
    record: &EstimateRecord,
) -> String {
    let mut out = String::new();

    out.push_str("=== ate - cross-fitted DML estimate ===\n");
    out.push_str(&format!(
        "Sample: n={} | treated={} | untreated={} | p={}\n",
        stats.n_units, stats.n_treated, stats.n_untreated, stats.dim
    ));
    out.push_str(&format!(
        "Outcome range: [{:.3}, {:.3}]\n",
        stats.y_min, stats.y_max
    ));
    out.push_str(&format!(
        "Cross-fit: L={} | mode={:?} | alpha={:?} | gamma={:?} | degree={:?} | seed={}\n",
        config.folds, config.mode, config.alpha_mode, config.gamma_mode, config.degree, config.seed
    ));
    out.push('\n');
    out.push_str(&format_text(record));
    out.push('\n');

    out
}

/// Compact ASCII histogram of the influence values.
///
/// Diagnostics only; heavy tails here usually mean thin overlap.
pub fn format_influence_histogram(influence: &[f64], bins: usize, width: usize) -> String {
    let bins = bins.max(1);
    let width = width.max(1);

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in influence {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if influence.is_empty() || !lo.is_finite() || !hi.is_finite() {
        return String::from("(no influence values)\n");
    }
    if hi - lo < 1e-12 {
        return format!("(all influence values ~ {lo:.4})\n");
    }

    let step = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in influence {
        let k = (((v - lo) / step) as usize).min(bins - 1);
        counts[k] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(1).max(1);

    let mut out = String::from("Influence distribution:\n");
    for (k, &c) in counts.iter().enumerate() {
        let left = lo + step * k as f64;
        let bar_len = (c * width).div_ceil(max_count);
        let bar = "#".repeat(bar_len);
        out.push_str(&format!("{left:>10.3} | {bar:<w$} {c}\n", w = width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EstimateRecord {
        EstimateRecord {
            treated_count: 5,
            untreated_count: 5,
            ate: 1.23456,
            se: 0.98765,
        }
    }

    #[test]
    fn text_line_rounds_to_two_decimals() {
        let s = format_text(&record());
        assert_eq!(s, "treated: 5 | untreated: 5 | ATE: 1.23 | SE: 0.99");
    }

    #[test]
    fn tex_row_is_ampersand_delimited() {
        let s = format_tex_row(&record());
        assert_eq!(s, "5 & 5 & 1.23 & 0.99 \\\\");
    }

    #[test]
    fn histogram_handles_constant_influence() {
        let s = format_influence_histogram(&[0.0, 0.0, 0.0], 10, 30);
        assert!(s.contains("all influence values"));
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let influence = [-1.0, -0.5, 0.0, 0.5, 1.0];
        let s = format_influence_histogram(&influence, 5, 20);
        let total: usize = s
            .lines()
            .skip(1)
            .filter_map(|l| l.rsplit(' ').next()?.parse::<usize>().ok())
            .sum();
        assert_eq!(total, influence.len());
    }
}
