//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads or generates the unit-level data
//! - runs fold partitioning, cross-fitting and aggregation
//! - prints the report
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, CommonArgs, EstimateArgs, SimulateArgs};
use crate::domain::{Dataset, EstimateConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `ate` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Estimate(args) => handle_estimate(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = estimate_config_from_args(&args.common);
    let ingest = crate::io::load_csv(&args.data)?;

    for err in &ingest.row_errors {
        eprintln!("skipped line {}: {}", err.line, err.message);
    }

    run_and_report(&ingest.dataset, &config, None)
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = estimate_config_from_args(&args.common);
    let sample = crate::data::generate_sample(&crate::data::SampleConfig {
        n_units: args.n_units,
        dim: args.dim,
        effect: args.effect,
        confounding: args.confounding,
        noise: args.noise,
        seed: args.common.seed,
    })?;

    run_and_report(&sample.dataset, &config, Some(sample.true_ate))
}

fn run_and_report(
    data: &Dataset,
    config: &EstimateConfig,
    true_ate: Option<f64>,
) -> Result<(), AppError> {
    let run = pipeline::run_estimate(data, config)?;

    match config.render {
        crate::domain::RenderMode::Text => {
            print!(
                "{}",
                crate::report::format_run_summary(&run.stats, config, &run.record)
            );
            if let Some(truth) = true_ate {
                println!("True ATE: {truth:.2}");
            }
        }
        crate::domain::RenderMode::Tex => {
            println!("{}", crate::report::format_tex_row(&run.record));
        }
    }

    if config.histogram {
        println!();
        print!(
            "{}",
            crate::report::format_influence_histogram(&run.summary.influence, 15, 40)
        );
    }

    // Optional exports.
    if let Some(path) = &config.export_scores {
        crate::io::write_scores_csv(path, &run.folds, &run.scores, &run.summary.influence)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_estimate_json(path, &run.record, config, run.stats.n_units)?;
    }

    Ok(())
}

pub fn estimate_config_from_args(args: &CommonArgs) -> EstimateConfig {
    EstimateConfig {
        folds: args.folds,
        mode: args.mode,
        alpha_mode: args.alpha,
        gamma_mode: args.gamma,
        degree: args.degree,
        reg_alpha: args.reg_alpha,
        reg_gamma: args.reg_gamma,
        prop_clip: args.prop_clip,
        weight_floor: args.weight_floor,
        gram_jitter: args.gram_jitter,
        max_iters: args.max_iters,
        seed: args.seed,
        parallel: args.parallel,
        progress: args.progress,
        render: args.format,
        histogram: args.histogram,
        export_scores: args.export_scores.clone(),
        export_json: args.export_json.clone(),
    }
}
