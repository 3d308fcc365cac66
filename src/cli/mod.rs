//! Command-line parsing for the cross-fitted ATE estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the estimation/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{AlphaMode, BasisDegree, GammaMode, RenderMode, ScoreMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "ate",
    version,
    about = "Cross-fitted doubly-robust ATE estimator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate the ATE from a unit-level CSV file.
    Estimate(EstimateArgs),
    /// Generate a synthetic confounded sample with a known ATE and estimate it.
    ///
    /// This runs the same pipeline as `ate estimate`, then prints the ground
    /// truth next to the estimate so recovery is visible at a glance.
    Simulate(SimulateArgs),
}

/// Options shared by every estimation run.
#[derive(Debug, Parser, Clone)]
pub struct CommonArgs {
    /// Number of cross-fitting folds (L >= 2).
    #[arg(short = 'l', long, default_value_t = 5)]
    pub folds: usize,

    /// Scoring mode: plug-in or debiased.
    #[arg(long, value_enum, default_value_t = ScoreMode::Dml)]
    pub mode: ScoreMode,

    /// Stage-1 alpha estimator.
    #[arg(long, value_enum, default_value_t = AlphaMode::Minimax)]
    pub alpha: AlphaMode,

    /// Stage-1 gamma estimator.
    #[arg(long, value_enum, default_value_t = GammaMode::Ridge)]
    pub gamma: GammaMode,

    /// Dictionary degree for stage 1.
    #[arg(long, value_enum, default_value_t = BasisDegree::Linear)]
    pub degree: BasisDegree,

    /// Ridge weight for the alpha fit.
    #[arg(long, default_value_t = 1e-3)]
    pub reg_alpha: f64,

    /// Ridge weight for the gamma fit.
    #[arg(long, default_value_t = 1e-3)]
    pub reg_gamma: f64,

    /// Propensity clipping threshold (propensity alpha mode only).
    #[arg(long, default_value_t = 0.01)]
    pub prop_clip: f64,

    /// Lower bound on IRLS working weights.
    #[arg(long, default_value_t = 1e-6)]
    pub weight_floor: f64,

    /// Additive diagonal adjustment for failed Gram factorizations.
    #[arg(long, default_value_t = 1e-8)]
    pub gram_jitter: f64,

    /// Max IRLS iterations for the propensity fit.
    #[arg(long, default_value_t = 100)]
    pub max_iters: usize,

    /// Random seed for the fold assignment.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Dispatch folds across a thread pool.
    #[arg(long)]
    pub parallel: bool,

    /// Print per-fold progress to stderr.
    #[arg(long)]
    pub progress: bool,

    /// Output rendering for the estimate record.
    #[arg(long, value_enum, default_value_t = RenderMode::Text)]
    pub format: RenderMode,

    /// Append an ASCII histogram of influence values.
    #[arg(long)]
    pub histogram: bool,

    /// Write per-unit scores/influence to this CSV path.
    #[arg(long)]
    pub export_scores: Option<PathBuf>,

    /// Write the estimate record (plus run metadata) to this JSON path.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

/// `ate estimate` options.
#[derive(Debug, Parser, Clone)]
pub struct EstimateArgs {
    /// Input CSV: `outcome`, `treatment`, and `x*` covariate columns.
    #[arg(short = 'd', long)]
    pub data: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// `ate simulate` options.
#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Number of synthetic units.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub n_units: usize,

    /// Covariate dimension.
    #[arg(short = 'p', long, default_value_t = 5)]
    pub dim: usize,

    /// True (homogeneous) treatment effect.
    #[arg(long, default_value_t = 2.0)]
    pub effect: f64,

    /// Confounding strength in the propensity.
    #[arg(long, default_value_t = 0.5)]
    pub confounding: f64,

    /// Outcome noise standard deviation.
    #[arg(long, default_value_t = 1.0)]
    pub noise: f64,

    #[command(flatten)]
    pub common: CommonArgs,
}
