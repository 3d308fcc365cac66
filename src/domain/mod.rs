//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration enums (`ScoreMode`, `AlphaMode`, `GammaMode`, ...)
//! - the in-memory observation table (`Dataset`)
//! - the final output record (`EstimateRecord`)

pub mod types;

pub use types::*;
