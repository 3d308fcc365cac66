//! `ate-dml` library crate.
//!
//! The binary (`ate`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., notebooks, services, simulation studies)
//! - code stays easy to navigate as the project grows

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod crossfit;
pub mod data;
pub mod domain;
pub mod error;
pub mod folds;
pub mod io;
pub mod math;
pub mod nuisance;
pub mod report;
pub mod score;
