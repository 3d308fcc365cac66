//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - per-unit score exports and estimate JSON (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
