//! Data sources.
//!
//! Only synthetic generation lives here; CSV ingest is under `io`.

pub mod sample;

pub use sample::*;
