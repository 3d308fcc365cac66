//! Mathematical utilities: the treatment-interacted dictionary and
//! regularized linear solvers.

pub mod dictionary;
pub mod ridge;

pub use dictionary::*;
pub use ridge::*;
