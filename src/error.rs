//! Application error type shared by every fallible path.
//!
//! Exit-code conventions:
//!
//! - `2` — invalid configuration (bad flags, bad schema, fold count out of range)
//! - `3` — degenerate sample (empty data, single treatment class, empty scores)
//! - `4` — nuisance fit / numeric failure (singular Gram, IRLS divergence, NaN)
//!
//! There is no local recovery anywhere in the estimator: any failure aborts
//! the whole run and the message names the originating stage (and fold, where
//! one is involved).

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Invalid configuration (exit 2). Detected eagerly, before any fold work.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Degenerate sample (exit 3).
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Nuisance fit or numeric failure (exit 4).
    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Prefix the message with the fold it originated from.
    pub fn in_fold(self, fold: usize) -> Self {
        Self {
            exit_code: self.exit_code,
            message: format!("fold {fold}: {}", self.message),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
