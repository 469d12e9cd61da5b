//! Error types for foundry-optimization

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or solving a planning problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid input data (schema violations, unknown references, bad bounds)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An underlying kernel (max-flow or LP) failed
    #[error("solver error: {0}")]
    Solver(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a solver error
    pub fn solver(msg: impl Into<String>) -> Self {
        Self::Solver(msg.into())
    }
}
