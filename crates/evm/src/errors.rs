//! Errors surfaced by the EVM oracle and its `revm`-backed implementation.

use thiserror::Error;

/// Errors raised while running the EVM oracle.
#[derive(Debug, Error)]
pub enum EvmError {
    /// The underlying account store reported an error while the interpreter read or wrote
    /// state through the staging repository.
    #[error("state error: {0}")]
    State(#[from] ethrs_state::StateError),
    /// `revm` itself reported a database or validation error.
    #[error("revm error: {0}")]
    Revm(String),
}
