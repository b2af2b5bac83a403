//! Errors produced while working with core primitive types.

use thiserror::Error;

/// Errors surfaced by [`crate::Transaction`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Signature recovery failed: malformed `(v, r, s)` or a point not on the curve.
    #[error("invalid transaction signature")]
    InvalidSignature,
}
