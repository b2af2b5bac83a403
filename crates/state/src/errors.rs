//! Errors produced by the account store and staging repository.

use alloy_primitives::Address;
use thiserror::Error;

/// Errors surfaced by [`crate::AccountStore`] and [`crate::StagingRepository`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A stored account value exists at this key but could not be RLP-decoded.
    #[error("account at {0} exists but could not be decoded")]
    NotFound(Address),
    /// `add_wei` would have driven an account's balance negative.
    #[error("balance underflow for {0}")]
    BalanceUnderflow(Address),
    /// A transfer was attempted with a negative value.
    #[error("negative transfer value")]
    NegativeTransfer,
    /// A transfer's sender account does not exist.
    #[error("transfer sender {0} does not exist")]
    MissingSender(Address),
    /// A transfer's sender lacks sufficient balance.
    #[error("insufficient balance in {0}")]
    InsufficientBalance(Address),
    /// The underlying trie reported an error.
    #[error("trie error: {0}")]
    Trie(#[from] ethrs_trie::TrieError),
}
