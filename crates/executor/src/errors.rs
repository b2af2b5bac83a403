//! Errors surfaced by the transaction executor.

use alloy_primitives::Address;
use thiserror::Error;

/// A transaction failed pre-flight validation (§4.5) and is omitted from the block's
/// receipts list entirely; the failure is not propagated to the caller as a fatal error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreflightError {
    /// The signature does not recover to a valid sender address.
    #[error("invalid sender signature")]
    InvalidSender,
    /// The sender has no account in the current state.
    #[error("missing sender account: {0}")]
    MissingAccount(Address),
    /// `sender.nonce != tx.nonce`.
    #[error("nonce mismatch for {0}: account has {account_nonce}, transaction has {tx_nonce}")]
    NonceMismatch { address: Address, account_nonce: u64, tx_nonce: u64 },
    /// `tx.gas_limit` is below the computed intrinsic gas cost.
    #[error("insufficient intrinsic gas: need {required}, have {provided}")]
    InsufficientIntrinsicGas { required: u64, provided: u64 },
    /// `sender.balance < gas_limit * gas_price + value`.
    #[error("insufficient balance for sender {0}")]
    InsufficientBalance(Address),
    /// `tx.gas_limit > block.gas_limit - block.gas_used`.
    #[error("transaction gas limit exceeds remaining block gas")]
    OverGasLimit,
}

/// Errors raised while executing a transaction that has already passed pre-flight
/// validation; these are fatal to block processing.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The underlying account state reported an error.
    #[error("state error: {0}")]
    State(#[from] ethrs_state::StateError),
    /// The EVM oracle reported an error.
    #[error("evm error: {0}")]
    Evm(#[from] ethrs_evm::EvmError),
}
