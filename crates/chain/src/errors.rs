use alloy_primitives::B256;
use thiserror::Error;

/// A single mismatch between a block's declared header and the one reconstructed from its
/// parent (§4.6's holistic validation). Every applicable mismatch is collected; validation
/// fails iff the list is non-empty.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationTag {
    /// The declared difficulty does not match the one computed from the parent.
    #[error("invalid difficulty")]
    InvalidDifficulty,
    /// The declared gas limit falls outside the parent-bounded range.
    #[error("invalid gas limit")]
    InvalidGasLimit,
    /// The declared timestamp does not strictly exceed the parent's.
    #[error("child timestamp invalid")]
    ChildTimestampInvalid,
    /// The reconstructed state root does not match the declared one.
    #[error("state root mismatch")]
    StateRootMismatch,
    /// The reconstructed ommers hash does not match the declared one.
    #[error("ommers hash mismatch")]
    OmmersHashMismatch,
    /// The reconstructed transactions root does not match the declared one.
    #[error("transactions root mismatch")]
    TransactionsRootMismatch,
    /// The reconstructed receipts root does not match the declared one.
    #[error("receipts root mismatch")]
    ReceiptsRootMismatch,
    /// The reconstructed gas-used total does not match the declared one.
    #[error("gas used mismatch")]
    GasUsedMismatch,
    /// The reconstructed logs bloom does not match the declared one.
    #[error("logs bloom mismatch")]
    LogsBloomMismatch,
    /// Within the DAO fork's extra-data window, the declared `extra_data` did not equal
    /// the fork's required marker bytes.
    #[error("extra data does not match the DAO fork's required marker")]
    DaoExtraDataMismatch,
}

/// A rejected ommer header, with the specific defect.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OmmerError {
    /// The ommer shares no ancestor with the current block within 7 generations.
    #[error("ommer is not within 7 generations of a shared ancestor")]
    TooOld,
    /// The ommer is itself an ancestor of the current block.
    #[error("ommer is an ancestor of the current block")]
    IsAncestor,
    /// The ommer has already been included by an earlier block on this chain.
    #[error("ommer was already included")]
    AlreadyIncluded,
}

/// Fatal errors from block assembly, validation, or fork-choice acceptance.
#[derive(Debug, Error)]
pub enum ChainError {
    /// State-trie access failed.
    #[error("state error: {0}")]
    State(#[from] ethrs_state::StateError),
    /// The EVM oracle failed.
    #[error("evm error: {0}")]
    Evm(#[from] ethrs_evm::EvmError),
    /// A non-genesis block was submitted with no resolvable parent.
    #[error("parent not found for block {0}")]
    ParentNotFound(B256),
    /// The child's gas limit fell outside the parent-bounded range.
    #[error("invalid gas limit: {0}")]
    InvalidGasLimit(#[from] ethrs_consensus::InvalidGasLimit),
    /// An ommer header failed inclusion validation.
    #[error("ommer rejected: {0}")]
    InvalidOmmer(#[from] OmmerError),
    /// Holistic validation found one or more mismatches between the declared and
    /// reconstructed header.
    #[error("block validation failed: {0:?}")]
    Invalid(Vec<ValidationTag>),
}
