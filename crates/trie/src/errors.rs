//! Errors produced by the trie adapter.

use alloy_primitives::B256;
use thiserror::Error;

/// Errors surfaced by [`crate::MerklePatriciaTrie`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// A node referenced by hash was not present in the backing [`crate::NodeStore`].
    #[error("trie node {0} not found in backing store")]
    NodeNotFound(B256),

    /// A stored node's RLP body could not be decoded into a well-formed node.
    #[error("malformed trie node body: {0}")]
    MalformedNode(String),
}
