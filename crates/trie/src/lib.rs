//! Merkle-Patricia trie adapter: the state-transition core's single key/value store
//! rooted in a 32-byte hash, per the external trie-adapter contract.
//!
//! [`MerklePatriciaTrie`] is the default, fully in-memory implementation: every account
//! and storage trie, and the transient per-block transactions/receipts/ommers tries, are
//! instances of it. [`ordered_list_root`] covers the latter three, which are write-once
//! and never reopened by key, so they are computed directly with `alloy_trie::HashBuilder`
//! rather than built up through [`MerklePatriciaTrie`]'s mutable node graph.

mod errors;
mod nibbles;
mod node;
mod ordered;
mod store;
mod trie;

pub use errors::TrieError;
pub use node::Node;
pub use ordered::{ordered_list_root, ordered_trie_with_encoder};
pub use store::{InMemoryNodeStore, InMemoryRawStore, NodeStore, RawStore};
pub use trie::{empty_root, MerklePatriciaTrie};

pub use nibbles::{common_prefix_len, hex_prefix_decode, hex_prefix_encode, unpack};
