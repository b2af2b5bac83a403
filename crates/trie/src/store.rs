//! Backing storage for trie nodes and raw (content-addressed-by-caller) byte objects.
//!
//! The trie adapter itself is agnostic to where nodes live; callers plug in a
//! [`NodeStore`] (used internally by [`crate::MerklePatriciaTrie`]) and a [`RawStore`] for
//! the raw key/value access `put_raw`/`get_raw` exposed alongside it — used by the account
//! store layer to hold code objects under `Keccak256(code)`. The in-memory implementations
//! here are the default, runnable backing used by the rest of the workspace; a persistent
//! on-disk store is out of scope.

use alloy_primitives::{keccak256, Bytes, B256};
use std::collections::HashMap;

/// A content-addressed store of RLP-encoded trie node bodies, keyed by `Keccak256(body)`.
pub trait NodeStore {
    /// Looks up a node body by its hash. `None` if absent.
    fn get(&self, hash: &B256) -> Option<Bytes>;

    /// Stores a node body, keyed by its own Keccak-256 hash.
    fn put(&mut self, body: Bytes);
}

/// A raw key/value store, keyed by whatever the caller decides (typically `Keccak256` of
/// the value, computed by the account-store layer rather than by the store itself).
pub trait RawStore {
    /// Looks up a value by key. `None` if absent.
    fn get_raw(&self, key: &B256) -> Option<Bytes>;

    /// Stores `value` under `key`.
    fn put_raw(&mut self, key: B256, value: Bytes);
}

/// An in-memory [`NodeStore`] backed by a [`HashMap`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryNodeStore {
    nodes: HashMap<B256, Bytes>,
}

impl InMemoryNodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn get(&self, hash: &B256) -> Option<Bytes> {
        self.nodes.get(hash).cloned()
    }

    fn put(&mut self, body: Bytes) {
        let hash = keccak256(&body);
        self.nodes.insert(hash, body);
    }
}

/// An in-memory [`RawStore`] backed by a [`HashMap`], used for account code.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRawStore {
    entries: HashMap<B256, Bytes>,
}

impl InMemoryRawStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RawStore for InMemoryRawStore {
    fn get_raw(&self, key: &B256) -> Option<Bytes> {
        self.entries.get(key).cloned()
    }

    fn put_raw(&mut self, key: B256, value: Bytes) {
        self.entries.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_store_round_trips_by_content_hash() {
        let mut store = InMemoryNodeStore::new();
        let body = Bytes::from_static(b"some rlp body");
        store.put(body.clone());
        assert_eq!(store.get(&keccak256(&body)), Some(body));
    }

    #[test]
    fn raw_store_round_trips_by_caller_supplied_key() {
        let mut store = InMemoryRawStore::new();
        let code = Bytes::from_static(&[0x60, 0x00, 0x60, 0x00]);
        let key = keccak256(&code);
        store.put_raw(key, code.clone());
        assert_eq!(store.get_raw(&key), Some(code));
    }

    #[test]
    fn missing_key_returns_none() {
        let store = InMemoryNodeStore::new();
        assert_eq!(store.get(&B256::ZERO), None);
        let raw = InMemoryRawStore::new();
        assert_eq!(raw.get_raw(&B256::ZERO), None);
    }
}
