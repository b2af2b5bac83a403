//! In-memory nodes of a standard Merkle-Patricia trie.
//!
//! Unlike a trie opened against a remote preimage oracle, every node here is held fully
//! in memory; there is no "blinded" node variant. [`crate::MptTrie`] is responsible for
//! mapping a 32-byte root hash onto (and off of) this representation.

use crate::errors::TrieError;
use crate::nibbles::{common_prefix_len, hex_prefix_decode, hex_prefix_encode};
use crate::store::NodeStore;
use alloy_primitives::{keccak256, Bytes, B256};
use alloy_rlp::{Encodable, Header};

/// A node within a Merkle-Patricia trie.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum Node {
    /// The absence of a node. Encodes to the RLP empty string.
    #[default]
    Empty,
    /// A leaf node: `rlp([hex_prefix(path, true), value])`.
    Leaf {
        /// Remaining nibble path from this node to the value.
        path: Vec<u8>,
        /// The stored value.
        value: Bytes,
    },
    /// An extension node: `rlp([hex_prefix(path, false), child_ref])`.
    Extension {
        /// Shared nibble prefix.
        path: Vec<u8>,
        /// The single child this extension points to.
        child: Box<Node>,
    },
    /// A branch node: `rlp([child_ref_0, .., child_ref_15, value])`.
    Branch {
        /// The 16 nibble-indexed children.
        children: [Box<Node>; 16],
        /// The value stored at this node, if the key terminates here.
        value: Option<Bytes>,
    },
}

impl Node {
    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Looks up `path` (already in nibble form) within the subtree rooted at `self`.
    pub fn get<'a>(&'a self, path: &[u8]) -> Option<&'a Bytes> {
        match self {
            Self::Empty => None,
            Self::Leaf { path: p, value } => (p.as_slice() == path).then_some(value),
            Self::Extension { path: p, child } => {
                path.starts_with(p.as_slice()).then(|| child.get(&path[p.len()..])).flatten()
            }
            Self::Branch { children, value } => match path.first() {
                None => value.as_ref(),
                Some(nibble) => children[*nibble as usize].get(&path[1..]),
            },
        }
    }

    /// Inserts `value` at `path`, returning the updated subtree.
    pub fn insert(self, path: &[u8], value: Bytes) -> Self {
        match self {
            Self::Empty => Self::Leaf { path: path.to_vec(), value },
            Self::Leaf { path: p, value: v } => {
                if p == path {
                    Self::Leaf { path: p, value }
                } else {
                    Self::leaf_split(&p, v, path, value)
                }
            }
            Self::Extension { path: p, child } => {
                let cp = common_prefix_len(&p, path);
                if cp == p.len() {
                    Self::Extension { path: p, child: Box::new(child.insert(&path[cp..], value)) }
                } else {
                    Self::extension_split(&p, child, path, value)
                }
            }
            Self::Branch { mut children, value: bv } => match path.first() {
                None => Self::Branch { children, value: Some(value) },
                Some(nibble) => {
                    let idx = *nibble as usize;
                    let existing = core::mem::take(&mut children[idx]);
                    children[idx] = Box::new(existing.insert(&path[1..], value));
                    Self::Branch { children, value: bv }
                }
            },
        }
    }

    /// Removes `path` from the subtree rooted at `self`, returning the updated (possibly
    /// collapsed) subtree.
    pub fn delete(self, path: &[u8]) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Leaf { path: p, value } => {
                if p == path {
                    Self::Empty
                } else {
                    Self::Leaf { path: p, value }
                }
            }
            Self::Extension { path: p, child } => {
                if path.len() >= p.len() && path[..p.len()] == p[..] {
                    let new_child = child.delete(&path[p.len()..]);
                    Self::merge_extension(p, new_child)
                } else {
                    Self::Extension { path: p, child }
                }
            }
            Self::Branch { mut children, value } => match path.first() {
                None => Self::normalize_branch(children, None),
                Some(nibble) => {
                    let idx = *nibble as usize;
                    let existing = core::mem::take(&mut children[idx]);
                    children[idx] = Box::new(existing.delete(&path[1..]));
                    Self::normalize_branch(children, value)
                }
            },
        }
    }

    fn leaf_split(old_path: &[u8], old_value: Bytes, new_path: &[u8], new_value: Bytes) -> Self {
        let cp = common_prefix_len(old_path, new_path);
        let old_rem = &old_path[cp..];
        let new_rem = &new_path[cp..];

        let mut children: [Box<Self>; 16] = core::array::from_fn(|_| Box::new(Self::Empty));
        let mut value = None;

        match old_rem.first() {
            None => value = Some(old_value),
            Some(nibble) => {
                children[*nibble as usize] =
                    Box::new(Self::Leaf { path: old_rem[1..].to_vec(), value: old_value });
            }
        }
        match new_rem.first() {
            None => value = Some(new_value),
            Some(nibble) => {
                children[*nibble as usize] =
                    Box::new(Self::Leaf { path: new_rem[1..].to_vec(), value: new_value });
            }
        }

        let branch = Self::Branch { children, value };
        if cp == 0 {
            branch
        } else {
            Self::Extension { path: old_path[..cp].to_vec(), child: Box::new(branch) }
        }
    }

    fn extension_split(
        ext_path: &[u8],
        child: Box<Self>,
        new_path: &[u8],
        new_value: Bytes,
    ) -> Self {
        let cp = common_prefix_len(ext_path, new_path);
        let old_rem = &ext_path[cp..];
        let new_rem = &new_path[cp..];

        let mut children: [Box<Self>; 16] = core::array::from_fn(|_| Box::new(Self::Empty));
        let mut value = None;

        // `old_rem` is non-empty: `cp < ext_path.len()` whenever this is called.
        let old_idx = old_rem[0] as usize;
        children[old_idx] = if old_rem[1..].is_empty() {
            child
        } else {
            Box::new(Self::Extension { path: old_rem[1..].to_vec(), child })
        };

        match new_rem.first() {
            None => value = Some(new_value),
            Some(nibble) => {
                children[*nibble as usize] =
                    Box::new(Self::Leaf { path: new_rem[1..].to_vec(), value: new_value });
            }
        }

        let branch = Self::Branch { children, value };
        if cp == 0 {
            branch
        } else {
            Self::Extension { path: ext_path[..cp].to_vec(), child: Box::new(branch) }
        }
    }

    fn merge_extension(prefix: Vec<u8>, child: Self) -> Self {
        match child {
            Self::Empty => Self::Empty,
            Self::Leaf { path, value } => {
                Self::Leaf { path: [prefix, path].concat(), value }
            }
            Self::Extension { path, child } => {
                Self::Extension { path: [prefix, path].concat(), child }
            }
            branch @ Self::Branch { .. } => Self::Extension { path: prefix, child: Box::new(branch) },
        }
    }

    /// Collapses a branch after a deletion if it no longer has enough children/value to
    /// justify its own existence (the canonical MPT "must have >=2 arms, or 1 arm + a value"
    /// invariant).
    fn normalize_branch(children: [Box<Self>; 16], value: Option<Bytes>) -> Self {
        let remaining = children.iter().filter(|c| !c.is_empty()).count();
        match (remaining, &value) {
            (0, Some(_)) => Self::Leaf { path: Vec::new(), value: value.unwrap() },
            (0, None) => Self::Empty,
            (1, None) => {
                let mut children = children;
                let idx = children.iter().position(|c| !c.is_empty()).unwrap();
                let child = core::mem::take(&mut children[idx]);
                match *child {
                    Self::Leaf { path, value } => {
                        Self::Leaf { path: prepend(idx, &path), value }
                    }
                    Self::Extension { path, child } => {
                        Self::Extension { path: prepend(idx, &path), child }
                    }
                    branch @ Self::Branch { .. } => {
                        Self::Extension { path: vec![idx as u8], child: Box::new(branch) }
                    }
                    Self::Empty => unreachable!("filtered by `remaining` count"),
                }
            }
            _ => Self::Branch { children, value },
        }
    }

    /// RLP-encodes this node's own body (what its hash commitment is computed over).
    pub fn encode_self(&self) -> Vec<u8> {
        match self {
            Self::Empty => vec![alloy_rlp::EMPTY_STRING_CODE],
            Self::Leaf { path, value } => {
                let hp = Bytes::from(hex_prefix_encode(path, true));
                rlp_list(&[rlp_bytes(&hp), rlp_bytes(value)])
            }
            Self::Extension { path, child } => {
                let hp = Bytes::from(hex_prefix_encode(path, false));
                rlp_list(&[rlp_bytes(&hp), child.node_ref()])
            }
            Self::Branch { children, value } => {
                let mut items: Vec<Vec<u8>> = children.iter().map(|c| c.node_ref()).collect();
                items.push(match value {
                    Some(v) => rlp_bytes(v),
                    None => rlp_bytes(&[]),
                });
                rlp_list(&items)
            }
        }
    }

    /// The RLP item used to reference this node from a parent: the node's own encoding if it
    /// is under 32 bytes (inlined), otherwise the Keccak-256 hash of that encoding.
    pub fn node_ref(&self) -> Vec<u8> {
        let encoded = self.encode_self();
        if encoded.len() < 32 {
            encoded
        } else {
            rlp_bytes(keccak256(&encoded).as_slice())
        }
    }

    /// The commitment (root hash) of this node: `Keccak256(encode_self())`.
    pub fn commitment(&self) -> B256 {
        keccak256(self.encode_self())
    }

    /// Reconstructs the node whose commitment is `hash`, resolving any hashed child
    /// references against `store`. `hash` equal to the empty-trie root yields [`Self::Empty`]
    /// without consulting the store.
    pub fn decode(hash: B256, store: &impl NodeStore) -> Result<Self, TrieError> {
        if hash == Self::Empty.commitment() {
            return Ok(Self::Empty);
        }
        let body = store.get(&hash).ok_or(TrieError::NodeNotFound(hash))?;
        Self::decode_body(&body, store)
    }

    fn decode_body(body: &[u8], store: &impl NodeStore) -> Result<Self, TrieError> {
        if body == [alloy_rlp::EMPTY_STRING_CODE] {
            return Ok(Self::Empty);
        }

        let mut buf = body;
        let header =
            Header::decode(&mut buf).map_err(|e| TrieError::MalformedNode(e.to_string()))?;
        if !header.list {
            return Err(TrieError::MalformedNode("node body must be an RLP list".into()));
        }

        let mut items = Vec::new();
        while !buf.is_empty() {
            items.push(next_item(&mut buf)?);
        }

        match items.len() {
            2 => {
                let (_, path_payload, _) = items[0];
                let (nibbles, terminating) = hex_prefix_decode(path_payload);
                if terminating {
                    let (_, value_payload, _) = items[1];
                    Ok(Self::Leaf { path: nibbles, value: Bytes::copy_from_slice(value_payload) })
                } else {
                    let (is_list, payload, full_item) = items[1];
                    let child = resolve_child(is_list, payload, full_item, store)?;
                    Ok(Self::Extension { path: nibbles, child: Box::new(child) })
                }
            }
            17 => {
                let mut children: [Box<Self>; 16] = core::array::from_fn(|_| Box::new(Self::Empty));
                for (idx, child_slot) in children.iter_mut().enumerate() {
                    let (is_list, payload, full_item) = items[idx];
                    *child_slot = Box::new(resolve_child(is_list, payload, full_item, store)?);
                }
                let (_, value_payload, _) = items[16];
                let value =
                    if value_payload.is_empty() { None } else { Some(Bytes::copy_from_slice(value_payload)) };
                Ok(Self::Branch { children, value })
            }
            _ => Err(TrieError::MalformedNode("node list must have 2 or 17 items".into())),
        }
    }
}

/// Reads one RLP item from the front of `buf`, advancing it past that item, and returns
/// `(is_list, payload, full_encoded_item)`.
fn next_item<'a>(buf: &mut &'a [u8]) -> Result<(bool, &'a [u8], &'a [u8]), TrieError> {
    let before = *buf;
    let header = Header::decode(buf).map_err(|e| TrieError::MalformedNode(e.to_string()))?;
    if buf.len() < header.payload_length {
        return Err(TrieError::MalformedNode("truncated rlp item".into()));
    }
    let header_len = before.len() - buf.len();
    let payload = &buf[..header.payload_length];
    let full_item = &before[..header_len + header.payload_length];
    *buf = &buf[header.payload_length..];
    Ok((header.list, payload, full_item))
}

/// Resolves a child reference item: an inlined node (full list encoding under 32 bytes),
/// the empty string (an empty child slot), or a 32-byte Keccak hash looked up in `store`.
fn resolve_child(
    is_list: bool,
    payload: &[u8],
    full_item: &[u8],
    store: &impl NodeStore,
) -> Result<Node, TrieError> {
    if is_list {
        Node::decode_body(full_item, store)
    } else if payload.is_empty() {
        Ok(Node::Empty)
    } else if payload.len() == 32 {
        let hash = B256::from_slice(payload);
        let stored = store.get(&hash).ok_or(TrieError::NodeNotFound(hash))?;
        Node::decode_body(&stored, store)
    } else {
        Err(TrieError::MalformedNode(
            "child reference must be empty, a list, or a 32-byte hash".into(),
        ))
    }
}

fn prepend(idx: usize, path: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.push(idx as u8);
    out.extend_from_slice(path);
    out
}

/// Canonical RLP encoding of a byte string per the recursive-length-encoding rules.
fn rlp_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 4);
    data.encode(&mut out);
    out
}

/// Wraps already-encoded RLP items in a list header.
fn rlp_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_length: usize = items.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header { list: true, payload_length }.encode(&mut out);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_node_is_empty_trie_root() {
        let empty_root = Node::Empty.commitment();
        let expected = keccak256([alloy_rlp::EMPTY_STRING_CODE]);
        assert_eq!(empty_root, expected);
    }

    #[test]
    fn insert_then_get_round_trips() {
        let node = Node::Empty.insert(&[1, 2, 3, 4], Bytes::from_static(b"hello"));
        assert_eq!(node.get(&[1, 2, 3, 4]), Some(&Bytes::from_static(b"hello")));
        assert_eq!(node.get(&[1, 2, 3, 5]), None);
    }

    #[test]
    fn insert_two_diverging_leaves() {
        let node = Node::Empty
            .insert(&[1, 2, 3], Bytes::from_static(b"a"))
            .insert(&[1, 2, 9], Bytes::from_static(b"b"));
        assert_eq!(node.get(&[1, 2, 3]), Some(&Bytes::from_static(b"a")));
        assert_eq!(node.get(&[1, 2, 9]), Some(&Bytes::from_static(b"b")));
    }

    #[test]
    fn delete_collapses_branch() {
        let node = Node::Empty
            .insert(&[1, 2, 3], Bytes::from_static(b"a"))
            .insert(&[1, 2, 9], Bytes::from_static(b"b"));
        let node = node.delete(&[1, 2, 9]);
        assert_eq!(node.get(&[1, 2, 3]), Some(&Bytes::from_static(b"a")));
        assert_eq!(node.get(&[1, 2, 9]), None);
        assert_eq!(node, Node::Leaf { path: vec![1, 2, 3], value: Bytes::from_static(b"a") });
    }

    #[test]
    fn delete_everything_yields_empty_root() {
        let node = Node::Empty.insert(&[1, 2, 3], Bytes::from_static(b"a")).delete(&[1, 2, 3]);
        assert_eq!(node, Node::Empty);
        assert_eq!(node.commitment(), keccak256([alloy_rlp::EMPTY_STRING_CODE]));
    }

    #[test]
    fn overwrite_existing_key_replaces_value() {
        let node = Node::Empty
            .insert(&[1, 2], Bytes::from_static(b"a"))
            .insert(&[1, 2], Bytes::from_static(b"b"));
        assert_eq!(node.get(&[1, 2]), Some(&Bytes::from_static(b"b")));
    }

    fn store_recursively(node: &Node, store: &mut crate::store::InMemoryNodeStore) {
        if let Node::Extension { child, .. } = node {
            store_recursively(child, store);
        }
        if let Node::Branch { children, .. } = node {
            for child in children {
                store_recursively(child, store);
            }
        }
        let encoded = node.encode_self();
        if encoded.len() >= 32 {
            store.put(Bytes::from(encoded));
        }
    }

    #[test]
    fn decode_round_trips_through_a_store_for_a_wide_branch() {
        let mut store = crate::store::InMemoryNodeStore::new();
        let mut node = Node::Empty;
        // Enough distinct keys that at least one branch's encoding exceeds 32 bytes and gets
        // hashed rather than inlined.
        for i in 0u8..20 {
            node = node.insert(&[i % 16, i, 0, 1], Bytes::from(vec![i; 40]));
        }
        store_recursively(&node, &mut store);
        let hash = node.commitment();

        let decoded = Node::decode(hash, &store).expect("decodes");
        for i in 0u8..20 {
            assert_eq!(decoded.get(&[i % 16, i, 0, 1]), Some(&Bytes::from(vec![i; 40])));
        }
        assert_eq!(decoded.commitment(), hash);
    }

    #[test]
    fn decode_of_empty_root_needs_no_store_lookup() {
        let store = crate::store::InMemoryNodeStore::new();
        let decoded = Node::decode(Node::Empty.commitment(), &store).expect("decodes");
        assert_eq!(decoded, Node::Empty);
    }
}
