//! The Ethereum account record as stored in the world-state trie.

use alloy_primitives::{keccak256, B256, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use std::sync::OnceLock;

/// An Ethereum account as represented in the world-state trie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    /// Number of transactions sent from this account (or, for contracts, the number of
    /// contract-creations it has performed).
    pub nonce: u64,
    /// Balance, in Wei.
    pub balance: U256,
    /// Root of this account's independent storage trie.
    pub storage_root: B256,
    /// `Keccak256` of this account's code.
    pub code_hash: B256,
}

/// `Keccak256("")`, the code hash of an account with no code.
pub fn empty_code_hash() -> B256 {
    static HASH: OnceLock<B256> = OnceLock::new();
    *HASH.get_or_init(|| keccak256([]))
}

/// The root of a trie with no entries: `Keccak256(rlp(""))`.
pub fn empty_trie_root() -> B256 {
    static ROOT: OnceLock<B256> = OnceLock::new();
    *ROOT.get_or_init(|| keccak256([alloy_rlp::EMPTY_STRING_CODE]))
}

impl Account {
    /// A fresh account with zero nonce and balance, no storage, and no code.
    pub fn blank() -> Self {
        Self {
            nonce: 0,
            balance: U256::ZERO,
            storage_root: empty_trie_root(),
            code_hash: empty_code_hash(),
        }
    }

    /// An account is "simple" iff it carries no code.
    pub fn is_simple(&self) -> bool {
        self.code_hash == empty_code_hash()
    }

    /// An account is "empty" per EIP-161: zero nonce, zero balance, and no code.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == empty_code_hash()
    }

    /// Whether this account owns any storage.
    pub fn has_storage(&self) -> bool {
        self.storage_root != empty_trie_root()
    }
}
