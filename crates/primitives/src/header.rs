//! The block header.

use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// A block header: the 15-field structure the Yellow Paper calls `H`.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Hash of the parent block's header.
    pub parent_hash: B256,
    /// Hash of this block's ommers list.
    pub ommers_hash: B256,
    /// Address that receives the block reward.
    pub beneficiary: Address,
    /// Root of the world-state trie after applying this block.
    pub state_root: B256,
    /// Root of the trie of this block's transactions.
    pub transactions_root: B256,
    /// Root of the trie of this block's receipts.
    pub receipts_root: B256,
    /// Bloom filter composed from all receipts' logs.
    pub logs_bloom: Bloom,
    /// Proof-of-work difficulty of this block.
    pub difficulty: U256,
    /// Block number, counting genesis as zero.
    pub number: u64,
    /// Maximum gas permitted across this block's transactions.
    pub gas_limit: u64,
    /// Total gas used by this block's transactions.
    pub gas_used: u64,
    /// Unix timestamp of block creation.
    pub timestamp: u64,
    /// Arbitrary byte array, at most 32 bytes.
    pub extra_data: Bytes,
    /// Proof-of-work mix hash.
    pub mix_hash: B256,
    /// Proof-of-work nonce.
    pub nonce: B64,
}

impl Header {
    /// `Keccak256(rlp(self))`, this header's canonical identity.
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(self.length());
        alloy_rlp::Encodable::encode(self, &mut buf);
        keccak256(buf)
    }
}

/// `Keccak(rlp(ommers))`, a block's `ommers_hash`. This is a flat list hash, not a trie
/// root — an empty ommers list hashes to the well-known `0x1dcc4d...` constant, distinct
/// from the empty-trie root used for `transactions_root`/`receipts_root`.
pub fn ommers_hash(ommers: &[Header]) -> B256 {
    let mut payload = Vec::new();
    for ommer in ommers {
        alloy_rlp::Encodable::encode(ommer, &mut payload);
    }
    keccak256(crate::rlp::wrap_list(payload))
}
