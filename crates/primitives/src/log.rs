//! Event logs emitted by contract execution.

use alloy_primitives::{Address, Bytes, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// A single event log: `[address, topics, data]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
    /// The contract address that emitted this log.
    pub address: Address,
    /// Up to 4 indexed 32-byte topics.
    pub topics: Vec<B256>,
    /// Non-indexed log data.
    pub data: Bytes,
}
