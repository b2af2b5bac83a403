//! Transaction receipts and the logs-bloom filter.

use crate::log::Log;
use alloy_primitives::{Bloom, B256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header, RlpDecodable, RlpEncodable};

/// Either the post-transaction state root (pre-Byzantium) or a `{0,1}` success status
/// (Byzantium onward), disambiguated on decode by the encoded item's byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PostStateOrStatus {
    /// The pre-Byzantium intermediate state root after this transaction.
    PostState(B256),
    /// The Byzantium-onward success status.
    Status(bool),
}

impl Encodable for PostStateOrStatus {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::PostState(root) => root.encode(out),
            Self::Status(status) => u64::from(*status).encode(out),
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::PostState(root) => root.length(),
            Self::Status(status) => u64::from(*status).length(),
        }
    }
}

impl Decodable for PostStateOrStatus {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut peek = *buf;
        let header = Header::decode(&mut peek)?;
        if header.list {
            return Err(alloy_rlp::Error::UnexpectedList);
        }
        if header.payload_length == 32 {
            Ok(Self::PostState(B256::decode(buf)?))
        } else {
            match u64::decode(buf)? {
                0 => Ok(Self::Status(false)),
                1 => Ok(Self::Status(true)),
                _ => Err(alloy_rlp::Error::Custom("receipt status must be 0 or 1")),
            }
        }
    }
}

/// A transaction receipt: `[post_state_or_status, cumulative_gas_used, logs_bloom, logs]`.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Receipt {
    /// The post-state root or success status, per [`PostStateOrStatus`].
    pub post_state_or_status: PostStateOrStatus,
    /// Running total of gas used by this and all preceding transactions in the block.
    pub cumulative_gas_used: u64,
    /// The composed bloom filter over this receipt's own logs.
    pub logs_bloom: Bloom,
    /// The logs emitted by this transaction.
    pub logs: Vec<Log>,
}

/// Computes the 2048-bit bloom filter of a set of logs: every log's address and every one
/// of its topics are accrued via the standard 3-bits-per-item Ethereum bloom construction.
pub fn logs_bloom<'a>(logs: impl IntoIterator<Item = &'a Log>) -> Bloom {
    let mut bloom = Bloom::ZERO;
    for log in logs {
        bloom.m3_2048(log.address.as_slice());
        for topic in &log.topics {
            bloom.m3_2048(topic.as_slice());
        }
    }
    bloom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Log;
    use alloy_primitives::{Address, Bytes};

    #[test]
    fn status_round_trips() {
        for status in [false, true] {
            let mut buf = Vec::new();
            PostStateOrStatus::Status(status).encode(&mut buf);
            assert_eq!(PostStateOrStatus::decode(&mut buf.as_slice()).unwrap(), PostStateOrStatus::Status(status));
        }
    }

    #[test]
    fn post_state_round_trips() {
        let root = B256::repeat_byte(9);
        let mut buf = Vec::new();
        PostStateOrStatus::PostState(root).encode(&mut buf);
        assert_eq!(PostStateOrStatus::decode(&mut buf.as_slice()).unwrap(), PostStateOrStatus::PostState(root));
    }

    #[test]
    fn bloom_is_deterministic_and_order_independent_per_log() {
        let log = Log { address: Address::repeat_byte(1), topics: vec![B256::repeat_byte(2)], data: Bytes::new() };
        let a = logs_bloom([&log]);
        let b = logs_bloom([&log]);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_logs_give_zero_bloom() {
        assert_eq!(logs_bloom(std::iter::empty()), Bloom::ZERO);
    }

    #[test]
    fn receipt_rlp_round_trips() {
        let log = Log { address: Address::repeat_byte(1), topics: vec![B256::repeat_byte(2)], data: Bytes::new() };
        let receipt = Receipt {
            post_state_or_status: PostStateOrStatus::Status(true),
            cumulative_gas_used: 21_000,
            logs_bloom: logs_bloom([&log]),
            logs: vec![log],
        };
        let mut buf = Vec::new();
        receipt.encode(&mut buf);
        let decoded = Receipt::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, receipt);
    }
}
