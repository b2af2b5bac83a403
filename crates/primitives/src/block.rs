//! The block: a header plus its transactions and ommer headers.

use crate::header::Header;
use crate::transaction::Transaction;
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// A full block: `[header, transactions, ommers]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    /// This block's header.
    pub header: Header,
    /// Transactions included in this block, in execution order.
    pub transactions: Vec<Transaction>,
    /// Ommer (uncle) headers included in this block.
    pub ommers: Vec<Header>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rlp_round_trips_empty_block() {
        let block = Block::default();
        let mut buf = Vec::new();
        alloy_rlp::Encodable::encode(&block, &mut buf);
        let decoded = <Block as alloy_rlp::Decodable>::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, block);
    }
}
