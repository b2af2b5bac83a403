//! Legacy (pre-EIP-2718) transactions and EIP-155 sender recovery.

use crate::errors::TransactionError;
use crate::rlp::wrap_list;
use alloy_primitives::{keccak256, Address, Bytes, Signature, TxKind, B256, U256};
use alloy_rlp::{Encodable, RlpDecodable, RlpEncodable};

/// A signed legacy transaction: `[nonce, gas_price, gas_limit, to, value, data, v, r, s]`,
/// where `data` carries init code when `to` is the create sentinel and call input otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
    /// Sender-assigned sequence number.
    pub nonce: u64,
    /// Price offered per unit of gas, in Wei.
    pub gas_price: U256,
    /// Maximum gas this transaction may consume.
    pub gas_limit: u64,
    /// Message-call recipient, or the create sentinel for contract creation.
    pub to: TxKind,
    /// Value transferred, in Wei.
    pub value: U256,
    /// Init code (creation) or call input (message call).
    pub data: Bytes,
    /// Signature recovery id (EIP-155 encoded, or 27/28 for unprotected legacy).
    pub v: u64,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
}

impl Transaction {
    /// Whether this transaction creates a contract.
    pub fn is_create(&self) -> bool {
        self.to.is_create()
    }

    /// The chain id and y-parity this transaction's `v` encodes, per EIP-155: `v ∈ {27, 28}`
    /// is unprotected legacy (no chain id); otherwise `chain_id = (v - 35) / 2`.
    fn chain_id_and_parity(&self) -> (Option<u64>, bool) {
        if self.v == 27 || self.v == 28 {
            (None, self.v - 27 == 1)
        } else {
            (Some((self.v - 35) / 2), (self.v - 35) & 1 == 1)
        }
    }

    /// The RLP-encoded, unsigned signing payload: the transaction's seven base fields, plus
    /// `[chain_id, 0, 0]` appended when EIP-155 replay protection is in effect.
    pub fn signing_payload(&self) -> Vec<u8> {
        let (chain_id, _) = self.chain_id_and_parity();
        let mut payload = Vec::new();
        self.nonce.encode(&mut payload);
        self.gas_price.encode(&mut payload);
        self.gas_limit.encode(&mut payload);
        self.to.encode(&mut payload);
        self.value.encode(&mut payload);
        self.data.encode(&mut payload);
        if let Some(chain_id) = chain_id {
            chain_id.encode(&mut payload);
            0u64.encode(&mut payload);
            0u64.encode(&mut payload);
        }
        wrap_list(payload)
    }

    /// `Keccak256` of [`Self::signing_payload`], the hash this transaction's signature covers.
    pub fn signing_hash(&self) -> B256 {
        keccak256(self.signing_payload())
    }

    /// Recovers the sender address from this transaction's `(v, r, s)` signature.
    pub fn recover_sender(&self) -> Result<Address, TransactionError> {
        let (_, parity) = self.chain_id_and_parity();
        let signature = Signature::from_rs_and_parity(self.r, self.s, parity)
            .map_err(|_| TransactionError::InvalidSignature)?;
        signature
            .recover_address_from_prehash(&self.signing_hash())
            .map_err(|_| TransactionError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_unprotected(to: TxKind, data: Bytes) -> Transaction {
        Transaction { nonce: 0, gas_price: U256::from(1u64), gas_limit: 21_000, to, value: U256::ZERO, data, v: 0, r: U256::ZERO, s: U256::ZERO }
    }

    #[test]
    fn recover_sender_rejects_an_invalid_signature() {
        let tx = Transaction { v: 27, r: U256::ZERO, s: U256::ZERO, ..sample_unprotected(TxKind::Call(Address::ZERO), Bytes::new()) };
        assert_eq!(tx.recover_sender(), Err(TransactionError::InvalidSignature));
    }

    #[test]
    fn signing_hash_is_stable_for_equal_transactions() {
        let a = sample_unprotected(TxKind::Call(Address::repeat_byte(1)), Bytes::from_static(b"x"));
        let b = a.clone();
        assert_eq!(a.signing_hash(), b.signing_hash());
    }

    #[test]
    fn chain_id_and_parity_handles_unprotected_and_eip155() {
        let tx27 = Transaction { v: 27, ..Transaction::default() };
        assert_eq!(tx27.chain_id_and_parity(), (None, false));

        let tx28 = Transaction { v: 28, ..Transaction::default() };
        assert_eq!(tx28.chain_id_and_parity(), (None, true));

        // chain_id = 1 (mainnet), even y-parity: v = 35 + 2*1 + 0 = 37
        let tx37 = Transaction { v: 37, ..Transaction::default() };
        assert_eq!(tx37.chain_id_and_parity(), (Some(1), false));

        // chain_id = 1, odd y-parity: v = 38
        let tx38 = Transaction { v: 38, ..Transaction::default() };
        assert_eq!(tx38.chain_id_and_parity(), (Some(1), true));
    }

    #[test]
    fn is_create_reflects_to_field() {
        let creation = sample_unprotected(TxKind::Create, Bytes::new());
        assert!(creation.is_create());

        let call = sample_unprotected(TxKind::Call(Address::ZERO), Bytes::new());
        assert!(!call.is_create());
    }

    #[test]
    fn rlp_round_trips() {
        let tx = Transaction {
            nonce: 5,
            gas_price: U256::from(3u64),
            gas_limit: 100_000,
            to: TxKind::Create,
            value: U256::from(5u64),
            data: Bytes::from_static(b"init"),
            v: 27,
            r: U256::from(1u64),
            s: U256::from(2u64),
        };
        let mut buf = Vec::new();
        alloy_rlp::Encodable::encode(&tx, &mut buf);
        let decoded = <Transaction as alloy_rlp::Decodable>::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, tx);
    }
}
