//! The trie-backed account store: §4.3's external contract over a [`MerklePatriciaTrie`].

use crate::errors::StateError;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable};
use ethrs_primitives::{empty_code_hash, Account};
use ethrs_trie::{MerklePatriciaTrie, NodeStore, RawStore};
use tracing::debug;

/// An account-based world state rooted in a Merkle-Patricia trie, keyed by `Keccak(address)`,
/// with a nested per-account storage trie keyed by `Keccak(slot)` and a raw, content-addressed
/// store for contract code.
#[derive(Debug)]
pub struct AccountStore<N, R> {
    trie: MerklePatriciaTrie<N, R>,
}

impl<N: NodeStore, R: RawStore> AccountStore<N, R> {
    /// Wraps the given trie.
    pub fn new(trie: MerklePatriciaTrie<N, R>) -> Self {
        Self { trie }
    }

    /// The empty world-state root.
    pub fn empty_root(&self) -> B256 {
        self.trie.empty_root()
    }

    /// Looks up the account at `addr`. `None` means no entry; an entry present but
    /// undecodable surfaces as [`StateError::NotFound`].
    pub fn get(&self, root: B256, addr: Address) -> Result<Option<Account>, StateError> {
        match self.trie.get(root, keccak256(addr).as_slice())? {
            None => Ok(None),
            Some(encoded) => Account::decode(&mut encoded.as_ref())
                .map(Some)
                .map_err(|_| StateError::NotFound(addr)),
        }
    }

    /// Writes `account` under `Keccak(addr)`, returning the new root.
    pub fn put(&mut self, root: B256, addr: Address, account: &Account) -> Result<B256, StateError> {
        let mut encoded = Vec::new();
        account.encode(&mut encoded);
        let new_root = self.trie.put(root, keccak256(addr).as_slice(), Bytes::from(encoded))?;
        debug!(target: "state", %addr, %new_root, "wrote account");
        Ok(new_root)
    }

    /// Removes the account at `addr`, returning the new root.
    pub fn delete(&mut self, root: B256, addr: Address) -> Result<B256, StateError> {
        Ok(self.trie.delete(root, keccak256(addr).as_slice())?)
    }

    /// Adds a signed delta to an account's balance, treating a missing account as blank.
    /// Fails with [`StateError::BalanceUnderflow`] if the result would be negative.
    pub fn add_wei(&mut self, root: B256, addr: Address, delta: i128) -> Result<B256, StateError> {
        let mut account = self.get(root, addr)?.unwrap_or_else(Account::blank);
        account.balance = if delta >= 0 {
            account.balance.saturating_add(U256::from(delta.unsigned_abs()))
        } else {
            account
                .balance
                .checked_sub(U256::from(delta.unsigned_abs()))
                .ok_or(StateError::BalanceUnderflow(addr))?
        };
        self.put(root, addr, &account)
    }

    /// Moves `value` Wei from `from` to `to`, atomically. Creates `to` as a blank account
    /// if it does not yet exist.
    pub fn transfer(&mut self, root: B256, from: Address, to: Address, value: U256) -> Result<B256, StateError> {
        let mut sender = self.get(root, from)?.ok_or(StateError::MissingSender(from))?;
        if sender.balance < value {
            return Err(StateError::InsufficientBalance(from));
        }
        let mut recipient = self.get(root, to)?.unwrap_or_else(Account::blank);

        sender.balance -= value;
        recipient.balance += value;

        let root = self.put(root, from, &sender)?;
        self.put(root, to, &recipient)
    }

    /// Increments an account's nonce, treating a missing account as blank (so its nonce
    /// becomes 1).
    pub fn increment_nonce(&mut self, root: B256, addr: Address) -> Result<B256, StateError> {
        let mut account = self.get(root, addr)?.unwrap_or_else(Account::blank);
        account.nonce += 1;
        self.put(root, addr, &account)
    }

    /// Reads a storage slot of `addr`. A missing account or a missing slot both read as
    /// [`U256::ZERO`], matching the zero-value-as-deletion invariant.
    pub fn get_storage(&self, root: B256, addr: Address, key: U256) -> Result<U256, StateError> {
        let Some(account) = self.get(root, addr)? else {
            return Ok(U256::ZERO);
        };
        match self.trie.get(account.storage_root, keccak256(key.to_be_bytes::<32>()).as_slice())? {
            None => Ok(U256::ZERO),
            Some(encoded) => Ok(U256::decode(&mut encoded.as_ref()).unwrap_or(U256::ZERO)),
        }
    }

    /// Writes a storage slot of `addr`. A zero `value` deletes the slot instead of storing
    /// it, per the empty-key invariant.
    pub fn put_storage(&mut self, root: B256, addr: Address, key: U256, value: U256) -> Result<B256, StateError> {
        let mut account = self.get(root, addr)?.unwrap_or_else(Account::blank);
        let storage_key = keccak256(key.to_be_bytes::<32>());
        account.storage_root = if value.is_zero() {
            self.trie.delete(account.storage_root, storage_key.as_slice())?
        } else {
            let mut encoded = Vec::new();
            value.encode(&mut encoded);
            self.trie.put(account.storage_root, storage_key.as_slice(), Bytes::from(encoded))?
        };
        self.put(root, addr, &account)
    }

    /// Writes `code` to the raw store under `Keccak(code)` and points `addr`'s account at it.
    pub fn put_code(&mut self, root: B256, addr: Address, code: Bytes) -> Result<B256, StateError> {
        let mut account = self.get(root, addr)?.unwrap_or_else(Account::blank);
        let code_hash = keccak256(&code);
        self.trie.put_raw(code_hash, code);
        account.code_hash = code_hash;
        self.put(root, addr, &account)
    }

    /// Reads `addr`'s code. An account with the empty-code hash (including a missing
    /// account) reads as empty bytes.
    pub fn get_code(&self, root: B256, addr: Address) -> Result<Bytes, StateError> {
        let Some(account) = self.get(root, addr)? else {
            return Ok(Bytes::new());
        };
        if account.code_hash == empty_code_hash() {
            return Ok(Bytes::new());
        }
        Ok(self.trie.get_raw(&account.code_hash).unwrap_or_default())
    }

    /// Reads code directly by its content hash, bypassing the account lookup. The empty
    /// code hash always reads as empty bytes, even if never written.
    pub fn get_code_by_hash(&self, code_hash: B256) -> Bytes {
        if code_hash == empty_code_hash() {
            return Bytes::new();
        }
        self.trie.get_raw(&code_hash).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethrs_trie::{InMemoryNodeStore, InMemoryRawStore};

    fn store() -> AccountStore<InMemoryNodeStore, InMemoryRawStore> {
        AccountStore::new(MerklePatriciaTrie::new(InMemoryNodeStore::new(), InMemoryRawStore::new()))
    }

    #[test]
    fn missing_account_reads_as_none() {
        let s = store();
        assert_eq!(s.get(s.empty_root(), Address::repeat_byte(1)).unwrap(), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let mut s = store();
        let addr = Address::repeat_byte(1);
        let account = Account { nonce: 3, balance: U256::from(10u64), ..Account::blank() };
        let root = s.put(s.empty_root(), addr, &account).unwrap();
        assert_eq!(s.get(root, addr).unwrap(), Some(account));
    }

    #[test]
    fn add_wei_credits_a_missing_account() {
        let mut s = store();
        let addr = Address::repeat_byte(1);
        let root = s.add_wei(s.empty_root(), addr, 100).unwrap();
        assert_eq!(s.get(root, addr).unwrap().unwrap().balance, U256::from(100u64));
    }

    #[test]
    fn add_wei_rejects_underflow() {
        let mut s = store();
        let addr = Address::repeat_byte(1);
        let root = s.put(s.empty_root(), addr, &Account { balance: U256::from(5u64), ..Account::blank() }).unwrap();
        assert_eq!(s.add_wei(root, addr, -10), Err(StateError::BalanceUnderflow(addr)));
    }

    #[test]
    fn transfer_moves_balance_atomically() {
        let mut s = store();
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let root = s.put(s.empty_root(), from, &Account { balance: U256::from(10u64), ..Account::blank() }).unwrap();
        let root = s.transfer(root, from, to, U256::from(3u64)).unwrap();
        assert_eq!(s.get(root, from).unwrap().unwrap().balance, U256::from(7u64));
        assert_eq!(s.get(root, to).unwrap().unwrap().balance, U256::from(3u64));
    }

    #[test]
    fn transfer_creates_a_fresh_recipient() {
        let mut s = store();
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let root = s.put(s.empty_root(), from, &Account { balance: U256::from(10u64), ..Account::blank() }).unwrap();
        let root = s.transfer(root, from, to, U256::ZERO).unwrap();
        let recipient = s.get(root, to).unwrap().unwrap();
        assert_eq!(recipient.balance, U256::ZERO);
        assert_eq!(recipient.nonce, 0);
    }

    #[test]
    fn transfer_rejects_missing_sender() {
        let mut s = store();
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        assert_eq!(s.transfer(s.empty_root(), from, to, U256::from(1u64)), Err(StateError::MissingSender(from)));
    }

    #[test]
    fn transfer_rejects_insufficient_balance() {
        let mut s = store();
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let root = s.put(s.empty_root(), from, &Account { balance: U256::from(1u64), ..Account::blank() }).unwrap();
        assert_eq!(s.transfer(root, from, to, U256::from(5u64)), Err(StateError::InsufficientBalance(from)));
    }

    #[test]
    fn increment_nonce_starts_a_missing_account_at_one() {
        let mut s = store();
        let addr = Address::repeat_byte(1);
        let root = s.increment_nonce(s.empty_root(), addr).unwrap();
        assert_eq!(s.get(root, addr).unwrap().unwrap().nonce, 1);
    }

    #[test]
    fn storage_round_trips_and_zero_deletes() {
        let mut s = store();
        let addr = Address::repeat_byte(1);
        let key = U256::from(7u64);
        let root = s.put_storage(s.empty_root(), addr, key, U256::from(42u64)).unwrap();
        assert_eq!(s.get_storage(root, addr, key).unwrap(), U256::from(42u64));

        let root = s.put_storage(root, addr, key, U256::ZERO).unwrap();
        assert_eq!(s.get_storage(root, addr, key).unwrap(), U256::ZERO);
        assert!(!s.get(root, addr).unwrap().unwrap().has_storage());
    }

    #[test]
    fn code_round_trips_and_defaults_to_empty() {
        let mut s = store();
        let addr = Address::repeat_byte(1);
        assert_eq!(s.get_code(s.empty_root(), addr).unwrap(), Bytes::new());

        let code = Bytes::from_static(&[0x60, 0x00, 0x60, 0x00]);
        let root = s.put_code(s.empty_root(), addr, code.clone()).unwrap();
        assert_eq!(s.get_code(root, addr).unwrap(), code);
        assert!(!s.get(root, addr).unwrap().unwrap().is_simple());
    }
}
