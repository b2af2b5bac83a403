//! The per-transaction staging repository: §4.4's layered cache over an [`AccountStore`].

use crate::errors::StateError;
use crate::store::AccountStore;
use alloy_primitives::{Address, Bytes, U256};
use ethrs_primitives::Account;
use ethrs_trie::{NodeStore, RawStore};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedAccount {
    account: Account,
    /// Code written via [`StagingRepository::put_code`] this session, pending commit.
    code: Option<Bytes>,
}

#[derive(Debug, Clone, Copy)]
struct StorageSlot {
    initial: U256,
    current: U256,
}

/// Buffers every account and storage mutation of a single transaction so a failed sub-call
/// can be discarded by simply dropping this repository. Reads fall through to the backing
/// [`AccountStore`] on a cache miss; writes only ever touch the cache until [`Self::commit`].
#[derive(Debug)]
pub struct StagingRepository<'a, N, R> {
    store: &'a mut AccountStore<N, R>,
    root: alloy_primitives::B256,
    accounts_cache: HashMap<Address, CachedAccount>,
    storage_cache: HashMap<Address, HashMap<U256, StorageSlot>>,
}

impl<'a, N: NodeStore, R: RawStore> StagingRepository<'a, N, R> {
    /// Opens a staging session rooted at `root` over `store`.
    pub fn new(store: &'a mut AccountStore<N, R>, root: alloy_primitives::B256) -> Self {
        Self { store, root, accounts_cache: HashMap::new(), storage_cache: HashMap::new() }
    }

    /// The account as it currently reads through this session: cached value if touched,
    /// otherwise the backing store's value (or blank, if absent).
    pub fn account(&mut self, addr: Address) -> Result<Account, StateError> {
        if let Some(cached) = self.accounts_cache.get(&addr) {
            return Ok(cached.account);
        }
        let account = self.store.get(self.root, addr)?.unwrap_or_else(Account::blank);
        self.accounts_cache.insert(addr, CachedAccount { account, code: None });
        Ok(account)
    }

    fn set_account(&mut self, addr: Address, account: Account) {
        self.accounts_cache.entry(addr).or_insert(CachedAccount { account, code: None }).account = account;
    }

    /// Whether `addr` has a materialized account, either already staged or in the backing
    /// store. Used by [`Self::transfer`], which (unlike [`Self::add_wei`]/
    /// [`Self::increment_nonce`]) must distinguish an absent sender from a blank one, and
    /// exposed for callers (e.g. the EVM oracle's `Database` adapter) that need the same
    /// distinction for existence checks that must not materialize a blank account.
    pub fn exists(&mut self, addr: Address) -> Result<bool, StateError> {
        if self.accounts_cache.contains_key(&addr) {
            return Ok(true);
        }
        Ok(self.store.get(self.root, addr)?.is_some())
    }

    /// Adds a signed delta to `addr`'s cached balance.
    pub fn add_wei(&mut self, addr: Address, delta: i128) -> Result<(), StateError> {
        let mut account = self.account(addr)?;
        account.balance = if delta >= 0 {
            account.balance.saturating_add(U256::from(delta.unsigned_abs()))
        } else {
            account
                .balance
                .checked_sub(U256::from(delta.unsigned_abs()))
                .ok_or(StateError::BalanceUnderflow(addr))?
        };
        self.set_account(addr, account);
        Ok(())
    }

    /// Moves `value` Wei from `from` to `to` within the cache, atomically.
    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), StateError> {
        if !self.exists(from)? {
            return Err(StateError::MissingSender(from));
        }
        let mut sender = self.account(from)?;
        if sender.balance < value {
            return Err(StateError::InsufficientBalance(from));
        }
        let mut recipient = self.account(to)?;
        sender.balance -= value;
        recipient.balance += value;
        self.set_account(from, sender);
        self.set_account(to, recipient);
        Ok(())
    }

    /// Increments `addr`'s cached nonce.
    pub fn increment_nonce(&mut self, addr: Address) -> Result<(), StateError> {
        let mut account = self.account(addr)?;
        account.nonce += 1;
        self.set_account(addr, account);
        Ok(())
    }

    /// Caches `code` for `addr`, pending a write to the raw store at [`Self::commit_accounts`],
    /// and points the cached account at `Keccak(code)`.
    pub fn put_code(&mut self, addr: Address, code: Bytes) -> Result<(), StateError> {
        let mut account = self.account(addr)?;
        account.code_hash = alloy_primitives::keccak256(&code);
        self.accounts_cache.insert(addr, CachedAccount { account, code: Some(code) });
        Ok(())
    }

    /// Reads code by its content hash. Checks pending, uncommitted code in the accounts
    /// cache first, then falls through to the backing store.
    pub fn code_by_hash(&self, code_hash: alloy_primitives::B256) -> Bytes {
        for cached in self.accounts_cache.values() {
            if let Some(code) = &cached.code {
                if alloy_primitives::keccak256(code) == code_hash {
                    return code.clone();
                }
            }
        }
        self.store.get_code_by_hash(code_hash)
    }

    /// Replaces `addr`'s cached account with a blank one, discarding pending code.
    pub fn reset_account(&mut self, addr: Address) {
        self.accounts_cache.insert(addr, CachedAccount { account: Account::blank(), code: None });
    }

    /// Overwrites `addr`'s cached balance and nonce directly, leaving its code hash and
    /// storage untouched. Used to apply an external interpreter's account diff (which
    /// reports absolute post-call balances/nonces, not deltas) back into the cache.
    pub fn set_balance_and_nonce(&mut self, addr: Address, balance: U256, nonce: u64) -> Result<(), StateError> {
        let mut account = self.account(addr)?;
        account.balance = balance;
        account.nonce = nonce;
        self.set_account(addr, account);
        Ok(())
    }

    /// Zeroes `addr`'s cached balance, leaving nonce, storage, and code untouched.
    pub fn clear_balance(&mut self, addr: Address) -> Result<(), StateError> {
        let mut account = self.account(addr)?;
        account.balance = U256::ZERO;
        self.set_account(addr, account);
        Ok(())
    }

    fn slot(&mut self, addr: Address, key: U256) -> Result<StorageSlot, StateError> {
        if let Some(slot) = self.storage_cache.get(&addr).and_then(|m| m.get(&key)) {
            return Ok(*slot);
        }
        let initial = self.store.get_storage(self.root, addr, key)?;
        let slot = StorageSlot { initial, current: initial };
        self.storage_cache.entry(addr).or_default().insert(key, slot);
        Ok(slot)
    }

    /// Writes a storage slot in the cache.
    pub fn put_storage(&mut self, addr: Address, key: U256, value: U256) -> Result<(), StateError> {
        let mut slot = self.slot(addr, key)?;
        slot.current = value;
        self.storage_cache.entry(addr).or_default().insert(key, slot);
        Ok(())
    }

    /// Removes a storage slot in the cache; equivalent to writing zero.
    pub fn remove_storage(&mut self, addr: Address, key: U256) -> Result<(), StateError> {
        self.put_storage(addr, key, U256::ZERO)
    }

    /// The slot's value as it currently reads this session.
    pub fn current_value(&mut self, addr: Address, key: U256) -> Result<U256, StateError> {
        Ok(self.slot(addr, key)?.current)
    }

    /// The slot's value as of the start of this session (before any writes in it).
    pub fn initial_value(&mut self, addr: Address, key: U256) -> Result<U256, StateError> {
        Ok(self.slot(addr, key)?.initial)
    }

    /// Flushes every cached account (and any pending code) through the account store.
    pub fn commit_accounts(&mut self) -> Result<alloy_primitives::B256, StateError> {
        for (addr, cached) in self.accounts_cache.drain() {
            if let Some(code) = cached.code {
                self.root = self.store.put_code(self.root, addr, code)?;
            }
            self.root = self.store.put(self.root, addr, &cached.account)?;
        }
        debug!(target: "state", root = %self.root, "committed staged accounts");
        Ok(self.root)
    }

    /// Flushes every cached storage write through the account store; a zero current value
    /// deletes the slot.
    pub fn commit_storage(&mut self) -> Result<alloy_primitives::B256, StateError> {
        for (addr, slots) in self.storage_cache.drain() {
            for (key, slot) in slots {
                self.root = self.store.put_storage(self.root, addr, key, slot.current)?;
            }
        }
        debug!(target: "state", root = %self.root, "committed staged storage");
        Ok(self.root)
    }

    /// Commits both accounts and storage, returning the final root.
    pub fn commit(&mut self) -> Result<alloy_primitives::B256, StateError> {
        self.commit_accounts()?;
        self.commit_storage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethrs_trie::{InMemoryNodeStore, InMemoryRawStore, MerklePatriciaTrie};

    fn store() -> AccountStore<InMemoryNodeStore, InMemoryRawStore> {
        AccountStore::new(MerklePatriciaTrie::new(InMemoryNodeStore::new(), InMemoryRawStore::new()))
    }

    #[test]
    fn uncommitted_writes_never_reach_the_backing_store() {
        let mut s = store();
        let root = s.empty_root();
        let addr = Address::repeat_byte(1);
        {
            let mut staging = StagingRepository::new(&mut s, root);
            staging.add_wei(addr, 100).unwrap();
        }
        assert_eq!(s.get(root, addr).unwrap(), None);
    }

    #[test]
    fn commit_flushes_account_and_storage_writes() {
        let mut s = store();
        let root = s.empty_root();
        let addr = Address::repeat_byte(1);
        let new_root = {
            let mut staging = StagingRepository::new(&mut s, root);
            staging.add_wei(addr, 100).unwrap();
            staging.put_storage(addr, U256::from(1u64), U256::from(42u64)).unwrap();
            staging.commit().unwrap()
        };
        assert_eq!(s.get(new_root, addr).unwrap().unwrap().balance, U256::from(100u64));
        assert_eq!(s.get_storage(new_root, addr, U256::from(1u64)).unwrap(), U256::from(42u64));
    }

    #[test]
    fn initial_value_is_frozen_at_first_touch() {
        let mut s = store();
        let root = s.empty_root();
        let addr = Address::repeat_byte(1);
        let root = {
            let mut staging = StagingRepository::new(&mut s, root);
            staging.put_storage(addr, U256::from(1u64), U256::from(7u64)).unwrap();
            staging.commit().unwrap()
        };

        let mut staging = StagingRepository::new(&mut s, root);
        staging.put_storage(addr, U256::from(1u64), U256::from(9u64)).unwrap();
        assert_eq!(staging.initial_value(addr, U256::from(1u64)).unwrap(), U256::from(7u64));
        assert_eq!(staging.current_value(addr, U256::from(1u64)).unwrap(), U256::from(9u64));
    }

    #[test]
    fn put_code_caches_code_and_updates_code_hash() {
        let mut s = store();
        let root = s.empty_root();
        let addr = Address::repeat_byte(1);
        let code = Bytes::from_static(&[0x60, 0x00]);
        let new_root = {
            let mut staging = StagingRepository::new(&mut s, root);
            staging.put_code(addr, code.clone()).unwrap();
            staging.commit().unwrap()
        };
        assert_eq!(s.get_code(new_root, addr).unwrap(), code);
    }

    #[test]
    fn reset_account_drops_balance_nonce_and_code() {
        let mut s = store();
        let root = s.put(s.empty_root(), Address::repeat_byte(1), &Account { nonce: 5, balance: U256::from(10u64), ..Account::blank() }).unwrap();
        let addr = Address::repeat_byte(1);
        let new_root = {
            let mut staging = StagingRepository::new(&mut s, root);
            staging.reset_account(addr);
            staging.commit().unwrap()
        };
        let account = s.get(new_root, addr).unwrap().unwrap();
        assert_eq!(account.nonce, 0);
        assert_eq!(account.balance, U256::ZERO);
    }

    #[test]
    fn clear_balance_zeroes_balance_only() {
        let mut s = store();
        let root = s.put(s.empty_root(), Address::repeat_byte(1), &Account { nonce: 5, balance: U256::from(10u64), ..Account::blank() }).unwrap();
        let addr = Address::repeat_byte(1);
        let new_root = {
            let mut staging = StagingRepository::new(&mut s, root);
            staging.clear_balance(addr).unwrap();
            staging.commit().unwrap()
        };
        let account = s.get(new_root, addr).unwrap().unwrap();
        assert_eq!(account.nonce, 5);
        assert_eq!(account.balance, U256::ZERO);
    }

    #[test]
    fn transfer_rejects_a_missing_sender() {
        let mut s = store();
        let root = s.empty_root();
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let mut staging = StagingRepository::new(&mut s, root);
        assert_eq!(staging.transfer(from, to, U256::from(1u64)), Err(StateError::MissingSender(from)));
    }

    #[test]
    fn transfer_rejects_insufficient_cached_balance() {
        let mut s = store();
        let root = s.put(s.empty_root(), Address::repeat_byte(1), &Account { balance: U256::from(1u64), ..Account::blank() }).unwrap();
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let mut staging = StagingRepository::new(&mut s, root);
        assert_eq!(staging.transfer(from, to, U256::from(5u64)), Err(StateError::InsufficientBalance(from)));
    }
}
