//! A [`revm::Database`] adapter over [`StagingRepository`], so `revm`'s interpreter reads
//! and writes state exclusively through the staging layer (§6: "the interpreter MUST NOT
//! mutate state outside `env'.account_repo`").

use alloy_primitives::{Address, B256, U256};
use ethrs_state::StagingRepository;
use ethrs_trie::{NodeStore, RawStore};
use revm::primitives::{AccountInfo, Bytecode};
use revm::Database;

/// Resolves a historical block hash by number, for the `BLOCKHASH` opcode. Grounded on the
/// same walk-back-by-parent-hash contract the teacher's `TrieDBProvider` exposes, generalized
/// to whatever the caller's block tree backs it with.
pub trait BlockHashProvider {
    /// Returns the hash of block `number`, or the zero hash if it is out of range.
    fn block_hash(&self, number: u64) -> B256;
}

/// A no-op provider that always returns the zero hash; suitable when `BLOCKHASH` is unused
/// (e.g. isolated unit tests of a single call).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBlockHashProvider;

impl BlockHashProvider for NoopBlockHashProvider {
    fn block_hash(&self, _number: u64) -> B256 {
        B256::ZERO
    }
}

/// Wraps a [`StagingRepository`] so `revm` can read and write account state through it
/// during a single call's execution. `revm`'s own bundle/commit machinery is never used;
/// the oracle translates `ResultAndState` back into the staging repository by hand.
#[derive(Debug)]
pub struct StagingDb<'a, 'b, N, R, H> {
    repo: &'a mut StagingRepository<'b, N, R>,
    block_hashes: &'a H,
}

impl<'a, 'b, N, R, H> StagingDb<'a, 'b, N, R, H> {
    /// Wraps `repo`, resolving `BLOCKHASH` queries through `block_hashes`.
    pub fn new(repo: &'a mut StagingRepository<'b, N, R>, block_hashes: &'a H) -> Self {
        Self { repo, block_hashes }
    }
}

impl<N: NodeStore, R: RawStore, H: BlockHashProvider> Database for StagingDb<'_, '_, N, R, H> {
    type Error = ethrs_state::StateError;

    fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        if !self.repo.exists(address)? {
            return Ok(None);
        }
        let account = self.repo.account(address)?;
        Ok(Some(AccountInfo {
            balance: account.balance,
            nonce: account.nonce,
            code_hash: account.code_hash,
            code: None,
        }))
    }

    fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error> {
        Ok(Bytecode::new_raw(self.repo.code_by_hash(code_hash)))
    }

    fn storage(&mut self, address: Address, index: U256) -> Result<U256, Self::Error> {
        self.repo.current_value(address, index)
    }

    fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
        Ok(self.block_hashes.block_hash(number))
    }
}
