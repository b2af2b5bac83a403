//! The fork-choice block tree (§4.7): persists every accepted block and tracks the
//! heaviest-difficulty chain tip.

use crate::assembler::validate_block;
use crate::errors::ChainError;
use alloy_primitives::B256;
use ethrs_consensus::ChainConfig;
use ethrs_evm::{BlockHashProvider, EvmOracle};
use ethrs_primitives::{Block, Header};
use ethrs_state::AccountStore;
use ethrs_trie::{NodeStore, RawStore};
use std::collections::HashMap;
use tracing::info;

/// In-memory block persistence: `Hash(header) -> block` and `number -> hash`, plus the
/// current best (heaviest) tip.
///
/// Invariants: every stored block is wholly valid; `best_block` maximizes
/// `(number, difficulty)` lexicographically among stored blocks; every stored block's
/// `parent_hash` names either another stored block or the zero hash (genesis).
#[derive(Debug, Default)]
pub struct BlockStore {
    blocks: HashMap<B256, Block>,
    hash_for_number: HashMap<u64, B256>,
    best: Option<B256>,
}

impl BlockStore {
    /// An empty block tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a stored block by its header hash.
    pub fn get(&self, hash: B256) -> Option<&Block> {
        self.blocks.get(&hash)
    }

    /// Looks up a stored block's hash by its number, on the path from genesis to
    /// [`Self::best_block`] as of its insertion (later reorgs may leave stale entries for
    /// numbers above a shorter competing chain; `best_block` is always authoritative).
    pub fn hash_for_number(&self, number: u64) -> Option<B256> {
        self.hash_for_number.get(&number).copied()
    }

    /// The current heaviest tip, if any block has been accepted.
    pub fn best_block(&self) -> Option<&Block> {
        self.best.and_then(|hash| self.blocks.get(&hash))
    }

    /// Up to `generations` ancestor headers of `hash`, nearest first, stopping at genesis.
    pub fn recent_ancestors(&self, hash: B256, generations: u64) -> Vec<Header> {
        let mut out = Vec::new();
        let mut cursor = hash;
        for _ in 0..generations {
            let Some(block) = self.blocks.get(&cursor) else { break };
            out.push(block.header.clone());
            if block.header.parent_hash == B256::ZERO {
                break;
            }
            cursor = block.header.parent_hash;
        }
        out
    }

    /// Inserts `block` directly without validation, for the genesis block (which has no
    /// parent to validate against).
    pub fn insert_genesis(&mut self, block: Block) {
        let hash = block.header.hash();
        self.hash_for_number.insert(block.header.number, hash);
        self.blocks.insert(hash, block);
        self.promote_if_heavier(hash);
    }

    /// Resolves `block`'s parent, runs §4.6 holistic validation against it, and on success
    /// persists the block and updates `best_block`. Rejection leaves all state unchanged.
    pub fn verify_and_add<N, R, O, H>(
        &mut self,
        store: &mut AccountStore<N, R>,
        parent_state_root: B256,
        config: &ChainConfig,
        block: Block,
        oracle: &O,
        block_hashes: &H,
    ) -> Result<(), ChainError>
    where
        N: NodeStore,
        R: RawStore,
        O: EvmOracle,
        H: BlockHashProvider,
    {
        if block.header.number == 0 {
            self.insert_genesis(block);
            return Ok(());
        }

        let parent_hash = block.header.parent_hash;
        let parent = self.blocks.get(&parent_hash).map(|b| b.header.clone()).ok_or(ChainError::ParentNotFound(parent_hash))?;
        let recent_ancestors = self.recent_ancestors(parent_hash, 7);

        validate_block(store, parent_state_root, config, &parent, &recent_ancestors, &block, oracle, block_hashes)?;

        let hash = block.header.hash();
        self.hash_for_number.insert(block.header.number, hash);
        self.blocks.insert(hash, block);
        self.promote_if_heavier(hash);

        info!(target: "chain", %hash, "accepted block");
        Ok(())
    }

    fn promote_if_heavier(&mut self, candidate: B256) {
        let Some(candidate_block) = self.blocks.get(&candidate) else { return };
        let candidate_key = (candidate_block.header.number, candidate_block.header.difficulty);

        let is_heavier = match self.best {
            None => true,
            Some(best_hash) => {
                let best_block = self.blocks.get(&best_hash).expect("best_block always names a stored block");
                candidate_key > (best_block.header.number, best_block.header.difficulty)
            }
        };

        if is_heavier {
            self.best = Some(candidate);
        }
    }
}
