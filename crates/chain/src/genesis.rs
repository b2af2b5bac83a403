//! The genesis builder (§4.8): constructs block 0 and its state from the chain config.

use alloy_primitives::B256;
use ethrs_consensus::ChainConfig;
use ethrs_primitives::{empty_trie_root, ommers_hash, Account, Block, Header};
use ethrs_state::{AccountStore, StateError};
use ethrs_trie::{MerklePatriciaTrie, NodeStore, RawStore};

/// The genesis block, paired with the populated world-state root it was built against.
#[derive(Debug)]
pub struct Genesis {
    /// The genesis block; an empty transactions list, ommers list, and receipts root.
    pub block: Block,
    /// The world-state root after every configured account was inserted.
    pub state_root: B256,
}

/// Builds the genesis block and populates `store` with every configured account that
/// carries a balance, per §4.8.
pub fn build_genesis<N: NodeStore, R: RawStore>(config: &ChainConfig, store: &mut AccountStore<N, R>) -> Result<Genesis, StateError> {
    let genesis = &config.genesis;
    let mut root = store.empty_root();

    for account in &genesis.accounts {
        let Some(balance) = account.balance else { continue };
        let record = Account { nonce: account.nonce, balance, ..Account::blank() };
        root = store.put(root, account.address, &record)?;
        if let Some(code) = &account.code {
            root = store.put_code(root, account.address, code.clone())?;
        }
    }

    let header = Header {
        parent_hash: B256::ZERO,
        ommers_hash: ommers_hash(&[]),
        beneficiary: genesis.beneficiary,
        state_root: root,
        transactions_root: empty_trie_root(),
        receipts_root: empty_trie_root(),
        logs_bloom: alloy_primitives::Bloom::ZERO,
        difficulty: genesis.difficulty,
        number: 0,
        gas_limit: genesis.gas_limit,
        gas_used: 0,
        timestamp: genesis.timestamp,
        extra_data: genesis.extra_data.clone(),
        mix_hash: genesis.mix_hash,
        nonce: genesis.nonce,
    };

    Ok(Genesis { block: Block { header, transactions: Vec::new(), ommers: Vec::new() }, state_root: root })
}
