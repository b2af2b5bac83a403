//! Child-block derivation, transaction application, rewards, and holistic validation (§4.6).

use crate::errors::{ChainError, OmmerError, ValidationTag};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::Encodable;
use ethrs_consensus::{compute_difficulty, validate_gas_limit, ChainConfig};
use ethrs_evm::{BlockHashProvider, EvmOracle};
use ethrs_primitives::{logs_bloom, ommers_hash, Block, Header, Receipt, Transaction};
use ethrs_state::{AccountStore, StagingRepository};
use ethrs_trie::{ordered_list_root, NodeStore, RawStore};
use tracing::debug;

/// A freshly assembled block, the world-state root it committed to, and the receipts its
/// transactions produced (in transaction order).
#[derive(Debug)]
pub struct AssembledBlock {
    /// The assembled block.
    pub block: Block,
    /// The world-state root after every transaction and reward was applied.
    pub state_root: B256,
    /// Receipts emitted by applied transactions, in order.
    pub receipts: Vec<Receipt>,
}

/// The unvalidated inputs a block producer chooses for a new child: everything the parent
/// does not already determine.
#[derive(Debug, Clone)]
pub struct ChildProposal {
    /// The block's coinbase.
    pub beneficiary: Address,
    /// The block's declared timestamp.
    pub timestamp: u64,
    /// The block's declared gas limit.
    pub gas_limit: u64,
    /// Arbitrary extra data, at most 32 bytes.
    pub extra_data: Bytes,
    /// Transactions to apply, in order.
    pub transactions: Vec<Transaction>,
    /// Ommer headers to include.
    pub ommers: Vec<Header>,
}

/// Builds and fully applies a child block atop `parent`, per §4.6. Fails fast if the
/// proposal's gas limit is out of bounds or an ommer fails inclusion — a block producer
/// should never propose an infeasible block.
#[allow(clippy::too_many_arguments)]
pub fn assemble_block<N, R, O, H>(
    store: &mut AccountStore<N, R>,
    parent_state_root: B256,
    config: &ChainConfig,
    parent: &Header,
    recent_ancestors: &[Header],
    proposal: ChildProposal,
    oracle: &O,
    block_hashes: &H,
) -> Result<AssembledBlock, ChainError>
where
    N: NodeStore,
    R: RawStore,
    O: EvmOracle,
    H: BlockHashProvider,
{
    validate_gas_limit(config, parent.gas_limit, proposal.gas_limit)?;
    for ommer in &proposal.ommers {
        validate_ommer(ommer, parent, recent_ancestors)?;
    }

    let number = parent.number + 1;
    let difficulty = compute_difficulty(
        config,
        parent.difficulty,
        parent.timestamp,
        !parent_has_no_ommers(parent),
        proposal.timestamp,
        number,
    );

    let extra_data =
        if config.is_dao_extra_data_window(number) { config.dao_fork_extra_data.clone() } else { proposal.extra_data };

    let mut header = Header {
        parent_hash: parent.hash(),
        beneficiary: proposal.beneficiary,
        difficulty,
        number,
        gas_limit: proposal.gas_limit,
        timestamp: proposal.timestamp,
        extra_data,
        ..Header::default()
    };

    let mut repo = StagingRepository::new(store, parent_state_root);

    if config.dao_fork_block == Some(number) {
        sweep_dao_accounts(&mut repo, config)?;
    }

    let mut receipts = Vec::with_capacity(proposal.transactions.len());
    let mut gas_used = 0u64;
    for tx in &proposal.transactions {
        let outcome = ethrs_executor::execute_transaction(&mut repo, config, &header, gas_used, gas_used, tx, oracle, block_hashes)?;
        if let ethrs_executor::ExecutionOutcome::Applied(applied) = outcome {
            gas_used += applied.gas_used;
            receipts.push(applied.receipt);
        }
    }

    apply_rewards(&mut repo, config, number, proposal.beneficiary, &proposal.ommers)?;
    let state_root = repo.commit()?;

    header.gas_used = gas_used;
    header.state_root = state_root;
    header.transactions_root = ordered_list_root(&proposal.transactions, |tx, buf| tx.encode(buf));
    header.receipts_root = ordered_list_root(&receipts, |receipt, buf| receipt.encode(buf));
    header.logs_bloom = logs_bloom(receipts.iter().flat_map(|r| &r.logs));
    header.ommers_hash = ommers_hash(&proposal.ommers);

    debug!(target: "chain", number, gas_used, tx_count = proposal.transactions.len(), "assembled block");

    Ok(AssembledBlock { block: Block { header, transactions: proposal.transactions, ommers: proposal.ommers }, state_root, receipts })
}

/// Reconstructs the expected child from `parent` using `candidate`'s own beneficiary,
/// timestamp, gas_limit, extra_data, transactions, and ommers, then compares every
/// consensus-relevant field. Every mismatch becomes one [`ValidationTag`]; success iff the
/// collected list is empty.
#[allow(clippy::too_many_arguments)]
pub fn validate_block<N, R, O, H>(
    store: &mut AccountStore<N, R>,
    parent_state_root: B256,
    config: &ChainConfig,
    parent: &Header,
    recent_ancestors: &[Header],
    candidate: &Block,
    oracle: &O,
    block_hashes: &H,
) -> Result<(), ChainError>
where
    N: NodeStore,
    R: RawStore,
    O: EvmOracle,
    H: BlockHashProvider,
{
    let mut tags = Vec::new();

    if candidate.header.timestamp <= parent.timestamp {
        tags.push(ValidationTag::ChildTimestampInvalid);
    }
    if validate_gas_limit(config, parent.gas_limit, candidate.header.gas_limit).is_err() {
        tags.push(ValidationTag::InvalidGasLimit);
    }

    let number = parent.number + 1;
    let expected_difficulty = compute_difficulty(
        config,
        parent.difficulty,
        parent.timestamp,
        !parent_has_no_ommers(parent),
        candidate.header.timestamp,
        number,
    );
    if candidate.header.difficulty != expected_difficulty {
        tags.push(ValidationTag::InvalidDifficulty);
    }

    for ommer in &candidate.ommers {
        if validate_ommer(ommer, parent, recent_ancestors).is_err() {
            tags.push(ValidationTag::OmmersHashMismatch);
            break;
        }
    }

    if config.is_dao_extra_data_window(number) && candidate.header.extra_data != config.dao_fork_extra_data {
        tags.push(ValidationTag::DaoExtraDataMismatch);
    }

    let mut repo = StagingRepository::new(store, parent_state_root);
    if config.dao_fork_block == Some(number) {
        sweep_dao_accounts(&mut repo, config)?;
    }

    let mut receipts = Vec::with_capacity(candidate.transactions.len());
    let mut gas_used = 0u64;
    for tx in &candidate.transactions {
        let outcome =
            ethrs_executor::execute_transaction(&mut repo, config, &candidate.header, gas_used, gas_used, tx, oracle, block_hashes)?;
        if let ethrs_executor::ExecutionOutcome::Applied(applied) = outcome {
            gas_used += applied.gas_used;
            receipts.push(applied.receipt);
        }
    }
    apply_rewards(&mut repo, config, number, candidate.header.beneficiary, &candidate.ommers)?;
    let state_root = repo.commit()?;

    if state_root != candidate.header.state_root {
        tags.push(ValidationTag::StateRootMismatch);
    }
    if ommers_hash(&candidate.ommers) != candidate.header.ommers_hash {
        tags.push(ValidationTag::OmmersHashMismatch);
    }
    let transactions_root = ordered_list_root(&candidate.transactions, |tx, buf| tx.encode(buf));
    if transactions_root != candidate.header.transactions_root {
        tags.push(ValidationTag::TransactionsRootMismatch);
    }
    let receipts_root = ordered_list_root(&receipts, |receipt, buf| receipt.encode(buf));
    if receipts_root != candidate.header.receipts_root {
        tags.push(ValidationTag::ReceiptsRootMismatch);
    }
    if gas_used != candidate.header.gas_used {
        tags.push(ValidationTag::GasUsedMismatch);
    }
    let bloom = logs_bloom(receipts.iter().flat_map(|r| &r.logs));
    if bloom != candidate.header.logs_bloom {
        tags.push(ValidationTag::LogsBloomMismatch);
    }

    if tags.is_empty() {
        Ok(())
    } else {
        Err(ChainError::Invalid(tags))
    }
}

/// Whether `parent` itself included any ommers — feeds Byzantium's uncle-aware difficulty
/// adjustment. The parent's own `ommers_hash` already answers this without needing its
/// ommers list.
fn parent_has_no_ommers(parent: &Header) -> bool {
    parent.ommers_hash == ommers_hash(&[])
}

fn validate_ommer(ommer: &Header, current_parent: &Header, recent_ancestors: &[Header]) -> Result<(), OmmerError> {
    if ommer.hash() == current_parent.hash() {
        return Err(OmmerError::IsAncestor);
    }
    if recent_ancestors.iter().any(|ancestor| ancestor.hash() == ommer.hash()) {
        return Err(OmmerError::IsAncestor);
    }

    let shares_recent_ancestor = recent_ancestors.iter().any(|ancestor| ancestor.parent_hash == ommer.parent_hash)
        || current_parent.parent_hash == ommer.parent_hash;
    if !shares_recent_ancestor {
        return Err(OmmerError::TooOld);
    }

    Ok(())
}

fn sweep_dao_accounts<N: NodeStore, R: RawStore>(repo: &mut StagingRepository<'_, N, R>, config: &ChainConfig) -> Result<(), ChainError> {
    for drained in &config.dao_drain_accounts {
        if !repo.exists(*drained)? {
            continue;
        }
        let balance = repo.account(*drained)?.balance;
        repo.transfer(*drained, config.dao_fork_beneficiary, balance)?;
    }
    Ok(())
}

fn apply_rewards<N: NodeStore, R: RawStore>(
    repo: &mut StagingRepository<'_, N, R>,
    config: &ChainConfig,
    block_number: u64,
    beneficiary: Address,
    ommers: &[Header],
) -> Result<(), ChainError> {
    if block_number == 0 {
        return Ok(());
    }
    let base = config.block_reward(block_number);
    let beneficiary_reward = base + base * U256::from(ommers.len() as u64) / U256::from(32u64);
    repo.add_wei(beneficiary, i128::try_from(beneficiary_reward).unwrap_or(i128::MAX))?;

    for ommer in ommers {
        let distance = block_number.saturating_sub(ommer.number);
        let ommer_reward = base * U256::from(8u64.saturating_sub(distance)) / U256::from(8u64);
        repo.add_wei(ommer.beneficiary, i128::try_from(ommer_reward).unwrap_or(i128::MAX))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethrs_evm::NoopBlockHashProvider;
    use ethrs_evm::RevmOracle;
    use ethrs_trie::{InMemoryNodeStore, InMemoryRawStore, MerklePatriciaTrie};

    fn config() -> ChainConfig {
        ChainConfig {
            gas_limit_bound_divisor: 1024,
            min_gas_limit: 5_000,
            minimum_difficulty: U256::from(131_072u64),
            difficulty_bound_divisor: U256::from(2048u64),
            duration_limit: 13,
            block_rewards: vec![(0, U256::from(5_000_000_000_000_000_000u64))],
            ..Default::default()
        }
    }

    fn store() -> AccountStore<InMemoryNodeStore, InMemoryRawStore> {
        AccountStore::new(MerklePatriciaTrie::new(InMemoryNodeStore::new(), InMemoryRawStore::new()))
    }

    fn proposal() -> ChildProposal {
        ChildProposal {
            beneficiary: Address::repeat_byte(9),
            timestamp: 2_000,
            gas_limit: 5_000_000,
            extra_data: Bytes::new(),
            transactions: Vec::new(),
            ommers: Vec::new(),
        }
    }

    #[test]
    fn an_empty_block_credits_the_full_base_reward_to_the_beneficiary() {
        let mut s = store();
        let config = config();
        let parent = Header { number: 0, timestamp: 1_000, difficulty: U256::from(200_000u64), gas_limit: 5_000_000, ..Header::default() };
        let root = s.empty_root();

        let assembled =
            assemble_block(&mut s, root, &config, &parent, &[], proposal(), &RevmOracle, &NoopBlockHashProvider).unwrap();

        let beneficiary_account = s.get(assembled.state_root, Address::repeat_byte(9)).unwrap().unwrap();
        assert_eq!(beneficiary_account.balance, U256::from(5_000_000_000_000_000_000u64));
        assert_eq!(assembled.block.header.number, 1);
    }

    #[test]
    fn an_out_of_bounds_gas_limit_is_rejected() {
        let mut s = store();
        let config = config();
        let parent = Header { number: 0, timestamp: 1_000, difficulty: U256::from(200_000u64), gas_limit: 5_000_000, ..Header::default() };
        let root = s.empty_root();

        let mut bad_proposal = proposal();
        bad_proposal.gas_limit = 5_100_000;

        let result = assemble_block(&mut s, root, &config, &parent, &[], bad_proposal, &RevmOracle, &NoopBlockHashProvider);
        assert!(matches!(result, Err(ChainError::InvalidGasLimit(_))));
    }

    #[test]
    fn validate_block_accepts_a_block_assembled_by_assemble_block() {
        let mut s = store();
        let config = config();
        let parent = Header { number: 0, timestamp: 1_000, difficulty: U256::from(200_000u64), gas_limit: 5_000_000, ..Header::default() };
        let root = s.empty_root();

        let assembled =
            assemble_block(&mut s, root, &config, &parent, &[], proposal(), &RevmOracle, &NoopBlockHashProvider).unwrap();

        let mut s2 = store();
        let root2 = s2.empty_root();
        let result =
            validate_block(&mut s2, root2, &config, &parent, &[], &assembled.block, &RevmOracle, &NoopBlockHashProvider);
        assert!(result.is_ok());
    }
}
