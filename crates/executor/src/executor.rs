//! The per-transaction execution pipeline (§4.5).

use crate::errors::{ExecutorError, PreflightError};
use crate::intrinsic_gas::intrinsic_gas;
use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_rlp::Encodable;
use ethrs_consensus::ChainConfig;
use ethrs_evm::{BlockHashProvider, EvmOracle, ExecEnv};
use ethrs_primitives::{logs_bloom, Account, Header, PostStateOrStatus, Receipt, Transaction};
use ethrs_state::StagingRepository;
use ethrs_trie::{NodeStore, RawStore};
use tracing::debug;

const MAX_CODE_SIZE: usize = 24_576;
const CODE_DEPOSIT_GAS_PER_BYTE: u64 = 200;

/// A transaction that passed pre-flight validation and was applied, with the receipt it
/// produced and its own gas usage (not yet folded into the block's running total).
#[derive(Debug)]
pub struct TransactionOutcome {
    /// The receipt emitted for this transaction.
    pub receipt: Receipt,
    /// Gas consumed by this transaction alone.
    pub gas_used: u64,
    /// The world-state root after this transaction's staged writes were committed.
    pub state_root: alloy_primitives::B256,
}

/// Either a transaction was applied, or it failed pre-flight validation and is omitted
/// from the block's receipts list — the caller learns of the rejection but block
/// processing otherwise continues unaffected (§7's propagation policy).
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// The transaction was applied and produced a receipt.
    Applied(TransactionOutcome),
    /// The transaction failed pre-flight validation and was skipped.
    Rejected(PreflightError),
}

/// Runs the pre-flight checks and, on success, the full execution pipeline for `tx` against
/// `repo` rooted at the world state preceding it.
#[allow(clippy::too_many_arguments)]
pub fn execute_transaction<N, R, O, H>(
    repo: &mut StagingRepository<'_, N, R>,
    config: &ChainConfig,
    header: &Header,
    block_gas_used_so_far: u64,
    cumulative_gas_used: u64,
    tx: &Transaction,
    oracle: &O,
    block_hashes: &H,
) -> Result<ExecutionOutcome, ExecutorError>
where
    N: NodeStore,
    R: RawStore,
    O: EvmOracle,
    H: BlockHashProvider,
{
    let sender = match preflight(repo, config, header, block_gas_used_so_far, tx)? {
        Ok(sender) => sender,
        Err(rejection) => return Ok(ExecutionOutcome::Rejected(rejection)),
    };

    // Step 1: debit gas and increment the nonce; these survive even an EVM failure.
    let gas_cost = U256::from(tx.gas_limit) * tx.gas_price;
    repo.add_wei(sender, -i128::try_from(gas_cost).unwrap_or(i128::MAX))?;
    repo.increment_nonce(sender)?;

    let homestead_active = config.is_homestead_active(header.number);
    let g0 = intrinsic_gas(&tx.data, tx.is_create(), homestead_active);
    let call_gas = tx.gas_limit - g0;

    let (remaining_gas, sub_state, succeeded) = if tx.is_create() {
        let target = derive_create_address(sender, tx.nonce);
        repo.transfer(sender, target, tx.value)?;
        // Stage the init code as the (guaranteed fresh) target's code so the oracle's
        // `Call(target)` actually executes it; reverted below on any creation failure.
        repo.put_code(target, tx.data.clone())?;
        let env = ExecEnv {
            target,
            originator: sender,
            sender,
            gas_price: tx.gas_price,
            call_data: Bytes::new(),
            value: tx.value,
            machine_code: tx.data.clone(),
            stack_depth: 0,
            block_header: header,
        };
        let outcome = oracle.run(call_gas, &env, repo, block_hashes)?;
        if !outcome.succeeded {
            // Revert the value transfer before wiping the staged init code, so the
            // failed creation doesn't burn the endowment along with it.
            repo.transfer(target, sender, tx.value)?;
            repo.reset_account(target);
            (0, ethrs_primitives::SubState::new(), false)
        } else {
            let code = outcome.output.unwrap_or_default();
            let deploy_cost = code.len() as u64 * CODE_DEPOSIT_GAS_PER_BYTE;
            let too_large = config.is_spurious_dragon_active(header.number) && code.len() > MAX_CODE_SIZE;
            if too_large || outcome.gas_remaining < deploy_cost {
                repo.transfer(target, sender, tx.value)?;
                repo.reset_account(target);
                (0, ethrs_primitives::SubState::new(), false)
            } else {
                repo.put_code(target, code.clone())?;
                (outcome.gas_remaining - deploy_cost, outcome.sub_state, true)
            }
        }
    } else {
        let to = match tx.to {
            alloy_primitives::TxKind::Call(to) => to,
            alloy_primitives::TxKind::Create => unreachable!("is_create() already excluded this branch"),
        };
        repo.transfer(sender, to, tx.value)?;
        if let Some(result) = ethrs_evm::dispatch_precompile(to, &tx.data, call_gas, config, header.number) {
            match result {
                ethrs_evm::PrecompileResult::Success { gas_used, .. } => {
                    (call_gas - gas_used, ethrs_primitives::SubState::new(), true)
                }
                ethrs_evm::PrecompileResult::Failure => (0, ethrs_primitives::SubState::new(), false),
            }
        } else {
            let code_hash = repo.account(to)?.code_hash;
            let machine_code = repo.code_by_hash(code_hash);
            let env = ExecEnv {
                target: to,
                originator: sender,
                sender,
                gas_price: tx.gas_price,
                call_data: tx.data.clone(),
                value: tx.value,
                machine_code,
                stack_depth: 0,
                block_header: header,
            };
            let outcome = oracle.run(call_gas, &env, repo, block_hashes)?;
            (outcome.gas_remaining, outcome.sub_state, outcome.succeeded)
        }
    };

    // Step 3: refund formula (Yellow Paper §6.2).
    let refund = ((tx.gas_limit - remaining_gas) / 2).min(sub_state.refund_counter);
    let gas_used = tx.gas_limit - (remaining_gas + refund);

    // Step 4: settle gas with the sender and the beneficiary.
    repo.add_wei(sender, i128::try_from(U256::from(remaining_gas + refund) * tx.gas_price).unwrap_or(i128::MAX))?;
    repo.add_wei(header.beneficiary, i128::try_from(U256::from(gas_used) * tx.gas_price).unwrap_or(i128::MAX))?;

    if succeeded {
        // Step 5: reap self-destructs.
        for address in &sub_state.selfdestruct_set {
            repo.reset_account(*address);
        }
        if sub_state.selfdestruct_set.contains(&header.beneficiary) {
            repo.reset_account(header.beneficiary);
        }

        // Step 6: Spurious-Dragon empty-account pruning.
        if config.is_spurious_dragon_active(header.number) {
            for address in &sub_state.touched_accounts {
                if repo.account(*address)?.is_empty() {
                    repo.reset_account(*address);
                }
            }
        }
    }

    let state_root = repo.commit()?;

    let status_active = config.is_byzantium_active(header.number);
    let post_state_or_status =
        if status_active { PostStateOrStatus::Status(succeeded) } else { PostStateOrStatus::PostState(state_root) };
    let new_cumulative = cumulative_gas_used + gas_used;
    let receipt = Receipt {
        post_state_or_status,
        cumulative_gas_used: new_cumulative,
        logs_bloom: logs_bloom(&sub_state.logs),
        logs: sub_state.logs,
    };

    debug!(target: "executor", %sender, gas_used, succeeded, "applied transaction");
    Ok(ExecutionOutcome::Applied(TransactionOutcome { receipt, gas_used, state_root }))
}

/// Pre-flight validation stages 1-6. `Ok(Ok(sender))` on success, `Ok(Err(_))` for a
/// rejection that merely omits the transaction, and `Err(_)` only for a fatal state error.
fn preflight<N: NodeStore, R: RawStore>(
    repo: &mut StagingRepository<'_, N, R>,
    config: &ChainConfig,
    header: &Header,
    block_gas_used_so_far: u64,
    tx: &Transaction,
) -> Result<Result<Address, PreflightError>, ExecutorError> {
    let Ok(sender) = tx.recover_sender() else {
        return Ok(Err(PreflightError::InvalidSender));
    };
    if !repo.exists(sender)? {
        return Ok(Err(PreflightError::MissingAccount(sender)));
    }
    let account: Account = repo.account(sender)?;
    if account.nonce != tx.nonce {
        return Ok(Err(PreflightError::NonceMismatch { address: sender, account_nonce: account.nonce, tx_nonce: tx.nonce }));
    }
    let g0 = intrinsic_gas(&tx.data, tx.is_create(), config.is_homestead_active(header.number));
    if tx.gas_limit < g0 {
        return Ok(Err(PreflightError::InsufficientIntrinsicGas { required: g0, provided: tx.gas_limit }));
    }
    let v0 = U256::from(tx.gas_limit) * tx.gas_price + tx.value;
    if account.balance < v0 {
        return Ok(Err(PreflightError::InsufficientBalance(sender)));
    }
    if tx.gas_limit > header.gas_limit - block_gas_used_so_far {
        return Ok(Err(PreflightError::OverGasLimit));
    }
    Ok(Ok(sender))
}

/// `Keccak(rlp([sender, nonce]))[12:]`, the address a creation transaction deploys to.
fn derive_create_address(sender: Address, nonce: u64) -> Address {
    let mut items = Vec::new();
    sender.encode(&mut items);
    nonce.encode(&mut items);
    Address::from_slice(&keccak256(ethrs_primitives::wrap_list(items))[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_address_is_deterministic() {
        let sender = Address::repeat_byte(7);
        assert_eq!(derive_create_address(sender, 0), derive_create_address(sender, 0));
        assert_ne!(derive_create_address(sender, 0), derive_create_address(sender, 1));
    }
}
