//! The §6 EVM oracle: `run(gas, env) -> (gas_remaining, sub_state, env', output)`, backed by
//! `revm`'s interpreter over the [`StagingDb`] adapter.

use crate::db::{BlockHashProvider, StagingDb};
use crate::env::ExecEnv;
use crate::errors::EvmError;
use alloy_primitives::{Bytes, U256};
use ethrs_primitives::{Log, SubState};
use ethrs_state::StagingRepository;
use ethrs_trie::{NodeStore, RawStore};
use revm::primitives::{ExecutionResult, ResultAndState, TransactTo};
use revm::EvmBuilder;
use tracing::debug;

/// The result of a single call into the EVM oracle.
#[derive(Debug)]
pub struct OracleOutcome {
    /// Gas left over after the call, refunded to the caller by the executor.
    pub gas_remaining: u64,
    /// Logs, touched accounts, self-destructs, and the refund counter accumulated by
    /// this call (and anything it called into).
    pub sub_state: SubState,
    /// The call's return data, or `None` if it reverted or halted.
    pub output: Option<Bytes>,
    /// Whether the call succeeded; a post-Byzantium receipt's status bit mirrors this.
    pub succeeded: bool,
}

/// Runs a single message call or contract creation against a staging repository.
///
/// Implementations MUST NOT mutate any state outside the `account_repo` passed to them;
/// [`RevmOracle`] upholds this by running `revm` against an adapter over that repository and
/// translating the resulting diff back into it by hand, rather than letting `revm` own
/// persistence.
pub trait EvmOracle {
    /// Executes `env.machine_code` against `env.target`, with up to `gas` gas, applying any
    /// resulting state change directly to `repo`.
    fn run<N: NodeStore, R: RawStore, H: BlockHashProvider>(
        &self,
        gas: u64,
        env: &ExecEnv<'_>,
        repo: &mut StagingRepository<'_, N, R>,
        block_hashes: &H,
    ) -> Result<OracleOutcome, EvmError>;
}

/// The default oracle, backed by `revm`'s interpreter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevmOracle;

impl EvmOracle for RevmOracle {
    fn run<N: NodeStore, R: RawStore, H: BlockHashProvider>(
        &self,
        gas: u64,
        env: &ExecEnv<'_>,
        repo: &mut StagingRepository<'_, N, R>,
        block_hashes: &H,
    ) -> Result<OracleOutcome, EvmError> {
        let db = StagingDb::new(repo, block_hashes);
        let mut evm = EvmBuilder::default()
            .with_db(db)
            .modify_tx_env(|tx| {
                tx.caller = env.sender;
                tx.transact_to = TransactTo::Call(env.target);
                // The executor already moved `env.value` sender-to-target and debited
                // `gas_limit * gas_price` from the sender before invoking the oracle (§4.5
                // steps 1-2); zeroing these here stops revm's own internal fee/value
                // mechanics (`deduct_caller`/`reimburse_caller`/the call frame's value
                // transfer) from re-applying the same movement a second time. Gas-unit
                // metering in `ExecutionResult` is price-independent, so this doesn't
                // affect `gas_used`/`gas_refunded`. Trade-off: `CALLVALUE`/`GASPRICE` read
                // zero inside code run through this oracle.
                tx.value = U256::ZERO;
                tx.data = env.call_data.clone();
                tx.gas_limit = gas;
                tx.gas_price = U256::ZERO;
                // Nonce and intrinsic-balance checks are the executor's job (§4.5 stages
                // 1-6, run before the oracle is ever invoked); skip revm's own copies.
                tx.nonce = None;
            })
            .modify_cfg_env(|cfg| {
                cfg.disable_balance_check = true;
                cfg.disable_nonce_check = true;
            })
            .modify_block_env(|block| {
                block.number = U256::from(env.block_header.number);
                block.timestamp = U256::from(env.block_header.timestamp);
                block.gas_limit = U256::from(env.block_header.gas_limit);
                block.basefee = U256::ZERO;
                block.coinbase = env.block_header.beneficiary;
                block.difficulty = env.block_header.difficulty;
            })
            .build();

        let ResultAndState { result, state } =
            evm.transact().map_err(|e| EvmError::Revm(format!("{e:?}")))?;
        drop(evm);

        let mut sub_state = SubState::new();
        for (address, account) in &state {
            if !account.is_touched() {
                continue;
            }
            sub_state.touched_accounts.insert(*address);
            if account.is_selfdestructed() {
                sub_state.selfdestruct_set.insert(*address);
                if *address != env.sender {
                    repo.reset_account(*address);
                }
                continue;
            }
            // The caller's own balance/nonce are the executor's bookkeeping alone (§4.5
            // steps 1, 2, and 4): with value/gas_price zeroed above, revm's `account.info`
            // for `env.sender` only reflects its own internal (now no-op) fee mechanics and
            // the unconditional nonce bump `transact()` applies regardless of
            // `disable_nonce_check`, neither of which should land back in `repo`.
            if *address != env.sender {
                repo.set_balance_and_nonce(*address, account.info.balance, account.info.nonce)?;
            }
            if let Some(code) = &account.info.code {
                if !code.is_empty() {
                    repo.put_code(*address, Bytes::from(code.original_bytes().to_vec()))?;
                }
            }
            for (slot, value) in &account.storage {
                if value.is_changed() {
                    repo.put_storage(*address, *slot, value.present_value)?;
                }
            }
        }

        let (succeeded, output, gas_used) = match &result {
            ExecutionResult::Success { output, gas_used, logs, gas_refunded, .. } => {
                sub_state.refund_counter = *gas_refunded;
                sub_state.logs = logs
                    .iter()
                    .map(|log| Log {
                        address: log.address,
                        topics: log.data.topics().to_vec(),
                        data: Bytes::from(log.data.data.to_vec()),
                    })
                    .collect();
                (true, Some(Bytes::from(output.data().to_vec())), *gas_used)
            }
            ExecutionResult::Revert { output, gas_used } => (false, Some(output.clone()), *gas_used),
            ExecutionResult::Halt { gas_used, .. } => (false, None, *gas_used),
        };

        debug!(target: "evm", %succeeded, gas_used, "oracle call finished");
        Ok(OracleOutcome { gas_remaining: gas.saturating_sub(gas_used), sub_state, output, succeeded })
    }
}
