//! `ChainConfig`: the in-memory shape fed by out-of-scope JSON parsing (§6), and the
//! hardfork-gating predicates every other crate consults to pick fork-dependent behavior.

use alloy_primitives::{Address, U256};

/// Genesis block parameters and initial account balances, consumed by the genesis builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenesisConfig {
    /// Genesis timestamp.
    pub timestamp: u64,
    /// Genesis difficulty.
    pub difficulty: U256,
    /// Genesis gas limit.
    pub gas_limit: u64,
    /// Genesis extra data.
    pub extra_data: alloy_primitives::Bytes,
    /// Genesis beneficiary (coinbase).
    pub beneficiary: Address,
    /// Genesis proof-of-work mix hash.
    pub mix_hash: alloy_primitives::B256,
    /// Genesis proof-of-work nonce.
    pub nonce: alloy_primitives::B64,
    /// Pre-funded accounts. Entries lacking a balance are skipped by the genesis builder.
    pub accounts: Vec<GenesisAccount>,
}

/// A single pre-funded account in the genesis configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenesisAccount {
    /// The account's address.
    pub address: Address,
    /// The account's starting balance, if any. A missing balance means the genesis
    /// builder skips this entry entirely.
    pub balance: Option<U256>,
    /// The account's starting nonce.
    pub nonce: u64,
    /// The account's starting code, if any.
    pub code: Option<alloy_primitives::Bytes>,
}

/// The Ethereum mainnet-era chain configuration: difficulty/gas parameters, per-EIP
/// block-number activation gates, and the DAO hardfork's irregular-state-transition data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainConfig {
    /// Network identifier, as sent in the `p2p` handshake (out of this core's scope, but
    /// carried for completeness).
    pub network_id: u64,
    /// The floor below which difficulty may never drop.
    pub minimum_difficulty: U256,
    /// Divisor bounding the difficulty's per-block adjustment.
    pub difficulty_bound_divisor: U256,
    /// Frontier's block-interval threshold (seconds) for the difficulty adjustment sign.
    pub duration_limit: u64,
    /// Fork-dependent block reward, by activation block number (ascending; the reward in
    /// effect is the last entry whose block is `<= block_number`).
    pub block_rewards: Vec<(u64, U256)>,
    /// Divisor bounding a block's gas-limit adjustment from its parent.
    pub gas_limit_bound_divisor: u64,
    /// The floor below which `gas_limit` may never drop.
    pub min_gas_limit: u64,
    /// EIP-170's maximum deployed contract code size, in bytes.
    pub max_code_size: u64,

    /// Homestead activation block (EIP-2/EIP-7/EIP-8): creation-gas surcharge, new
    /// difficulty formula, and contract-creation `CALL` depth semantics.
    pub homestead_block: Option<u64>,
    /// EIP-150 activation block ("Tangerine Whistle"): gas repricing.
    pub eip150_block: Option<u64>,
    /// EIP-160 activation block: `EXP` gas repricing, bundled with Spurious Dragon.
    pub eip160_block: Option<u64>,
    /// EIP-161 activation block ("Spurious Dragon"): empty-account state clearing and
    /// EIP-170's code-size cap.
    pub eip161_block: Option<u64>,
    /// EIP-155 activation block: chain-id-scoped replay protection.
    pub eip155_block: Option<u64>,
    /// EIP-140 activation block (Byzantium): the `REVERT` opcode.
    pub eip140_block: Option<u64>,
    /// EIP-211 activation block (Byzantium): `RETURNDATASIZE`/`RETURNDATACOPY`.
    pub eip211_block: Option<u64>,
    /// EIP-214 activation block (Byzantium): `STATICCALL`.
    pub eip214_block: Option<u64>,
    /// EIP-658 activation block (Byzantium): receipt status byte replaces post-state root.
    pub eip658_block: Option<u64>,
    /// EIP-1283 activation block (Constantinople): net-metered `SSTORE` gas.
    pub eip1283_block: Option<u64>,
    /// EIP-145 activation block (Constantinople): bitwise shifting opcodes.
    pub eip145_block: Option<u64>,
    /// EIP-1014 activation block (Constantinople): `CREATE2`.
    pub eip1014_block: Option<u64>,
    /// EIP-1052 activation block (Constantinople): `EXTCODEHASH`.
    pub eip1052_block: Option<u64>,

    /// The fixed-size ice-age delay (in blocks) subtracted from the block number before
    /// computing the difficulty bomb's exponential term, once Byzantium is active.
    pub byzantium_bomb_delay: u64,

    /// The DAO hardfork's activation block number, if configured for this network.
    pub dao_fork_block: Option<u64>,
    /// Accounts whose full balance is swept to [`Self::dao_fork_beneficiary`] at
    /// `dao_fork_block`.
    pub dao_drain_accounts: Vec<Address>,
    /// The account that receives every drained balance.
    pub dao_fork_beneficiary: Address,
    /// The required `extra_data` marker bytes for the DAO fork's extra-data window.
    pub dao_fork_extra_data: alloy_primitives::Bytes,
    /// The number of blocks, starting at `dao_fork_block`, over which `extra_data` must
    /// match [`Self::dao_fork_extra_data`].
    pub dao_fork_extra_data_range: u64,

    /// Genesis parameters and pre-funded accounts.
    pub genesis: GenesisConfig,
}

impl ChainConfig {
    /// Whether Homestead is active at `block_number`.
    pub fn is_homestead_active(&self, block_number: u64) -> bool {
        self.homestead_block.is_some_and(|b| block_number >= b)
    }

    /// Whether EIP-150 ("Tangerine Whistle") is active at `block_number`.
    pub fn is_eip150_active(&self, block_number: u64) -> bool {
        self.eip150_block.is_some_and(|b| block_number >= b)
    }

    /// Whether EIP-160 is active at `block_number`.
    pub fn is_eip160_active(&self, block_number: u64) -> bool {
        self.eip160_block.is_some_and(|b| block_number >= b)
    }

    /// Whether EIP-161 ("Spurious Dragon" state clearing, plus EIP-170's code-size cap)
    /// is active at `block_number`.
    pub fn is_spurious_dragon_active(&self, block_number: u64) -> bool {
        self.eip161_block.is_some_and(|b| block_number >= b)
    }

    /// Whether EIP-155 replay-protected signing is active at `block_number`.
    pub fn is_eip155_active(&self, block_number: u64) -> bool {
        self.eip155_block.is_some_and(|b| block_number >= b)
    }

    /// Whether Byzantium (receipt status bytes, `REVERT`/`RETURNDATASIZE`/`STATICCALL`,
    /// and precompiles 5-8) is active at `block_number`.
    pub fn is_byzantium_active(&self, block_number: u64) -> bool {
        self.eip658_block.is_some_and(|b| block_number >= b)
    }

    /// Whether Constantinople (`SSTORE` net-metering, bitwise shifts, `CREATE2`,
    /// `EXTCODEHASH`) is active at `block_number`.
    pub fn is_constantinople_active(&self, block_number: u64) -> bool {
        self.eip1283_block.is_some_and(|b| block_number >= b)
            && self.eip145_block.is_some_and(|b| block_number >= b)
            && self.eip1014_block.is_some_and(|b| block_number >= b)
            && self.eip1052_block.is_some_and(|b| block_number >= b)
    }

    /// Whether `block_number` falls within the DAO fork's required extra-data window.
    pub fn is_dao_extra_data_window(&self, block_number: u64) -> bool {
        match self.dao_fork_block {
            Some(fork) => block_number >= fork && block_number < fork + self.dao_fork_extra_data_range,
            None => false,
        }
    }

    /// The block reward in effect at `block_number`: the value of the last configured
    /// `(activation_block, reward)` entry whose activation is `<= block_number`, or zero
    /// if none apply (e.g. a network with no configured rewards).
    pub fn block_reward(&self, block_number: u64) -> U256 {
        self.block_rewards
            .iter()
            .filter(|(activation, _)| *activation <= block_number)
            .max_by_key(|(activation, _)| *activation)
            .map_or(U256::ZERO, |(_, reward)| *reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChainConfig {
        ChainConfig {
            homestead_block: Some(1_150_000),
            eip150_block: Some(2_463_000),
            eip160_block: Some(2_675_000),
            eip161_block: Some(2_675_000),
            eip155_block: Some(2_675_000),
            eip658_block: Some(4_370_000),
            eip1283_block: Some(7_280_000),
            eip145_block: Some(7_280_000),
            eip1014_block: Some(7_280_000),
            eip1052_block: Some(7_280_000),
            dao_fork_block: Some(1_920_000),
            dao_fork_extra_data_range: 10,
            dao_fork_extra_data: alloy_primitives::Bytes::from_static(b"dao-hard-fork"),
            block_rewards: vec![
                (0, U256::from(5_000_000_000_000_000_000u64)),
                (4_370_000, U256::from(3_000_000_000_000_000_000u64)),
                (7_280_000, U256::from(2_000_000_000_000_000_000u64)),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn homestead_gates_at_its_block() {
        let c = config();
        assert!(!c.is_homestead_active(1_149_999));
        assert!(c.is_homestead_active(1_150_000));
    }

    #[test]
    fn unconfigured_forks_never_activate() {
        let c = ChainConfig::default();
        assert!(!c.is_homestead_active(u64::MAX));
        assert!(!c.is_byzantium_active(u64::MAX));
    }

    #[test]
    fn dao_extra_data_window_is_bounded() {
        let c = config();
        assert!(!c.is_dao_extra_data_window(1_919_999));
        assert!(c.is_dao_extra_data_window(1_920_000));
        assert!(c.is_dao_extra_data_window(1_920_009));
        assert!(!c.is_dao_extra_data_window(1_920_010));
    }

    #[test]
    fn block_reward_steps_down_by_fork() {
        let c = config();
        assert_eq!(c.block_reward(0), U256::from(5_000_000_000_000_000_000u64));
        assert_eq!(c.block_reward(4_370_000), U256::from(3_000_000_000_000_000_000u64));
        assert_eq!(c.block_reward(7_280_000), U256::from(2_000_000_000_000_000_000u64));
        assert_eq!(c.block_reward(7_279_999), U256::from(3_000_000_000_000_000_000u64));
    }

    #[test]
    fn constantinople_requires_every_constituent_eip() {
        let mut c = config();
        assert!(c.is_constantinople_active(7_280_000));
        c.eip1052_block = None;
        assert!(!c.is_constantinople_active(7_280_000));
    }
}
