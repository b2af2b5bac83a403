//! Block difficulty adjustment, piecewise by fork (Yellow Paper §4.3.4, as amended by
//! EIP-2/EIP-100): Frontier's simple sign-and-scale rule, Homestead's `timestamp_delta/10`
//! adjustment, and Byzantium's uncle-aware adjustment, each composed with the exponential
//! difficulty-bomb ("ice age") term once it applies.

use crate::config::ChainConfig;
use alloy_primitives::U256;

/// Computes the child block's difficulty from its parent, per the fork active at
/// `block_number`.
pub fn compute_difficulty(
    config: &ChainConfig,
    parent_difficulty: U256,
    parent_timestamp: u64,
    parent_has_ommers: bool,
    block_timestamp: u64,
    block_number: u64,
) -> U256 {
    let adjustment = if config.is_byzantium_active(block_number) {
        byzantium_adjustment(parent_timestamp, block_timestamp, parent_has_ommers)
    } else if config.is_homestead_active(block_number) {
        homestead_adjustment(parent_timestamp, block_timestamp)
    } else {
        frontier_adjustment(config, parent_timestamp, block_timestamp)
    };

    let base = parent_difficulty / config.difficulty_bound_divisor;
    let adjusted = apply_adjustment(parent_difficulty, base, adjustment);
    let bombed = adjusted + ice_age_term(config, block_number);

    bombed.max(config.minimum_difficulty)
}

/// Frontier (YP §4.3.4): `sign = +1` if the block arrived within `duration_limit` seconds
/// of its parent, else `-1`.
fn frontier_adjustment(config: &ChainConfig, parent_timestamp: u64, block_timestamp: u64) -> i64 {
    if block_timestamp.saturating_sub(parent_timestamp) < config.duration_limit {
        1
    } else {
        -1
    }
}

/// Homestead (EIP-2): `max(1 - timestamp_delta/10, -99)`.
fn homestead_adjustment(parent_timestamp: u64, block_timestamp: u64) -> i64 {
    let delta = (block_timestamp.saturating_sub(parent_timestamp)) as i64;
    (1 - delta / 10).max(-99)
}

/// Byzantium/Constantinople (EIP-100): like Homestead, but the baseline (`y`) is `2` when
/// the parent itself has ommers, `1` otherwise, and the divisor is `9`.
fn byzantium_adjustment(parent_timestamp: u64, block_timestamp: u64, parent_has_ommers: bool) -> i64 {
    let y = if parent_has_ommers { 2 } else { 1 };
    let delta = (block_timestamp.saturating_sub(parent_timestamp)) as i64;
    (y - delta / 9).max(-99)
}

fn apply_adjustment(parent_difficulty: U256, base: U256, adjustment: i64) -> U256 {
    if adjustment >= 0 {
        parent_difficulty + base * U256::from(adjustment as u64)
    } else {
        parent_difficulty.saturating_sub(base * U256::from(adjustment.unsigned_abs()))
    }
}

/// The exponential ice-age term, `2^(fake_block_number/100000 - 2)`, where
/// `fake_block_number = block_number - bomb_delay` (floored at zero), zero before Byzantium.
fn ice_age_term(config: &ChainConfig, block_number: u64) -> U256 {
    if !config.is_byzantium_active(block_number) {
        return U256::ZERO;
    }
    let fake_block_number = block_number.saturating_sub(config.byzantium_bomb_delay);
    let Some(exponent) = (fake_block_number / 100_000).checked_sub(2) else {
        return U256::ZERO;
    };
    if exponent >= 256 {
        return U256::ZERO;
    }
    U256::from(1u64) << (exponent as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChainConfig {
        ChainConfig {
            minimum_difficulty: U256::from(131_072u64),
            difficulty_bound_divisor: U256::from(2048u64),
            duration_limit: 13,
            homestead_block: Some(1_150_000),
            eip658_block: Some(4_370_000),
            byzantium_bomb_delay: 3_000_000,
            ..Default::default()
        }
    }

    #[test]
    fn frontier_increases_difficulty_for_a_fast_block() {
        let c = config();
        let difficulty = compute_difficulty(&c, U256::from(1_000_000u64), 1000, false, 1005, 100);
        assert!(difficulty > U256::from(1_000_000u64));
    }

    #[test]
    fn frontier_decreases_difficulty_for_a_slow_block() {
        let c = config();
        let difficulty = compute_difficulty(&c, U256::from(1_000_000u64), 1000, false, 1100, 100);
        assert!(difficulty < U256::from(1_000_000u64));
    }

    #[test]
    fn difficulty_never_drops_below_the_configured_minimum() {
        let c = config();
        let difficulty = compute_difficulty(&c, U256::from(131_072u64), 1000, false, 100_000, 100);
        assert_eq!(difficulty, U256::from(131_072u64));
    }

    #[test]
    fn byzantium_adjustment_is_more_lenient_with_an_unclad_parent() {
        let c = config();
        let with_ommers = compute_difficulty(&c, U256::from(1_000_000_000u64), 1000, true, 1010, 5_000_000);
        let without_ommers = compute_difficulty(&c, U256::from(1_000_000_000u64), 1000, false, 1010, 5_000_000);
        assert!(with_ommers > without_ommers);
    }

    #[test]
    fn ice_age_term_is_zero_before_byzantium() {
        let c = config();
        assert_eq!(ice_age_term(&c, 1_000_000), U256::ZERO);
    }

    #[test]
    fn ice_age_term_grows_once_byzantium_is_active_and_delay_exhausted() {
        let c = config();
        assert!(ice_age_term(&c, 4_400_000) > U256::ZERO);
    }
}
