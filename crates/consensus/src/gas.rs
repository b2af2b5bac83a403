//! Gas-limit bound validation (§4.6): a child's gas limit may drift from its parent's only
//! within a fork-configured fraction, and never below the configured floor.

use crate::config::ChainConfig;
use thiserror::Error;

/// The error raised when a proposed gas limit falls outside its parent-bounded range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("gas limit {new} is out of bounds for parent gas limit {parent}")]
pub struct InvalidGasLimit {
    /// The parent block's gas limit.
    pub parent: u64,
    /// The rejected candidate gas limit.
    pub new: u64,
}

/// Validates that `new_gas_limit` satisfies `|new - parent| < parent / gas_limit_bound_divisor`
/// and `new >= min_gas_limit`.
pub fn validate_gas_limit(config: &ChainConfig, parent_gas_limit: u64, new_gas_limit: u64) -> Result<(), InvalidGasLimit> {
    let bound = parent_gas_limit / config.gas_limit_bound_divisor;
    let delta = parent_gas_limit.abs_diff(new_gas_limit);

    if delta >= bound || new_gas_limit < config.min_gas_limit {
        return Err(InvalidGasLimit { parent: parent_gas_limit, new: new_gas_limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChainConfig {
        ChainConfig { gas_limit_bound_divisor: 1024, min_gas_limit: 5000, ..Default::default() }
    }

    #[test]
    fn accepts_a_gas_limit_within_bounds() {
        assert!(validate_gas_limit(&config(), 10_000_000, 10_000_500).is_ok());
    }

    #[test]
    fn rejects_a_gas_limit_that_drifts_too_far() {
        assert!(validate_gas_limit(&config(), 10_000_000, 10_100_000).is_err());
    }

    #[test]
    fn rejects_a_gas_limit_below_the_configured_floor() {
        assert!(validate_gas_limit(&config(), 5001, 4999).is_err());
    }
}
