//! Precompiled contracts: addresses 1-4 are dispatched unconditionally, 5-8 only once
//! Byzantium is active (§4.5, supplemented feature #6).

use alloy_primitives::{Address, Bytes};
use ethrs_consensus::ChainConfig;
use num_bigint::BigUint;
use ripemd::Ripemd160;
use revm::precompile::bn128;
use sha2::{Digest, Sha256};

/// The result of running a precompiled contract: either successful output, or a failure
/// that consumes all of the gas handed to it (mirroring an EVM `REVERT`-less failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrecompileResult {
    /// The precompile ran to completion, consuming `gas_used` and producing `output`.
    Success { gas_used: u64, output: Bytes },
    /// The precompile failed (insufficient gas or malformed input); all gas is consumed.
    Failure,
}

const ECRECOVER: u64 = 1;
const SHA256: u64 = 2;
const RIPEMD160: u64 = 3;
const IDENTITY: u64 = 4;
const MODEXP: u64 = 5;
const BN_ADD: u64 = 6;
const BN_MUL: u64 = 7;
const BN_PAIRING: u64 = 8;

/// Returns the precompile's address index (1-8) if `address` names one active at
/// `block_number`, or `None` if `address` is not a precompile (or names one not yet
/// activated by the chain config).
fn index_of(address: Address, config: &ChainConfig, block_number: u64) -> Option<u64> {
    let mut bytes = [0u8; 20];
    bytes[19] = match address.as_slice() {
        [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, n] => *n,
        _ => return None,
    };
    let index = u64::from(bytes[19]);
    match index {
        1..=4 => Some(index),
        5..=8 if config.is_byzantium_active(block_number) => Some(index),
        _ => None,
    }
}

/// Dispatches `address` as a precompiled contract if it names one active at
/// `block_number`, running it against `input` within `gas_limit`.
pub fn dispatch(address: Address, input: &Bytes, gas_limit: u64, config: &ChainConfig, block_number: u64) -> Option<PrecompileResult> {
    let index = index_of(address, config, block_number)?;
    Some(match index {
        ECRECOVER => run_ecrecover(input, gas_limit),
        SHA256 => run_sha256(input, gas_limit),
        RIPEMD160 => run_ripemd160(input, gas_limit),
        IDENTITY => run_identity(input, gas_limit),
        MODEXP => run_modexp(input, gas_limit),
        BN_ADD => run_bn_add(input, gas_limit),
        BN_MUL => run_bn_mul(input, gas_limit),
        BN_PAIRING => run_bn_pairing(input, gas_limit),
        _ => unreachable!("index_of only returns 1..=8"),
    })
}

fn run_bn_add(input: &Bytes, gas_limit: u64) -> PrecompileResult {
    match bn128::add::run(input, bn128::add::BYZANTIUM_ADD_GAS_COST, gas_limit) {
        Ok(output) => PrecompileResult::Success { gas_used: output.gas_used, output: output.bytes },
        Err(_) => PrecompileResult::Failure,
    }
}

fn run_bn_mul(input: &Bytes, gas_limit: u64) -> PrecompileResult {
    match bn128::mul::run(input, bn128::mul::BYZANTIUM_MUL_GAS_COST, gas_limit) {
        Ok(output) => PrecompileResult::Success { gas_used: output.gas_used, output: output.bytes },
        Err(_) => PrecompileResult::Failure,
    }
}

fn run_bn_pairing(input: &Bytes, gas_limit: u64) -> PrecompileResult {
    match bn128::pair::run(input, bn128::pair::BYZANTIUM_PAIR_PER_POINT, bn128::pair::BYZANTIUM_PAIR_BASE, gas_limit) {
        Ok(output) => PrecompileResult::Success { gas_used: output.gas_used, output: output.bytes },
        Err(_) => PrecompileResult::Failure,
    }
}

fn run_ecrecover(input: &Bytes, gas_limit: u64) -> PrecompileResult {
    const GAS: u64 = 3_000;
    if gas_limit < GAS {
        return PrecompileResult::Failure;
    }
    let mut padded = [0u8; 128];
    let len = input.len().min(128);
    padded[..len].copy_from_slice(&input[..len]);

    let hash = alloy_primitives::B256::from_slice(&padded[0..32]);
    let v = alloy_primitives::U256::from_be_slice(&padded[32..64]);
    let r = alloy_primitives::U256::from_be_slice(&padded[64..96]);
    let s = alloy_primitives::U256::from_be_slice(&padded[96..128]);

    let Ok(v) = u8::try_from(v) else { return PrecompileResult::Success { gas_used: GAS, output: Bytes::new() } };
    if v != 27 && v != 28 {
        return PrecompileResult::Success { gas_used: GAS, output: Bytes::new() };
    }

    let Ok(signature) = alloy_primitives::Signature::from_rs_and_parity(r, s, v - 27 == 1) else {
        return PrecompileResult::Success { gas_used: GAS, output: Bytes::new() };
    };
    match signature.recover_address_from_prehash(&hash) {
        Ok(address) => {
            let mut output = [0u8; 32];
            output[12..].copy_from_slice(address.as_slice());
            PrecompileResult::Success { gas_used: GAS, output: Bytes::from(output.to_vec()) }
        }
        Err(_) => PrecompileResult::Success { gas_used: GAS, output: Bytes::new() },
    }
}

fn run_sha256(input: &Bytes, gas_limit: u64) -> PrecompileResult {
    let words = input.len().div_ceil(32) as u64;
    let gas_used = 60 + 12 * words;
    if gas_limit < gas_used {
        return PrecompileResult::Failure;
    }
    let digest = Sha256::digest(input);
    PrecompileResult::Success { gas_used, output: Bytes::from(digest.to_vec()) }
}

fn run_ripemd160(input: &Bytes, gas_limit: u64) -> PrecompileResult {
    let words = input.len().div_ceil(32) as u64;
    let gas_used = 600 + 120 * words;
    if gas_limit < gas_used {
        return PrecompileResult::Failure;
    }
    let digest = Ripemd160::digest(input);
    let mut output = [0u8; 32];
    output[12..].copy_from_slice(&digest);
    PrecompileResult::Success { gas_used, output: Bytes::from(output.to_vec()) }
}

fn run_identity(input: &Bytes, gas_limit: u64) -> PrecompileResult {
    let words = input.len().div_ceil(32) as u64;
    let gas_used = 15 + 3 * words;
    if gas_limit < gas_used {
        return PrecompileResult::Failure;
    }
    PrecompileResult::Success { gas_used, output: input.clone() }
}

/// A minimal, gas-metered `MODEXP` (EIP-198): `base^exponent mod modulus`, all arbitrary
/// length big-endian integers. Gas cost uses the pre-EIP-2565 quadratic-complexity formula.
fn run_modexp(input: &Bytes, gas_limit: u64) -> PrecompileResult {
    let read_len = |offset: usize| -> usize {
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = input.get(offset + i).copied().unwrap_or(0);
        }
        alloy_primitives::U256::from_be_bytes(bytes).try_into().unwrap_or(usize::MAX)
    };
    let base_len = read_len(0);
    let exp_len = read_len(32);
    let mod_len = read_len(64);

    let data_start = 96;
    let mut offset = data_start;
    let base = BigUint::from_bytes_be(&read_segment(input, offset, base_len));
    offset += base_len;
    let exponent_bytes = read_segment(input, offset, exp_len);
    let exponent = BigUint::from_bytes_be(&exponent_bytes);
    offset += exp_len;
    let modulus = BigUint::from_bytes_be(&read_segment(input, offset, mod_len));

    let gas_used = modexp_gas_cost(base_len, exp_len, mod_len, &exponent_bytes);
    if gas_limit < gas_used {
        return PrecompileResult::Failure;
    }

    if modulus == BigUint::from(0u8) {
        return PrecompileResult::Success { gas_used, output: Bytes::from(vec![0u8; mod_len]) };
    }
    let result = base.modpow(&exponent, &modulus);
    let mut output = result.to_bytes_be();
    if output.len() < mod_len {
        let mut padded = vec![0u8; mod_len - output.len()];
        padded.extend_from_slice(&output);
        output = padded;
    }
    PrecompileResult::Success { gas_used, output: Bytes::from(output) }
}

fn read_segment(input: &Bytes, offset: usize, len: usize) -> Vec<u8> {
    (0..len).map(|i| input.get(offset + i).copied().unwrap_or(0)).collect()
}

fn modexp_gas_cost(base_len: usize, exp_len: usize, mod_len: usize, exponent: &[u8]) -> u64 {
    let max_len = base_len.max(mod_len) as u64;
    let words = max_len.div_ceil(8);
    let complexity = words * words;
    let exp_leading_zeros = exponent.iter().take_while(|b| **b == 0).count();
    let significant_exp_bits = (exp_len.saturating_sub(exp_leading_zeros) * 8) as u64;
    let adjusted_exp_len = significant_exp_bits.max(1).ilog2() as u64 + 1;
    (complexity * adjusted_exp_len.max(1) / 20).max(200)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byzantium_config() -> ChainConfig {
        ChainConfig { eip658_block: Some(0), ..Default::default() }
    }

    #[test]
    fn identity_echoes_its_input() {
        let input = Bytes::from_static(b"hello world");
        match dispatch(Address::with_last_byte(4), &input, 1_000, &ChainConfig::default(), 0).unwrap() {
            PrecompileResult::Success { output, .. } => assert_eq!(output, input),
            PrecompileResult::Failure => panic!("expected success"),
        }
    }

    #[test]
    fn sha256_matches_the_standard_digest() {
        let input = Bytes::from_static(b"abc");
        match dispatch(Address::with_last_byte(2), &input, 1_000, &ChainConfig::default(), 0).unwrap() {
            PrecompileResult::Success { output, .. } => {
                assert_eq!(output.as_ref(), Sha256::digest(b"abc").as_slice());
            }
            PrecompileResult::Failure => panic!("expected success"),
        }
    }

    #[test]
    fn precompiles_5_through_8_are_inactive_before_byzantium() {
        assert!(dispatch(Address::with_last_byte(5), &Bytes::new(), 1_000_000, &ChainConfig::default(), 0).is_none());
    }

    #[test]
    fn modexp_is_dispatched_once_byzantium_is_active() {
        assert!(dispatch(Address::with_last_byte(5), &Bytes::new(), 1_000_000, &byzantium_config(), 0).is_some());
    }

    #[test]
    fn bn_add_of_two_points_at_infinity_is_the_point_at_infinity() {
        let input = Bytes::from(vec![0u8; 128]);
        match dispatch(Address::with_last_byte(6), &input, 1_000_000, &byzantium_config(), 0).unwrap() {
            PrecompileResult::Success { output, .. } => assert_eq!(output.as_ref(), &[0u8; 64]),
            PrecompileResult::Failure => panic!("expected success"),
        }
    }

    #[test]
    fn bn_pairing_of_an_empty_input_is_valid() {
        match dispatch(Address::with_last_byte(8), &Bytes::new(), 1_000_000, &byzantium_config(), 0).unwrap() {
            PrecompileResult::Success { output, .. } => {
                let mut expected = [0u8; 32];
                expected[31] = 1;
                assert_eq!(output.as_ref(), &expected);
            }
            PrecompileResult::Failure => panic!("expected success"),
        }
    }

    #[test]
    fn non_precompile_addresses_are_not_dispatched() {
        assert!(dispatch(Address::repeat_byte(0xaa), &Bytes::new(), 1_000_000, &byzantium_config(), 0).is_none());
    }

    #[test]
    fn underfunded_calls_fail_without_refund() {
        match dispatch(Address::with_last_byte(2), &Bytes::from_static(b"abc"), 10, &ChainConfig::default(), 0).unwrap() {
            PrecompileResult::Failure => {}
            PrecompileResult::Success { .. } => panic!("expected failure"),
        }
    }
}
