//! Intrinsic gas: the flat cost a transaction pays before a single opcode runs (§4.5 step 4).

const TX_BASE_GAS: u64 = 21_000;
const TX_DATA_ZERO_GAS: u64 = 4;
const TX_DATA_NONZERO_GAS: u64 = 68;
const TX_CREATE_GAS: u64 = 32_000;

/// `21000 + 4 per zero input byte + 68 per nonzero input byte`, plus `32000` for a
/// contract-creation transaction once Homestead is active.
pub fn intrinsic_gas(input_data: &[u8], is_creation: bool, homestead_active: bool) -> u64 {
    let data_cost: u64 = input_data
        .iter()
        .map(|byte| if *byte == 0 { TX_DATA_ZERO_GAS } else { TX_DATA_NONZERO_GAS })
        .sum();
    let creation_cost = if is_creation && homestead_active { TX_CREATE_GAS } else { 0 };
    TX_BASE_GAS + data_cost + creation_cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_cost_with_no_data() {
        assert_eq!(intrinsic_gas(&[], false, true), TX_BASE_GAS);
    }

    #[test]
    fn zero_and_nonzero_bytes_cost_differently() {
        assert_eq!(intrinsic_gas(&[0, 0], false, true), TX_BASE_GAS + 2 * TX_DATA_ZERO_GAS);
        assert_eq!(intrinsic_gas(&[1, 2], false, true), TX_BASE_GAS + 2 * TX_DATA_NONZERO_GAS);
    }

    #[test]
    fn creation_adds_32000_only_once_homestead_is_active() {
        assert_eq!(intrinsic_gas(&[], true, true), TX_BASE_GAS + TX_CREATE_GAS);
        assert_eq!(intrinsic_gas(&[], true, false), TX_BASE_GAS);
    }
}
