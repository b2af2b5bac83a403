//! Transient execution state accumulated while running a transaction.

use crate::log::Log;
use alloy_primitives::Address;
use std::collections::HashSet;

/// Side effects accrued over the course of a single transaction's execution, folded into
/// the block-level result only once the transaction is known to succeed (or, for the
/// refund counter and self-destructs, per the Yellow Paper's settlement rules regardless).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubState {
    /// Accounts marked for deletion at the end of the transaction.
    pub selfdestruct_set: HashSet<Address>,
    /// Accounts touched during execution, relevant to Spurious Dragon empty-account pruning.
    pub touched_accounts: HashSet<Address>,
    /// Logs emitted, in emission order.
    pub logs: Vec<Log>,
    /// Accumulated gas refund counter (pre-clamp; clamped against the used-gas cap by the
    /// caller per the Yellow Paper's refund formula).
    pub refund_counter: u64,
}

impl SubState {
    /// An empty substate, as seen at the start of a transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `other` into `self`, as when a nested call's substate is folded into its
    /// caller's after a successful `CALL`/`CREATE`.
    pub fn absorb(&mut self, other: SubState) {
        self.selfdestruct_set.extend(other.selfdestruct_set);
        self.touched_accounts.extend(other.touched_accounts);
        self.logs.extend(other.logs);
        self.refund_counter += other.refund_counter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;

    #[test]
    fn absorb_merges_all_fields() {
        let mut a = SubState::new();
        a.touched_accounts.insert(Address::repeat_byte(1));
        a.refund_counter = 10;

        let mut b = SubState::new();
        b.selfdestruct_set.insert(Address::repeat_byte(2));
        b.logs.push(Log { address: Address::repeat_byte(3), topics: vec![], data: Bytes::new() });
        b.refund_counter = 5;

        a.absorb(b);

        assert_eq!(a.touched_accounts.len(), 1);
        assert_eq!(a.selfdestruct_set.len(), 1);
        assert_eq!(a.logs.len(), 1);
        assert_eq!(a.refund_counter, 15);
    }

    #[test]
    fn new_substate_is_empty() {
        let substate = SubState::new();
        assert!(substate.selfdestruct_set.is_empty());
        assert!(substate.touched_accounts.is_empty());
        assert!(substate.logs.is_empty());
        assert_eq!(substate.refund_counter, 0);
    }
}
