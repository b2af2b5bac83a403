//! `ExecEnv`: the execution environment handed to the EVM oracle (§6).

use alloy_primitives::{Address, Bytes, U256};
use ethrs_primitives::Header;

/// Everything a single EVM invocation (message call, contract creation, or precompile
/// dispatch) needs besides the mutable account state it reaches through the staging
/// repository passed alongside it.
#[derive(Debug, Clone)]
pub struct ExecEnv<'a> {
    /// The account this call executes against (a contract's own address, or the
    /// newly-derived address for a creation).
    pub target: Address,
    /// The externally-owned account that originated the enclosing transaction.
    pub originator: Address,
    /// The immediate caller of this invocation (equal to `originator` at depth 0).
    pub sender: Address,
    /// Gas price of the enclosing transaction, for opcodes that read it back (`GASPRICE`).
    pub gas_price: U256,
    /// Call input (message call) or constructor arguments appended to init code.
    pub call_data: Bytes,
    /// Value transferred by this invocation.
    pub value: U256,
    /// The code being executed: the target's deployed code for a call, or the init code
    /// for a creation.
    pub machine_code: Bytes,
    /// Current call-stack depth; zero at the outermost invocation of a transaction.
    pub stack_depth: u32,
    /// The block this invocation executes within.
    pub block_header: &'a Header,
}
