//! The §4.5 transaction executor: pre-flight validation, gas debit, EVM/precompile
//! dispatch, refund settlement, self-destruct reaping, and receipt emission.

mod errors;
mod executor;
mod intrinsic_gas;

pub use errors::{ExecutorError, PreflightError};
pub use executor::{execute_transaction, ExecutionOutcome, TransactionOutcome};
pub use intrinsic_gas::intrinsic_gas;
