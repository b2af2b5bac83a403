//! Core Ethereum data types shared across the state-transition crates: accounts, logs,
//! receipts, transient execution substate, transactions, headers, blocks, and the small
//! RLP helpers the rest of the workspace builds on.

mod account;
mod block;
mod errors;
mod header;
mod log;
mod receipt;
mod rlp;
mod substate;
mod transaction;

pub use account::{empty_code_hash, empty_trie_root, Account};
pub use block::Block;
pub use errors::TransactionError;
pub use header::{ommers_hash, Header};
pub use log::Log;
pub use receipt::{logs_bloom, PostStateOrStatus, Receipt};
pub use rlp::wrap_list;
pub use substate::SubState;
pub use transaction::Transaction;
