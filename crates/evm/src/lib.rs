//! The §6 EVM-oracle interface over a [`StagingRepository`](ethrs_state::StagingRepository),
//! a `revm`-backed default implementation, and precompile dispatch by address.

mod db;
mod env;
mod errors;
mod oracle;
mod precompile;

pub use db::{BlockHashProvider, NoopBlockHashProvider, StagingDb};
pub use env::ExecEnv;
pub use errors::EvmError;
pub use oracle::{EvmOracle, OracleOutcome, RevmOracle};
pub use precompile::{dispatch as dispatch_precompile, PrecompileResult};
