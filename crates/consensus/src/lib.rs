//! Chain configuration, hardfork-gating predicates, and the pure consensus arithmetic
//! (difficulty adjustment, gas-limit bounds) they parameterize.

mod config;
mod difficulty;
mod gas;

pub use config::{ChainConfig, GenesisAccount, GenesisConfig};
pub use difficulty::compute_difficulty;
pub use gas::{validate_gas_limit, InvalidGasLimit};
