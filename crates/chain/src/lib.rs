//! Block assembly and holistic validation (§4.6), the fork-choice block tree (§4.7), and
//! the genesis builder (§4.8) — the layer that ties the executor, state store, and
//! consensus rules into whole blocks.

mod assembler;
mod errors;
mod genesis;
mod store;

pub use assembler::{assemble_block, validate_block, AssembledBlock, ChildProposal};
pub use errors::{ChainError, OmmerError, ValidationTag};
pub use genesis::{build_genesis, Genesis};
pub use store::BlockStore;
