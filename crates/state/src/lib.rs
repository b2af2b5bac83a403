//! Account-based world state: a trie-backed account store (§4.3's external contract) and a
//! per-transaction staging repository (§4.4) layered over it.

mod errors;
mod staging;
mod store;

pub use errors::StateError;
pub use staging::StagingRepository;
pub use store::AccountStore;
