//! Concrete implementations of the storage contract.

pub mod memory;

pub use memory::InMemoryStore;
