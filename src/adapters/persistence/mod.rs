//! Persistence Adapters - In-memory Storage
//!
//! Implements the store ports with RwLock-guarded maps. State is
//! process-lifetime only: reinitialized on restart, lost on crash. No
//! database dependency.

pub mod memory;

pub use memory::InMemoryStore;
