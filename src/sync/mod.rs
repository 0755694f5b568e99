//! Server synchronization: the backend contract, its HTTP and in-memory
//! implementations, and the optimistic reconciliation engine.

pub mod backend;
pub mod logic;
pub mod memory;
pub mod types;
mod worker;

pub use backend::{HttpBackend, StatsBackend};
pub use logic::ServerSync;
pub use memory::MemoryBackend;
pub use types::{BackendError, SyncError, SyncEvent};
