//! Utility modules: local storage, logging, scheduled tasks.

pub mod logging;
pub mod persistence;
pub mod schedule;

pub use persistence::Storage;
pub use schedule::ScheduledTask;
