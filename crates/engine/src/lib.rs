//! Poll orchestration.
//!
//! One cycle fetches the current listings, notifies the ones not seen before
//! and records them. The scheduler repeats cycles until shutdown.

pub mod poller;
pub mod scheduler;

pub use poller::*;
pub use scheduler::run;
