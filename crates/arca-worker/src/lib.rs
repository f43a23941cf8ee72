//! Thumbnail worker.
//!
//! Consumes processing requests from the channel, derives thumbnails, and
//! records them on the owning asset. `Processor` holds the per-message state
//! machine; `Worker` is the semaphore-gated consume loop around it.

pub mod processor;
pub mod runner;

pub use processor::Processor;
pub use runner::Worker;
