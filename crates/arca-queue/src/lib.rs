//! Message channel between the upload path and the thumbnail worker.
//!
//! Delivery is at-least-once: a message stays on the channel until the
//! consumer acknowledges it, and abandoning (or crashing) makes it visible
//! again. Consumers are written to be idempotent rather than relying on
//! exactly-once delivery.
//!
//! Topics are named after storage backends; a worker subscribes only to the
//! topic of the backend it is wired to, so it never receives a message it
//! would have to inspect and drop.

pub mod channel;
pub mod factory;
pub mod memory;
#[cfg(feature = "queue-sqs")]
pub mod sqs;

pub use channel::{
    ChannelError, ChannelResult, DeadLetterReason, Delivery, ProcessingChannel, Subscription,
};
pub use factory::create_channel;
pub use memory::MemoryChannel;
#[cfg(feature = "queue-sqs")]
pub use sqs::SqsChannel;
