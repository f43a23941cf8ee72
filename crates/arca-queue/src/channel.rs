use arca_core::models::ProcessingRequest;
use async_trait::async_trait;
use thiserror::Error;

/// Channel operation errors
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Settle failed: {0}")]
    SettleFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Channel configuration error: {0}")]
    ConfigError(String),
}

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Why a message was parked instead of processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadLetterReason {
    /// The referenced object is gone from storage; redelivery cannot help.
    SourceMissing,
    /// The source bytes cannot be decoded as an image.
    DerivationFailed,
    /// The metadata record never became visible within the retry budget.
    RecordNeverVisible,
    /// The message body does not decode as a processing request.
    MalformedMessage,
}

impl DeadLetterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadLetterReason::SourceMissing => "source_missing",
            DeadLetterReason::DerivationFailed => "derivation_failed",
            DeadLetterReason::RecordNeverVisible => "record_never_visible",
            DeadLetterReason::MalformedMessage => "malformed_message",
        }
    }
}

/// Producer/consumer handle for processing requests.
#[async_trait]
pub trait ProcessingChannel: Send + Sync {
    /// Enqueue a request on the given topic. Returns only after the channel
    /// has accepted the message.
    async fn publish(&self, topic: &str, request: &ProcessingRequest) -> ChannelResult<()>;

    /// Open a consumer on the given topic.
    async fn subscribe(&self, topic: &str) -> ChannelResult<Box<dyn Subscription>>;
}

/// One consumer's view of a topic.
#[async_trait]
pub trait Subscription: Send + Sync {
    /// Wait up to the channel's long-poll interval for the next message.
    /// `None` means the poll elapsed without a delivery; callers loop.
    async fn receive(&mut self) -> ChannelResult<Option<Box<dyn Delivery>>>;
}

/// A single in-flight message. Exactly one of `ack`, `abandon`, or
/// `dead_letter` settles it; dropping the delivery unsettled leaves the
/// message to reappear after its visibility window.
#[async_trait]
pub trait Delivery: Send + Sync {
    fn request(&self) -> &ProcessingRequest;

    /// How many times this message has been delivered, starting at 1.
    fn attempt(&self) -> u32;

    /// Remove the message from the channel; processing is complete.
    async fn ack(self: Box<Self>) -> ChannelResult<()>;

    /// Return the message for redelivery.
    async fn abandon(self: Box<Self>) -> ChannelResult<()>;

    /// Park the message; it will not be redelivered.
    async fn dead_letter(self: Box<Self>, reason: DeadLetterReason) -> ChannelResult<()>;
}
