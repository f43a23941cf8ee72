use arca_core::config::QueueDriver;
use arca_core::Config;
use std::sync::Arc;

use crate::channel::{ChannelError, ChannelResult, ProcessingChannel};
use crate::memory::MemoryChannel;

/// Create a channel implementation based on configuration
///
/// Called once at process start, like the storage factory.
pub async fn create_channel(config: &Config) -> ChannelResult<Arc<dyn ProcessingChannel>> {
    match config.queue_driver {
        #[cfg(feature = "queue-sqs")]
        QueueDriver::Sqs => {
            let region = config.queue_region.clone().ok_or_else(|| {
                ChannelError::ConfigError("QUEUE_REGION or AWS_REGION not configured".to_string())
            })?;

            let channel = crate::sqs::SqsChannel::new(
                region,
                config.queue_endpoint.clone(),
                config.queue_prefix.clone(),
                config.receive_wait_seconds,
            )
            .await?;
            Ok(Arc::new(channel))
        }

        #[cfg(not(feature = "queue-sqs"))]
        QueueDriver::Sqs => Err(ChannelError::ConfigError(
            "SQS channel not available (queue-sqs feature not enabled)".to_string(),
        )),

        QueueDriver::Memory => Ok(Arc::new(MemoryChannel::new())),
    }
}
