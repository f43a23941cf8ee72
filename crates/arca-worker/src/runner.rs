//! Worker consume loop.
//!
//! Shutdown: a signal on the shutdown channel stops the loop from receiving
//! further messages; in-flight messages are given time to settle by draining
//! the semaphore before returning.

use anyhow::Result;
use arca_queue::ProcessingChannel;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

use crate::processor::Processor;

/// Delay before re-polling after a receive error, so a broken channel does
/// not spin the loop.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Semaphore-gated consumer around a `Processor`.
pub struct Worker {
    processor: Arc<Processor>,
    channel: Arc<dyn ProcessingChannel>,
    topic: String,
    concurrency: usize,
}

impl Worker {
    pub fn new(
        processor: Processor,
        channel: Arc<dyn ProcessingChannel>,
        topic: String,
        concurrency: usize,
    ) -> Self {
        Self {
            processor: Arc::new(processor),
            channel,
            topic,
            concurrency,
        }
    }

    /// Consume until a shutdown signal arrives, then drain in-flight work.
    pub async fn run(&self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        tracing::info!(
            topic = %self.topic,
            concurrency = self.concurrency,
            "worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut subscription = self.channel.subscribe(&self.topic).await?;

        loop {
            // Holding a permit before receiving keeps the number of unsettled
            // deliveries bounded by the concurrency limit.
            let permit = tokio::select! {
                _ = shutdown_rx.recv() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let received = tokio::select! {
                _ = shutdown_rx.recv() => {
                    drop(permit);
                    break;
                }
                received = subscription.receive() => received,
            };

            match received {
                Ok(Some(delivery)) => {
                    let processor = self.processor.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = processor.process(delivery).await {
                            tracing::error!(error = %e, "failed to settle delivery");
                        }
                    });
                }
                Ok(None) => {
                    drop(permit);
                }
                Err(e) => {
                    drop(permit);
                    tracing::error!(error = %e, "receive failed");
                    tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                }
            }
        }

        tracing::info!("worker shutting down, draining in-flight messages");
        let _ = semaphore.acquire_many(self.concurrency as u32).await;
        tracing::info!("worker stopped");
        Ok(())
    }
}
