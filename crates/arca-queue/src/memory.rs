//! In-process channel implementation.
//!
//! Mirrors the at-least-once semantics of the SQS channel closely enough for
//! integration tests: abandoned messages are requeued with an incremented
//! attempt count, dead-lettered messages land in an inspectable side list.

use arca_core::models::ProcessingRequest;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

use crate::channel::{
    ChannelResult, DeadLetterReason, Delivery, ProcessingChannel, Subscription,
};

const DEFAULT_RECEIVE_WAIT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct Pending {
    request: ProcessingRequest,
    attempt: u32,
}

#[derive(Default)]
struct TopicState {
    queue: Mutex<VecDeque<Pending>>,
    dead_letters: Mutex<Vec<(ProcessingRequest, DeadLetterReason)>>,
    notify: Notify,
}

/// In-memory implementation of `ProcessingChannel`.
#[derive(Clone)]
pub struct MemoryChannel {
    topics: Arc<Mutex<HashMap<String, Arc<TopicState>>>>,
    receive_wait: Duration,
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            receive_wait: DEFAULT_RECEIVE_WAIT,
        }
    }

    /// Override the long-poll interval. Test support for tight loops.
    pub fn with_receive_wait(mut self, wait: Duration) -> Self {
        self.receive_wait = wait;
        self
    }

    async fn topic(&self, name: &str) -> Arc<TopicState> {
        let mut topics = self.topics.lock().await;
        topics
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(TopicState::default()))
            .clone()
    }

    /// Messages waiting on a topic. Test support.
    pub async fn pending_count(&self, topic: &str) -> usize {
        self.topic(topic).await.queue.lock().await.len()
    }

    /// Dead-lettered messages of a topic. Test support.
    pub async fn dead_letters(&self, topic: &str) -> Vec<(ProcessingRequest, DeadLetterReason)> {
        self.topic(topic).await.dead_letters.lock().await.clone()
    }
}

#[async_trait]
impl ProcessingChannel for MemoryChannel {
    async fn publish(&self, topic: &str, request: &ProcessingRequest) -> ChannelResult<()> {
        // Round-trip through JSON so the in-memory channel rejects anything
        // the wire format cannot carry.
        let body = serde_json::to_string(request)?;
        let request: ProcessingRequest = serde_json::from_str(&body)?;

        let state = self.topic(topic).await;
        state.queue.lock().await.push_back(Pending {
            request,
            attempt: 0,
        });
        state.notify.notify_one();

        tracing::debug!(topic = %topic, "message published");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> ChannelResult<Box<dyn Subscription>> {
        Ok(Box::new(MemorySubscription {
            state: self.topic(topic).await,
            receive_wait: self.receive_wait,
        }))
    }
}

struct MemorySubscription {
    state: Arc<TopicState>,
    receive_wait: Duration,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn receive(&mut self) -> ChannelResult<Option<Box<dyn Delivery>>> {
        let deadline = tokio::time::Instant::now() + self.receive_wait;

        loop {
            if let Some(pending) = self.state.queue.lock().await.pop_front() {
                return Ok(Some(Box::new(MemoryDelivery {
                    request: pending.request,
                    attempt: pending.attempt + 1,
                    state: self.state.clone(),
                })));
            }

            tokio::select! {
                _ = self.state.notify.notified() => {}
                _ = tokio::time::sleep_until(deadline) => return Ok(None),
            }
        }
    }
}

struct MemoryDelivery {
    request: ProcessingRequest,
    attempt: u32,
    state: Arc<TopicState>,
}

#[async_trait]
impl Delivery for MemoryDelivery {
    fn request(&self) -> &ProcessingRequest {
        &self.request
    }

    fn attempt(&self) -> u32 {
        self.attempt
    }

    async fn ack(self: Box<Self>) -> ChannelResult<()> {
        Ok(())
    }

    async fn abandon(self: Box<Self>) -> ChannelResult<()> {
        self.state.queue.lock().await.push_back(Pending {
            request: self.request,
            attempt: self.attempt,
        });
        self.state.notify.notify_one();
        Ok(())
    }

    async fn dead_letter(self: Box<Self>, reason: DeadLetterReason) -> ChannelResult<()> {
        tracing::warn!(
            key = %self.request.key,
            reason = reason.as_str(),
            attempt = self.attempt,
            "message dead-lettered"
        );
        self.state
            .dead_letters
            .lock()
            .await
            .push((self.request, reason));
        Ok(())
    }
}
