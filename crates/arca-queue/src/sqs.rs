//! SQS-backed channel implementation.
//!
//! One SQS queue per topic, named `{prefix}-{topic}`, created on first use.
//! Each topic also gets a `{prefix}-{topic}-dlq` queue for parked messages.
//! SQS visibility timeouts supply the redelivery behavior: ack deletes the
//! message, abandon zeroes its visibility so it reappears immediately.

use arca_core::models::ProcessingRequest;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::types::{MessageAttributeValue, MessageSystemAttributeName};
use aws_sdk_sqs::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::channel::{
    ChannelError, ChannelResult, DeadLetterReason, Delivery, ProcessingChannel, Subscription,
};

const DEAD_LETTER_REASON_ATTRIBUTE: &str = "deadLetterReason";

/// SQS implementation of `ProcessingChannel`.
#[derive(Clone)]
pub struct SqsChannel {
    client: Client,
    queue_prefix: String,
    receive_wait_seconds: i32,
    // Queue URLs are stable for the process lifetime; resolve each once.
    queue_urls: Arc<Mutex<HashMap<String, String>>>,
}

impl SqsChannel {
    /// Connect to SQS.
    ///
    /// # Arguments
    /// * `region` - AWS region
    /// * `endpoint_url` - Optional custom endpoint (e.g. LocalStack)
    /// * `queue_prefix` - Prefix for queue names
    /// * `receive_wait_seconds` - Long-poll interval for consumers
    pub async fn new(
        region: String,
        endpoint_url: Option<String>,
        queue_prefix: String,
        receive_wait_seconds: i32,
    ) -> ChannelResult<Self> {
        let region_provider = RegionProviderChain::first_try(Region::new(region));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut builder = aws_sdk_sqs::config::Builder::from(&shared_config);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            queue_prefix,
            receive_wait_seconds,
            queue_urls: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    fn queue_name(&self, topic: &str) -> String {
        format!("{}-{}", self.queue_prefix, topic)
    }

    /// Resolve a queue URL by name, creating the queue if it does not exist.
    async fn ensure_queue(&self, queue_name: &str) -> ChannelResult<String> {
        {
            let urls = self.queue_urls.lock().await;
            if let Some(url) = urls.get(queue_name) {
                return Ok(url.clone());
            }
        }

        let url = match self
            .client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
        {
            Ok(response) => response
                .queue_url()
                .ok_or_else(|| ChannelError::ConfigError("missing queue url".to_string()))?
                .to_string(),
            Err(SdkError::ServiceError(service_err))
                if service_err.err().is_queue_does_not_exist() =>
            {
                tracing::info!(queue = %queue_name, "creating queue");
                let created = self
                    .client
                    .create_queue()
                    .queue_name(queue_name)
                    .send()
                    .await
                    .map_err(|e| ChannelError::ConfigError(e.to_string()))?;
                created
                    .queue_url()
                    .ok_or_else(|| ChannelError::ConfigError("missing queue url".to_string()))?
                    .to_string()
            }
            Err(err) => return Err(ChannelError::ConfigError(err.to_string())),
        };

        self.queue_urls
            .lock()
            .await
            .insert(queue_name.to_string(), url.clone());
        Ok(url)
    }
}

#[async_trait]
impl ProcessingChannel for SqsChannel {
    async fn publish(&self, topic: &str, request: &ProcessingRequest) -> ChannelResult<()> {
        let queue_url = self.ensure_queue(&self.queue_name(topic)).await?;
        let body = serde_json::to_string(request)?;

        self.client
            .send_message()
            .queue_url(&queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| ChannelError::PublishFailed(e.to_string()))?;

        tracing::debug!(topic = %topic, key = %request.key, "message published");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> ChannelResult<Box<dyn Subscription>> {
        let queue_url = self.ensure_queue(&self.queue_name(topic)).await?;
        let dlq_url = self
            .ensure_queue(&format!("{}-dlq", self.queue_name(topic)))
            .await?;

        Ok(Box::new(SqsSubscription {
            client: self.client.clone(),
            queue_url,
            dlq_url,
            receive_wait_seconds: self.receive_wait_seconds,
        }))
    }
}

struct SqsSubscription {
    client: Client,
    queue_url: String,
    dlq_url: String,
    receive_wait_seconds: i32,
}

#[async_trait]
impl Subscription for SqsSubscription {
    async fn receive(&mut self) -> ChannelResult<Option<Box<dyn Delivery>>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(self.receive_wait_seconds)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| ChannelError::ReceiveFailed(e.to_string()))?;

        let Some(message) = response.messages().first() else {
            return Ok(None);
        };

        let Some(receipt_handle) = message.receipt_handle().map(String::from) else {
            tracing::warn!("queue message missing receipt handle");
            return Ok(None);
        };

        let attempt = message
            .attributes()
            .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
            .and_then(|count| count.parse::<u32>().ok())
            .unwrap_or(1);

        let Some(body) = message.body() else {
            tracing::warn!("queue message missing body, parking");
            park_raw(
                &self.client,
                &self.dlq_url,
                "",
                DeadLetterReason::MalformedMessage,
            )
            .await?;
            delete_message(&self.client, &self.queue_url, &receipt_handle).await?;
            return Ok(None);
        };

        let request: ProcessingRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "failed to parse queue message body, parking");
                park_raw(
                    &self.client,
                    &self.dlq_url,
                    body,
                    DeadLetterReason::MalformedMessage,
                )
                .await?;
                delete_message(&self.client, &self.queue_url, &receipt_handle).await?;
                return Ok(None);
            }
        };

        tracing::debug!(key = %request.key, attempt = attempt, "message received");

        Ok(Some(Box::new(SqsDelivery {
            client: self.client.clone(),
            queue_url: self.queue_url.clone(),
            dlq_url: self.dlq_url.clone(),
            receipt_handle,
            request,
            attempt,
        })))
    }
}

struct SqsDelivery {
    client: Client,
    queue_url: String,
    dlq_url: String,
    receipt_handle: String,
    request: ProcessingRequest,
    attempt: u32,
}

#[async_trait]
impl Delivery for SqsDelivery {
    fn request(&self) -> &ProcessingRequest {
        &self.request
    }

    fn attempt(&self) -> u32 {
        self.attempt
    }

    async fn ack(self: Box<Self>) -> ChannelResult<()> {
        delete_message(&self.client, &self.queue_url, &self.receipt_handle).await
    }

    async fn abandon(self: Box<Self>) -> ChannelResult<()> {
        // Zero visibility makes the message reappear for the next poll.
        self.client
            .change_message_visibility()
            .queue_url(&self.queue_url)
            .receipt_handle(&self.receipt_handle)
            .visibility_timeout(0)
            .send()
            .await
            .map_err(|e| ChannelError::SettleFailed(e.to_string()))?;
        Ok(())
    }

    async fn dead_letter(self: Box<Self>, reason: DeadLetterReason) -> ChannelResult<()> {
        tracing::warn!(
            key = %self.request.key,
            reason = reason.as_str(),
            attempt = self.attempt,
            "message dead-lettered"
        );
        let body = serde_json::to_string(&self.request)?;
        park_raw(&self.client, &self.dlq_url, &body, reason).await?;
        delete_message(&self.client, &self.queue_url, &self.receipt_handle).await
    }
}

async fn delete_message(client: &Client, queue_url: &str, receipt_handle: &str) -> ChannelResult<()> {
    client
        .delete_message()
        .queue_url(queue_url)
        .receipt_handle(receipt_handle)
        .send()
        .await
        .map_err(|e| ChannelError::SettleFailed(e.to_string()))?;
    Ok(())
}

async fn park_raw(
    client: &Client,
    dlq_url: &str,
    body: &str,
    reason: DeadLetterReason,
) -> ChannelResult<()> {
    let reason_attribute = MessageAttributeValue::builder()
        .data_type("String")
        .string_value(reason.as_str())
        .build()
        .map_err(|e| ChannelError::SettleFailed(e.to_string()))?;

    client
        .send_message()
        .queue_url(dlq_url)
        .message_body(if body.is_empty() { "{}" } else { body })
        .message_attributes(DEAD_LETTER_REASON_ATTRIBUTE, reason_attribute)
        .send()
        .await
        .map_err(|e| ChannelError::SettleFailed(e.to_string()))?;
    Ok(())
}
