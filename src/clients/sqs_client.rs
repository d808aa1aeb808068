//! SQS client module
//!
//! Queue access for the relay loop, with retry logic on sends and deletes.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::{MessageAttributeValue, MessageSystemAttributeName};
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tokio_retry::{RetryIf, strategy::ExponentialBackoff};
use tracing::{debug, warn};

use crate::core::models::{OutboundPart, ReceivedMessage};
use crate::errors::BridgeError;

pub const PART_NUMBER_ATTRIBUTE: &str = "part_number";
pub const TOTAL_PARTS_ATTRIBUTE: &str = "total_parts";

/// Service error codes SQS uses for load shedding.
const THROTTLING_CODES: &[&str] = &[
    "ThrottlingException",
    "RequestThrottled",
    "ServiceUnavailable",
    "InternalError",
    "KmsThrottled",
];

#[async_trait]
pub trait QueueApi: Send + Sync {
    async fn queue_url(&self, queue_name: &str) -> Result<String, BridgeError>;

    /// Receive at most one message. `wait_seconds` of `None` uses the queue's default.
    async fn receive_one(
        &self,
        queue_url: &str,
        wait_seconds: Option<i32>,
    ) -> Result<Option<ReceivedMessage>, BridgeError>;

    async fn send(&self, queue_url: &str, part: &OutboundPart) -> Result<(), BridgeError>;

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), BridgeError>;
}

/// `QueueApi` backed by the SQS SDK.
pub struct SqsQueue {
    client: Client,
}

impl SqsQueue {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Delays of 100 ms, 200 ms and 400 ms before jitter, capped at 5 s each.
fn retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(3)
}

/// Retry transient failures only; anything else is returned on the first attempt.
async fn with_retry<F, Fut, T>(operation: F) -> Result<T, BridgeError>
where
    F: FnMut() -> Fut + Send,
    Fut: std::future::Future<Output = Result<T, BridgeError>> + Send,
    T: Send,
{
    RetryIf::spawn(retry_strategy(), operation, BridgeError::is_transient).await
}

fn classify<E, R>(error: SdkError<E, R>) -> BridgeError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let transient = match &error {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(e) => e
            .err()
            .code()
            .is_some_and(|code| THROTTLING_CODES.contains(&code)),
        _ => false,
    };

    if transient {
        BridgeError::AwsTransient(DisplayErrorContext(&error).to_string())
    } else {
        BridgeError::from(error)
    }
}

fn number_attribute(value: usize) -> Result<MessageAttributeValue, BridgeError> {
    MessageAttributeValue::builder()
        .data_type("Number")
        .string_value(value.to_string())
        .build()
        .map_err(|e| BridgeError::QueueError(format!("invalid message attribute: {e}")))
}

#[async_trait]
impl QueueApi for SqsQueue {
    async fn queue_url(&self, queue_name: &str) -> Result<String, BridgeError> {
        let out = self
            .client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await?;

        out.queue_url()
            .map(str::to_string)
            .ok_or_else(|| BridgeError::QueueError(format!("no URL returned for {queue_name}")))
    }

    async fn receive_one(
        &self,
        queue_url: &str,
        wait_seconds: Option<i32>,
    ) -> Result<Option<ReceivedMessage>, BridgeError> {
        let out = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(1)
            .message_system_attribute_names(MessageSystemAttributeName::MessageGroupId)
            .set_wait_time_seconds(wait_seconds)
            .send()
            .await?;

        debug!("Received response {:?}", out.messages());

        let Some(message) = out.messages().first() else {
            return Ok(None);
        };
        let Some(receipt_handle) = message.receipt_handle() else {
            warn!(
                "Dropping message {:?} without a receipt handle",
                message.message_id()
            );
            return Ok(None);
        };

        let group_id = message
            .attributes()
            .and_then(|attrs| attrs.get(&MessageSystemAttributeName::MessageGroupId))
            .cloned();

        Ok(Some(ReceivedMessage {
            body: message.body().unwrap_or_default().to_string(),
            receipt_handle: receipt_handle.to_string(),
            group_id,
        }))
    }

    async fn send(&self, queue_url: &str, part: &OutboundPart) -> Result<(), BridgeError> {
        let part_number = number_attribute(part.part_number)?;
        let total_parts = number_attribute(part.total_parts)?;

        with_retry(|| async {
            self.client
                .send_message()
                .queue_url(queue_url)
                .message_body(&part.body)
                .message_group_id(&part.group_id)
                .message_deduplication_id(&part.deduplication_id)
                .message_attributes(PART_NUMBER_ATTRIBUTE, part_number.clone())
                .message_attributes(TOTAL_PARTS_ATTRIBUTE, total_parts.clone())
                .send()
                .await
                .map_err(|e| {
                    warn!("send_message to {} failed: {}", queue_url, e);
                    classify(e)
                })?;
            Ok::<(), BridgeError>(())
        })
        .await
    }

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<(), BridgeError> {
        with_retry(|| async {
            self.client
                .delete_message()
                .queue_url(queue_url)
                .receipt_handle(receipt_handle)
                .send()
                .await
                .map_err(classify)?;
            Ok::<(), BridgeError>(())
        })
        .await
    }
}
