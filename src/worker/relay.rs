use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::chunking::plan_parts;
use crate::clients::{QueueApi, SmartHomeApi};
use crate::core::config::AppConfig;
use crate::core::models::{ReceivedMessage, SkillRequest, SkillResponse};
use crate::errors::BridgeError;

/// What a single poll did with the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Receive failed; the loop backed off before returning.
    ReceiveFailed,
    /// The queue had nothing for us.
    Idle,
    /// The hub answered and the response went out in `parts` messages.
    Relayed { status: u16, parts: usize },
    /// The request could never be handled and was removed.
    Discarded,
    /// Handling failed part way; the request stays queued for redelivery.
    Deferred,
}

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub request_queue_name: String,
    pub poll_wait: Option<i32>,
    pub receive_backoff: Duration,
}

impl From<&AppConfig> for RelaySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            request_queue_name: config.request_queue_name.clone(),
            poll_wait: config.poll_wait,
            receive_backoff: config.receive_backoff,
        }
    }
}

pub struct Relay<Q, H> {
    queue: Q,
    hub: H,
    settings: RelaySettings,
}

impl<Q, H> Relay<Q, H>
where
    Q: QueueApi,
    H: SmartHomeApi,
{
    pub fn new(queue: Q, hub: H, settings: RelaySettings) -> Self {
        Self {
            queue,
            hub,
            settings,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn hub(&self) -> &H {
        &self.hub
    }

    /// Resolve the request queue and relay requests forever.
    ///
    /// # Errors
    ///
    /// Returns an error only if the request queue URL cannot be resolved;
    /// failures while handling individual requests are logged and the loop
    /// carries on.
    pub async fn run(&self) -> Result<(), BridgeError> {
        let name = &self.settings.request_queue_name;
        let request_queue_url = self.queue.queue_url(name).await?;

        info!("Polling for work from {}...", name);
        loop {
            let outcome = self.poll_once(&request_queue_url).await;
            debug!("Poll outcome: {:?}", outcome);
        }
    }

    pub async fn poll_once(&self, request_queue_url: &str) -> PollOutcome {
        let message = match self
            .queue
            .receive_one(request_queue_url, self.settings.poll_wait)
            .await
        {
            Ok(Some(message)) => message,
            Ok(None) => return PollOutcome::Idle,
            Err(e) => {
                warn!(
                    "Error polling for messages. Waiting {} seconds to try again. {}",
                    self.settings.receive_backoff.as_secs(),
                    e
                );
                tokio::time::sleep(self.settings.receive_backoff).await;
                return PollOutcome::ReceiveFailed;
            }
        };

        debug!("Handling message with body {}", message.body);

        let (request, group_id) = match parse_message(&message) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Discarding malformed request: {}", e);
                if let Err(e) = self
                    .queue
                    .delete(request_queue_url, &message.receipt_handle)
                    .await
                {
                    error!("Failed to delete malformed request: {}", e);
                    return PollOutcome::Deferred;
                }
                return PollOutcome::Discarded;
            }
        };

        match self.relay(&request, group_id).await {
            Ok((status, parts)) => {
                if let Err(e) = self
                    .queue
                    .delete(request_queue_url, &message.receipt_handle)
                    .await
                {
                    // The response is already out; a redelivery is deduplicated downstream.
                    error!("Failed to delete handled request: {}", e);
                }
                PollOutcome::Relayed { status, parts }
            }
            Err(e) => {
                warn!(group_id, "Leaving request queued for redelivery: {}", e);
                PollOutcome::Deferred
            }
        }
    }

    async fn relay(
        &self,
        request: &SkillRequest,
        group_id: &str,
    ) -> Result<(u16, usize), BridgeError> {
        let hub_response = self.hub.forward(&request.body).await?;

        let response = SkillResponse {
            status: hub_response.status,
            data: hub_response.data,
            group_id: group_id.to_string(),
        };
        debug!("Sending response payload {:?}", response);
        if response.status != 200 {
            warn!("SQS Payload: {:?}", request);
            warn!("Got HA response {:?}", response);
        }

        let message_body = serde_json::to_string(&response)?;
        debug!("Message response is {} bytes", message_body.len());

        let parts = plan_parts(&message_body, group_id);
        debug!("Sending response in {} parts", parts.len());
        for part in &parts {
            debug!(
                part_number = part.part_number,
                total_parts = part.total_parts,
                body_size = part.body.len(),
                deduplication_id = %part.deduplication_id,
                "Sending part"
            );
            self.queue.send(&request.response_queue, part).await?;
        }

        Ok((response.status, parts.len()))
    }
}

fn parse_message(message: &ReceivedMessage) -> Result<(SkillRequest, &str), BridgeError> {
    let request: SkillRequest = serde_json::from_str(&message.body)?;
    debug!("Parsed payload: {:?}", request);
    let group_id = message
        .group_id
        .as_deref()
        .ok_or_else(|| BridgeError::ParseError("message has no MessageGroupId".to_string()))?;
    Ok((request, group_id))
}
