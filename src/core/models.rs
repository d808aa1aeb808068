use serde::{Deserialize, Serialize};

/// Body of a message on the request queue, as enqueued by the skill backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequest {
    /// URL of the queue the response must be published to.
    pub response_queue: String,
    /// Smart-home directive, forwarded to the hub untouched.
    pub body: String,
}

/// Published back to the skill, possibly split across several messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillResponse {
    pub status: u16,
    pub data: String,
    pub group_id: String,
}

/// A message pulled off a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub body: String,
    pub receipt_handle: String,
    pub group_id: Option<String>,
}

/// One piece of a response, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPart {
    pub body: String,
    pub group_id: String,
    pub deduplication_id: String,
    pub part_number: usize,
    pub total_parts: usize,
}

/// What the hub answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubResponse {
    pub status: u16,
    pub data: String,
}
