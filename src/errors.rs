use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    #[error("CloudFormation stack error: {0}")]
    StackError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Queue error: {0}")]
    QueueError(String),

    #[error("Transient AWS failure: {0}")]
    AwsTransient(String),
}

impl BridgeError {
    /// Failures worth retrying in place: throttling, timeouts and dropped connections.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::AwsTransient(_))
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(error: std::io::Error) -> Self {
        BridgeError::ConfigError(error.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        BridgeError::ParseError(error.to_string())
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(error: reqwest::Error) -> Self {
        BridgeError::HttpError(error.to_string())
    }
}

impl From<anyhow::Error> for BridgeError {
    fn from(error: anyhow::Error) -> Self {
        BridgeError::AwsError(error.to_string())
    }
}

// SQS and CloudFormation share the same smithy SdkError type.
impl<E, R> From<aws_sdk_sqs::error::SdkError<E, R>> for BridgeError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: aws_sdk_sqs::error::SdkError<E, R>) -> Self {
        BridgeError::AwsError(aws_sdk_sqs::error::DisplayErrorContext(error).to_string())
    }
}
