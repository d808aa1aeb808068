//! HA Skill Bridge - relays voice-assistant smart-home directives from the cloud to Home Assistant.
//!
//! The skill's cloud backend cannot reach a Home Assistant instance behind a
//! home router, so the exchange goes through two SQS FIFO queues:
//! 1. The skill backend enqueues each directive on the request queue
//! 2. This worker pulls one request at a time, POSTs it to the local
//!    smart-home API and publishes the answer on the response queue named in
//!    the request, split into parts when it exceeds the SQS message size
//!
//! On startup the worker creates or updates the CloudFormation stack that
//! owns those queues.
//!
//! # Architecture
//!
//! The system uses:
//! - CloudFormation for provisioning (`infrastructure::stack`)
//! - SQS for request and response transport (`clients::sqs_client`)
//! - reqwest for the Home Assistant API (`clients::hub_client`)
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use ha_skill_bridge::clients::{HubClient, SqsQueue};
//! use ha_skill_bridge::core::config::AppConfig;
//! use ha_skill_bridge::worker::{Relay, RelaySettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     ha_skill_bridge::setup_logging(false);
//!
//!     let config = AppConfig::from_env()?;
//!     let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
//!
//!     let relay = Relay::new(
//!         SqsQueue::new(aws_sdk_sqs::Client::new(&aws)),
//!         HubClient::new(config.smart_home_url.clone(), config.supervisor_token.clone())?,
//!         RelaySettings::from(&config),
//!     );
//!     relay.run().await?;
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod core;
pub mod errors;
pub mod infrastructure;
pub mod worker;

pub use errors::BridgeError;

/// Configure human-readable logging for the add-on log panel.
///
/// Logs at `INFO`, or `DEBUG` when `debug` is set. Calling it again after a
/// subscriber is installed is a no-op.
///
/// # Example
///
/// ```
/// ha_skill_bridge::setup_logging(false);
/// ```
pub fn setup_logging(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
