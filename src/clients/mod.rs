//! Client modules for external service interactions

pub mod hub_client;
pub mod sqs_client;

pub use hub_client::{HubClient, SmartHomeApi};
pub use sqs_client::{QueueApi, SqsQueue};
