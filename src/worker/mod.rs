//! Request relay between the skill queues and the hub

pub mod chunking;
pub mod relay;

pub use relay::{PollOutcome, Relay, RelaySettings};
