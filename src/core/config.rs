use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::BridgeError;

pub const DEFAULT_OPTIONS_PATH: &str = "/data/options.json";
pub const DEFAULT_TEMPLATE_PATH: &str = "/cloudformation.yaml";
pub const DEFAULT_SMART_HOME_URL: &str = "http://supervisor/core/api/alexa/smart_home";
pub const DEFAULT_REQUEST_QUEUE: &str = "ha-skill-requests.fifo";
pub const DEFAULT_RECEIVE_BACKOFF_SECS: u64 = 60;
pub const DEFAULT_STACK_WAIT_SECS: u64 = 30 * 60;

/// SQS caps long polling at 20 seconds.
const MAX_POLL_WAIT_SECS: i32 = 20;

const REDACTED: &str = "*****";

/// Options written by the add-on UI.
#[derive(Clone, Deserialize)]
pub struct AddonOptions {
    #[serde(rename = "AWS Region")]
    pub aws_region: String,
    #[serde(rename = "AWS Access Key")]
    pub aws_access_key: String,
    #[serde(rename = "AWS Secret Key")]
    pub aws_secret_key: String,
    #[serde(rename = "Alexa Skill Id")]
    pub alexa_skill_id: String,
    #[serde(rename = "CloudFormation Stack Name")]
    pub stack_name: String,
    #[serde(rename = "Debug", default)]
    pub debug: bool,
}

impl std::fmt::Debug for AddonOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddonOptions")
            .field("aws_region", &self.aws_region)
            .field("aws_access_key", &self.aws_access_key)
            .field("aws_secret_key", &REDACTED)
            .field("alexa_skill_id", &self.alexa_skill_id)
            .field("stack_name", &self.stack_name)
            .field("debug", &self.debug)
            .finish()
    }
}

impl AddonOptions {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid options document.
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
    }

    /// # Errors
    ///
    /// Returns an error if a required option is missing or has the wrong type.
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(raw)
            .map_err(|e| BridgeError::ConfigError(format!("invalid add-on options: {e}")))
    }

    /// Options as they may appear in logs, with the secret key masked.
    #[must_use]
    pub fn redacted(&self) -> Value {
        serde_json::json!({
            "AWS Region": self.aws_region,
            "AWS Access Key": self.aws_access_key,
            "AWS Secret Key": REDACTED,
            "Alexa Skill Id": self.alexa_skill_id,
            "CloudFormation Stack Name": self.stack_name,
            "Debug": self.debug,
        })
    }

    /// Parameters substituted into the CloudFormation template.
    #[must_use]
    pub fn stack_parameters(&self) -> Vec<(String, String)> {
        let debug = if self.debug { "True" } else { "False" };
        vec![
            ("AlexaSkillId".to_string(), self.alexa_skill_id.clone()),
            ("Debug".to_string(), debug.to_string()),
        ]
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub supervisor_token: String,
    pub options_path: PathBuf,
    pub template_path: PathBuf,
    pub smart_home_url: String,
    pub request_queue_name: String,
    pub poll_wait: Option<i32>,
    pub receive_backoff: Duration,
    pub stack_max_wait: Duration,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("supervisor_token", &REDACTED)
            .field("options_path", &self.options_path)
            .field("template_path", &self.template_path)
            .field("smart_home_url", &self.smart_home_url)
            .field("request_queue_name", &self.request_queue_name)
            .field("poll_wait", &self.poll_wait)
            .field("receive_backoff", &self.receive_backoff)
            .field("stack_max_wait", &self.stack_max_wait)
            .finish()
    }
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns an error naming the variable that is missing or malformed.
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// # Errors
    ///
    /// Returns an error naming the variable that is missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BridgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supervisor_token = lookup("SUPERVISOR_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BridgeError::ConfigError("SUPERVISOR_TOKEN is not set".to_string()))?;

        let poll_wait = match lookup("HA_SKILL_POLL_WAIT_SECONDS") {
            Some(raw) => {
                let secs: i32 = raw.trim().parse().map_err(|e| {
                    BridgeError::ConfigError(format!("HA_SKILL_POLL_WAIT_SECONDS: {e}"))
                })?;
                if !(0..=MAX_POLL_WAIT_SECS).contains(&secs) {
                    return Err(BridgeError::ConfigError(format!(
                        "HA_SKILL_POLL_WAIT_SECONDS must be between 0 and {MAX_POLL_WAIT_SECS}, got {secs}"
                    )));
                }
                Some(secs)
            }
            None => None,
        };

        let receive_backoff = match lookup("HA_SKILL_RECEIVE_BACKOFF_SECONDS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                BridgeError::ConfigError(format!("HA_SKILL_RECEIVE_BACKOFF_SECONDS: {e}"))
            })?,
            None => DEFAULT_RECEIVE_BACKOFF_SECS,
        };

        let stack_max_wait = match lookup("HA_SKILL_STACK_WAIT_SECONDS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                BridgeError::ConfigError(format!("HA_SKILL_STACK_WAIT_SECONDS: {e}"))
            })?,
            None => DEFAULT_STACK_WAIT_SECS,
        };

        Ok(Self {
            supervisor_token,
            options_path: lookup("HA_SKILL_OPTIONS_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_OPTIONS_PATH), PathBuf::from),
            template_path: lookup("HA_SKILL_TEMPLATE_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH), PathBuf::from),
            smart_home_url: lookup("HA_SKILL_SMART_HOME_URL")
                .unwrap_or_else(|| DEFAULT_SMART_HOME_URL.to_string()),
            request_queue_name: lookup("HA_SKILL_REQUEST_QUEUE")
                .unwrap_or_else(|| DEFAULT_REQUEST_QUEUE.to_string()),
            poll_wait,
            receive_backoff: Duration::from_secs(receive_backoff),
            stack_max_wait: Duration::from_secs(stack_max_wait),
        })
    }
}
