//! CloudFormation stack provisioning
//!
//! Creates the add-on's stack on first start and updates it in place on every
//! later start.

use async_trait::async_trait;
use aws_sdk_cloudformation::Client as CloudFormationClient;
use aws_sdk_cloudformation::client::Waiters;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::types::{Capability, Parameter, Stack};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::errors::BridgeError;

/// Message CloudFormation returns when an update would be a no-op.
pub const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";

pub const DEFAULT_MAX_STACK_WAIT: Duration =
    Duration::from_secs(crate::core::config::DEFAULT_STACK_WAIT_SECS);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRequest {
    pub stack_name: String,
    pub template_body: String,
    pub parameters: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackDescription {
    pub stack_name: String,
    pub status: String,
    pub outputs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Started,
    NoChanges,
}

#[must_use]
pub fn is_no_updates_message(message: &str) -> bool {
    message.trim_end().ends_with(NO_UPDATES_MESSAGE)
}

/// # Errors
///
/// Returns a `ConfigError` naming the path if the template cannot be read.
pub async fn read_template(path: &Path) -> Result<String, BridgeError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        error!("Failed to read template {}: {}", path.display(), e);
        BridgeError::ConfigError(format!("failed to read {}: {e}", path.display()))
    })
}

/// Control-plane operations needed to converge a stack.
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Returns an empty list when the stack does not exist.
    async fn describe(&self, stack_name: &str) -> Result<Vec<StackDescription>, BridgeError>;

    async fn create(&self, request: &StackRequest) -> Result<(), BridgeError>;

    async fn update(&self, request: &StackRequest) -> Result<UpdateOutcome, BridgeError>;

    async fn wait_for_create(&self, stack_name: &str) -> Result<(), BridgeError>;

    async fn wait_for_update(&self, stack_name: &str) -> Result<(), BridgeError>;
}

/// Create the stack if missing, otherwise update it, then return its outputs.
///
/// # Errors
///
/// Returns an error if any control-plane call fails (other than a no-op
/// update) or if the final describe does not return exactly one stack.
pub async fn ensure_stack<S>(
    api: &S,
    request: &StackRequest,
) -> Result<BTreeMap<String, String>, BridgeError>
where
    S: StackApi + ?Sized,
{
    let name = request.stack_name.as_str();
    let exists = !api.describe(name).await?.is_empty();

    if exists {
        info!(
            "CloudFormation stack {} already exists. Attempting an update",
            name
        );
        match api.update(request).await? {
            UpdateOutcome::Started => {
                api.wait_for_update(name).await?;
                info!("Stack {} was updated", name);
            }
            UpdateOutcome::NoChanges => {
                info!("Stack {} is already up to date", name);
            }
        }
    } else {
        info!("Creating CloudFormation stack {}", name);
        api.create(request).await?;
        info!("Waiting for stack {} to be created", name);
        api.wait_for_create(name).await?;
    }

    let mut stacks = api.describe(name).await?;
    if stacks.len() != 1 {
        return Err(BridgeError::StackError(format!(
            "expected exactly one stack named {name}, found {}",
            stacks.len()
        )));
    }
    let stack = stacks.remove(0);
    info!("Stack {} is in state {}", stack.stack_name, stack.status);

    let pretty = serde_json::to_string_pretty(&stack.outputs)?;
    info!("Stack has outputs\n{}", pretty);

    Ok(stack.outputs)
}

/// `StackApi` backed by the CloudFormation SDK and its waiters.
pub struct CloudFormationStacks {
    client: CloudFormationClient,
    max_wait: Duration,
}

impl CloudFormationStacks {
    #[must_use]
    pub fn new(client: CloudFormationClient) -> Self {
        Self {
            client,
            max_wait: DEFAULT_MAX_STACK_WAIT,
        }
    }

    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

fn to_parameters(request: &StackRequest) -> Vec<Parameter> {
    request
        .parameters
        .iter()
        .map(|(key, value)| {
            Parameter::builder()
                .parameter_key(key)
                .parameter_value(value)
                .build()
        })
        .collect()
}

fn to_description(stack: &Stack) -> StackDescription {
    let outputs = stack
        .outputs()
        .iter()
        .filter_map(|o| Some((o.output_key()?.to_string(), o.output_value()?.to_string())))
        .collect();

    StackDescription {
        stack_name: stack.stack_name().unwrap_or_default().to_string(),
        status: stack
            .stack_status()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        outputs,
    }
}

#[async_trait]
impl StackApi for CloudFormationStacks {
    async fn describe(&self, stack_name: &str) -> Result<Vec<StackDescription>, BridgeError> {
        match self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
        {
            Ok(out) => Ok(out.stacks().iter().map(to_description).collect()),
            // CloudFormation answers a ValidationError for unknown stack names.
            Err(SdkError::ServiceError(e)) => {
                debug!("describe stack exception: {}", e.err());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, request: &StackRequest) -> Result<(), BridgeError> {
        self.client
            .create_stack()
            .stack_name(&request.stack_name)
            .template_body(&request.template_body)
            .set_parameters(Some(to_parameters(request)))
            .capabilities(Capability::CapabilityIam)
            .send()
            .await?;
        Ok(())
    }

    async fn update(&self, request: &StackRequest) -> Result<UpdateOutcome, BridgeError> {
        let result = self
            .client
            .update_stack()
            .stack_name(&request.stack_name)
            .template_body(&request.template_body)
            .set_parameters(Some(to_parameters(request)))
            .capabilities(Capability::CapabilityIam)
            .send()
            .await;

        match result {
            Ok(_) => Ok(UpdateOutcome::Started),
            Err(e) => {
                let no_updates = e
                    .as_service_error()
                    .and_then(|se| se.message())
                    .is_some_and(is_no_updates_message);
                if no_updates {
                    Ok(UpdateOutcome::NoChanges)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn wait_for_create(&self, stack_name: &str) -> Result<(), BridgeError> {
        self.client
            .wait_until_stack_create_complete()
            .stack_name(stack_name)
            .wait(self.max_wait)
            .await
            .map_err(|e| {
                BridgeError::StackError(format!(
                    "stack {stack_name} did not reach CREATE_COMPLETE: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn wait_for_update(&self, stack_name: &str) -> Result<(), BridgeError> {
        self.client
            .wait_until_stack_update_complete()
            .stack_name(stack_name)
            .wait(self.max_wait)
            .await
            .map_err(|e| {
                BridgeError::StackError(format!(
                    "stack {stack_name} did not reach UPDATE_COMPLETE: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_updates_message_detection() {
        assert!(is_no_updates_message("No updates are to be performed."));
        assert!(is_no_updates_message(
            "An error occurred (ValidationError) when calling the UpdateStack operation: No updates are to be performed."
        ));
        assert!(!is_no_updates_message("Stack is in UPDATE_IN_PROGRESS state"));
    }

    #[test]
    fn test_to_parameters_keeps_order() {
        let request = StackRequest {
            stack_name: "s".to_string(),
            template_body: String::new(),
            parameters: vec![
                ("AlexaSkillId".to_string(), "amzn1.ask.skill.x".to_string()),
                ("Debug".to_string(), "False".to_string()),
            ],
        };
        let params = to_parameters(&request);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].parameter_key(), Some("AlexaSkillId"));
        assert_eq!(params[1].parameter_value(), Some("False"));
    }
}
