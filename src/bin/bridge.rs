// Entry point for the Home Assistant add-on container

use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::{Credentials, Region};
use ha_skill_bridge::clients::{HubClient, SqsQueue};
use ha_skill_bridge::core::config::{AddonOptions, AppConfig};
use ha_skill_bridge::infrastructure::{
    CloudFormationStacks, StackRequest, ensure_stack, read_template,
};
use ha_skill_bridge::worker::{Relay, RelaySettings};
use ha_skill_bridge::{BridgeError, setup_logging};
use tracing::{debug, error, info};

fn load_settings() -> Result<(AppConfig, AddonOptions), BridgeError> {
    let config = AppConfig::from_env()?;
    let options = AddonOptions::load(&config.options_path)?;
    Ok((config, options))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, options) = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            setup_logging(false);
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    setup_logging(options.debug);
    info!("Starting up!");
    debug!("Loaded options {}", options.redacted());
    debug!("Loaded config {:?}", config);

    let aws = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(options.aws_region.clone()))
        .credentials_provider(Credentials::new(
            options.aws_access_key.clone(),
            options.aws_secret_key.clone(),
            None,
            None,
            "addon-options",
        ))
        .load()
        .await;

    let template_body = read_template(&config.template_path).await?;

    let stack_request = StackRequest {
        stack_name: options.stack_name.clone(),
        template_body,
        parameters: options.stack_parameters(),
    };
    let stacks = CloudFormationStacks::new(aws_sdk_cloudformation::Client::new(&aws))
        .with_max_wait(config.stack_max_wait);
    if let Err(e) = ensure_stack(&stacks, &stack_request).await {
        error!("Failed to provision stack {}: {}", stack_request.stack_name, e);
        return Err(e.into());
    }

    let hub = match HubClient::new(config.smart_home_url.clone(), config.supervisor_token.clone())
    {
        Ok(hub) => hub,
        Err(e) => {
            error!("Failed to build Home Assistant client: {}", e);
            return Err(e.into());
        }
    };
    let relay = Relay::new(
        SqsQueue::new(aws_sdk_sqs::Client::new(&aws)),
        hub,
        RelaySettings::from(&config),
    );

    relay.run().await.map_err(|e| {
        error!("Relay stopped: {}", e);
        anyhow::Error::from(e)
    })
}
