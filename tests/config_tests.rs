use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use ha_skill_bridge::core::config::{
    AddonOptions, AppConfig, DEFAULT_OPTIONS_PATH, DEFAULT_REQUEST_QUEUE, DEFAULT_SMART_HOME_URL,
    DEFAULT_TEMPLATE_PATH,
};
use ha_skill_bridge::errors::BridgeError;

const OPTIONS_JSON: &str = r#"{
    "AWS Region": "us-east-1",
    "AWS Access Key": "AKIAEXAMPLE",
    "AWS Secret Key": "super-secret",
    "Alexa Skill Id": "amzn1.ask.skill.1234",
    "CloudFormation Stack Name": "ha-skill",
    "Debug": true
}"#;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_options_parse_addon_keys() {
    let options = AddonOptions::parse(OPTIONS_JSON).unwrap();
    assert_eq!(options.aws_region, "us-east-1");
    assert_eq!(options.aws_access_key, "AKIAEXAMPLE");
    assert_eq!(options.alexa_skill_id, "amzn1.ask.skill.1234");
    assert_eq!(options.stack_name, "ha-skill");
    assert!(options.debug);
}

#[test]
fn test_options_debug_defaults_to_false() {
    let raw = r#"{
        "AWS Region": "eu-west-1",
        "AWS Access Key": "a",
        "AWS Secret Key": "s",
        "Alexa Skill Id": "skill",
        "CloudFormation Stack Name": "stack"
    }"#;
    let options = AddonOptions::parse(raw).unwrap();
    assert!(!options.debug);
    assert_eq!(
        options.stack_parameters(),
        vec![
            ("AlexaSkillId".to_string(), "skill".to_string()),
            ("Debug".to_string(), "False".to_string()),
        ]
    );
}

#[test]
fn test_options_missing_required_key_is_config_error() {
    let err = AddonOptions::parse(r#"{"AWS Region": "us-east-1"}"#).unwrap_err();
    assert!(matches!(err, BridgeError::ConfigError(_)));
}

#[test]
fn test_redacted_options_hide_secret_key() {
    let options = AddonOptions::parse(OPTIONS_JSON).unwrap();
    let redacted = options.redacted();
    assert_eq!(redacted["AWS Secret Key"], "*****");
    assert_eq!(redacted["AWS Access Key"], "AKIAEXAMPLE");
    assert!(!redacted.to_string().contains("super-secret"));
    assert!(!format!("{options:?}").contains("super-secret"));
}

#[test]
fn test_stack_parameters_with_debug() {
    let options = AddonOptions::parse(OPTIONS_JSON).unwrap();
    let params = options.stack_parameters();
    assert_eq!(params[0], ("AlexaSkillId".to_string(), "amzn1.ask.skill.1234".to_string()));
    assert_eq!(params[1], ("Debug".to_string(), "True".to_string()));
}

#[test]
fn test_options_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(OPTIONS_JSON.as_bytes()).unwrap();

    let options = AddonOptions::load(file.path()).unwrap();
    assert_eq!(options.stack_name, "ha-skill");
}

#[test]
fn test_options_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = AddonOptions::load(&dir.path().join("options.json")).unwrap_err();
    assert!(matches!(err, BridgeError::ConfigError(msg) if msg.contains("options.json")));
}

#[test]
fn test_app_config_defaults() {
    let config = AppConfig::from_lookup(lookup(&[("SUPERVISOR_TOKEN", "token")])).unwrap();
    assert_eq!(config.supervisor_token, "token");
    assert_eq!(config.options_path.to_str(), Some(DEFAULT_OPTIONS_PATH));
    assert_eq!(config.template_path.to_str(), Some(DEFAULT_TEMPLATE_PATH));
    assert_eq!(config.smart_home_url, DEFAULT_SMART_HOME_URL);
    assert_eq!(config.request_queue_name, DEFAULT_REQUEST_QUEUE);
    assert_eq!(config.poll_wait, None);
    assert_eq!(config.receive_backoff, Duration::from_secs(60));
    assert_eq!(config.stack_max_wait, Duration::from_secs(30 * 60));
}

#[test]
fn test_app_config_overrides() {
    let config = AppConfig::from_lookup(lookup(&[
        ("SUPERVISOR_TOKEN", "token"),
        ("HA_SKILL_OPTIONS_PATH", "/tmp/options.json"),
        ("HA_SKILL_SMART_HOME_URL", "http://localhost:8123/api/alexa/smart_home"),
        ("HA_SKILL_REQUEST_QUEUE", "other.fifo"),
        ("HA_SKILL_POLL_WAIT_SECONDS", "20"),
        ("HA_SKILL_RECEIVE_BACKOFF_SECONDS", "5"),
        ("HA_SKILL_STACK_WAIT_SECONDS", "600"),
    ]))
    .unwrap();
    assert_eq!(config.options_path.to_str(), Some("/tmp/options.json"));
    assert_eq!(
        config.smart_home_url,
        "http://localhost:8123/api/alexa/smart_home"
    );
    assert_eq!(config.request_queue_name, "other.fifo");
    assert_eq!(config.poll_wait, Some(20));
    assert_eq!(config.receive_backoff, Duration::from_secs(5));
    assert_eq!(config.stack_max_wait, Duration::from_secs(600));
}

#[test]
fn test_app_config_requires_supervisor_token() {
    let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
    assert!(matches!(err, BridgeError::ConfigError(msg) if msg.contains("SUPERVISOR_TOKEN")));

    let err = AppConfig::from_lookup(lookup(&[("SUPERVISOR_TOKEN", "")])).unwrap_err();
    assert!(matches!(err, BridgeError::ConfigError(_)));
}

#[test]
fn test_app_config_rejects_out_of_range_poll_wait() {
    let err = AppConfig::from_lookup(lookup(&[
        ("SUPERVISOR_TOKEN", "token"),
        ("HA_SKILL_POLL_WAIT_SECONDS", "21"),
    ]))
    .unwrap_err();
    assert!(matches!(err, BridgeError::ConfigError(msg) if msg.contains("HA_SKILL_POLL_WAIT_SECONDS")));
}

#[test]
fn test_app_config_debug_hides_token() {
    let config = AppConfig::from_lookup(lookup(&[("SUPERVISOR_TOKEN", "very-secret")])).unwrap();
    assert!(!format!("{config:?}").contains("very-secret"));
}

#[test]
fn test_app_config_rejects_bad_stack_wait() {
    let err = AppConfig::from_lookup(lookup(&[
        ("SUPERVISOR_TOKEN", "token"),
        ("HA_SKILL_STACK_WAIT_SECONDS", "soon"),
    ]))
    .unwrap_err();
    assert!(matches!(err, BridgeError::ConfigError(msg) if msg.contains("HA_SKILL_STACK_WAIT_SECONDS")));
}
