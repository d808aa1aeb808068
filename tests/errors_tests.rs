use ha_skill_bridge::errors::BridgeError;
use std::error::Error;

#[test]
fn test_bridge_error_implements_error_trait() {
    // Verify BridgeError implements the Error trait
    fn assert_error<T: Error>(_: &T) {}

    let error = BridgeError::ParseError("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_bridge_error_display() {
    let error = BridgeError::AwsError("throttled".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to interact with AWS services: throttled"
    );

    let error = BridgeError::HttpError("Connection error".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to send HTTP request: Connection error"
    );

    let error = BridgeError::StackError("ROLLBACK_COMPLETE".to_string());
    assert_eq!(
        format!("{error}"),
        "CloudFormation stack error: ROLLBACK_COMPLETE"
    );
}

#[test]
fn test_bridge_error_from_conversions() {
    let err = anyhow::anyhow!("test error");
    let bridge_err: BridgeError = err.into();
    match bridge_err {
        BridgeError::AwsError(msg) => assert!(msg.contains("test error")),
        _ => panic!("Unexpected error type"),
    }

    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    assert!(matches!(
        BridgeError::from(json_err),
        BridgeError::ParseError(_)
    ));

    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    assert!(matches!(
        BridgeError::from(io_err),
        BridgeError::ConfigError(_)
    ));

    // Compile-time check that the reqwest conversion exists
    #[allow(unused)]
    #[allow(clippy::items_after_statements)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> BridgeError {
        BridgeError::from(err)
    }
}

#[test]
fn test_only_transient_aws_errors_are_retryable() {
    assert!(BridgeError::AwsTransient("throttled".to_string()).is_transient());
    assert!(!BridgeError::AwsError("AccessDenied".to_string()).is_transient());
    assert!(!BridgeError::QueueError("no URL".to_string()).is_transient());
}
