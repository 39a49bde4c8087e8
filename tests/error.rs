use std::path::PathBuf;

use serde_json::Value;
use taskflow::error::{exit_codes, Error};

#[test]
fn exit_code_user_error() {
    let err = Error::InvalidArgument("bad input".to_string());
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

    let err = Error::TaskNotFound("abc123".to_string());
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[test]
fn exit_code_operation_failed() {
    let err = Error::OperationFailed("boom".to_string());
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);

    let err = Error::Assistant("Rate limit exceeded".to_string());
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn details_include_unknown_option_fields() {
    let err = "urgent".parse::<taskflow::task::Priority>().expect_err("unknown");
    let details = err.details().expect("details");
    assert_eq!(details["kind"], Value::String("priority".to_string()));
    assert_eq!(details["value"], Value::String("urgent".to_string()));
    assert_eq!(
        details["expected"],
        Value::String("high, medium, low".to_string())
    );
}

#[test]
fn details_include_ambiguous_id_fields() {
    let err = Error::AmbiguousTaskId {
        input: "01h".to_string(),
        matches: 3,
    };
    let details = err.details().expect("details");
    assert_eq!(details["input"], Value::String("01h".to_string()));
    assert_eq!(details["matches"], Value::from(3));
}

#[test]
fn config_errors_carry_path_or_message() {
    let err = Error::ConfigNotFound(PathBuf::from("/tmp/missing.toml"));
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert_eq!(err.details().expect("details")["path"], "/tmp/missing.toml");

    let err = Error::InvalidConfig("bad config".to_string());
    assert_eq!(err.details().expect("details")["message"], "bad config");
}

#[test]
fn transport_errors_have_no_details() {
    let err = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    assert!(err.details().is_none());
}
