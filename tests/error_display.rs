use domshot::{DomshotError, ErrorCategory};

#[test]
fn config_error_display_includes_message() {
    let err = DomshotError::config("options.serve must be an array of directories");

    assert_eq!(
        format!("{}", err),
        "Configuration error: options.serve must be an array of directories"
    );
}

#[test]
fn io_error_display_wraps_source() {
    let io_err = std::io::Error::other("disk full");
    let err: DomshotError = io_err.into();
    let rendered = format!("{}", err);

    assert!(rendered.starts_with("IO error: "));
    assert!(rendered.contains("disk full"));
}

#[test]
fn capture_error_display_includes_message() {
    let err = DomshotError::capture("navigation timed out");

    assert_eq!(format!("{}", err), "Capture failed: navigation timed out");
}

#[test]
fn config_and_capture_errors_are_distinguishable() {
    let config = DomshotError::config("bad input");
    let capture = DomshotError::capture("engine exploded");

    assert_eq!(config.category(), ErrorCategory::Config);
    assert_eq!(capture.category(), ErrorCategory::Capture);
    assert_ne!(config.category(), capture.category());
}

#[test]
fn payload_serializes_with_camel_case_keys() {
    let payload = DomshotError::config("bad input").to_payload();
    let value = serde_json::to_value(&payload).unwrap();

    assert_eq!(value["category"], "config");
    assert!(value["message"].as_str().unwrap().contains("bad input"));
    assert!(value.get("remediation").is_some());
}
