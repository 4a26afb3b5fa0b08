use super::*;

#[test]
fn backend_url_config_error_keeps_its_kind() {
    let error = PresenceError::from(ConfigError::InvalidBackendUrl("ftp://vault".to_owned()));
    assert_eq!(error, PresenceError::InvalidBackendUrl("ftp://vault".to_owned()));
}

#[test]
fn invalid_var_maps_to_config_error() {
    let error = PresenceError::from(ConfigError::InvalidVar {
        var: "PRESENCE_RECONNECT_DELAY_MS",
        value: "soon".to_owned(),
    });
    assert_eq!(
        error,
        PresenceError::Config("invalid value for PRESENCE_RECONNECT_DELAY_MS: soon".to_owned())
    );
    assert!(!error.is_retryable());
}

#[test]
fn only_network_errors_are_retryable() {
    assert!(PresenceError::Unreachable("refused".to_owned()).is_retryable());
    assert!(PresenceError::Socket("reset".to_owned()).is_retryable());
    assert!(!PresenceError::InvalidBackendUrl("x".to_owned()).is_retryable());
    assert!(!PresenceError::InvalidUrl("x".to_owned()).is_retryable());
    assert!(!PresenceError::Protocol("x".to_owned()).is_retryable());
}

#[test]
fn errors_serialize_with_kind_and_message() {
    let json = serde_json::to_value(PresenceError::Config("bad".to_owned())).expect("serialize");
    assert_eq!(json, serde_json::json!({"kind": "config", "message": "bad"}));
}
