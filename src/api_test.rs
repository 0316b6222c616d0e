use super::*;

// =============================================================================
// error_message — server `{message}` extraction with fallbacks
// =============================================================================

#[test]
fn error_message_reads_server_field() {
    let body = r#"{"message": "Invalid username or password."}"#;
    assert_eq!(error_message(body, LOGIN_FALLBACK), "Invalid username or password.");
}

#[test]
fn error_message_non_json_uses_fallback() {
    assert_eq!(error_message("<html>502</html>", LOGIN_FALLBACK), LOGIN_FALLBACK);
}

#[test]
fn error_message_json_without_message_uses_fallback() {
    assert_eq!(error_message(r#"{"error": "nope"}"#, UPDATE_FALLBACK), UPDATE_FALLBACK);
}

#[test]
fn error_message_non_string_message_uses_fallback() {
    assert_eq!(error_message(r#"{"message": 42}"#, PROFILE_FALLBACK), PROFILE_FALLBACK);
}

// =============================================================================
// ApiError
// =============================================================================

#[test]
fn rejected_401_is_auth_invalid() {
    let e = ApiError::Rejected { status: 401, message: "expired".into() };
    assert!(e.is_auth_invalid());
}

#[test]
fn rejected_403_is_auth_invalid() {
    let e = ApiError::Rejected { status: 403, message: "forbidden".into() };
    assert!(e.is_auth_invalid());
}

#[test]
fn rejected_500_is_not_auth_invalid() {
    let e = ApiError::Rejected { status: 500, message: "boom".into() };
    assert!(!e.is_auth_invalid());
}

#[test]
fn transport_is_not_auth_invalid() {
    assert!(!ApiError::Transport("connection refused".into()).is_auth_invalid());
}

#[test]
fn rejected_displays_server_message() {
    let e = ApiError::Rejected { status: 409, message: "Username or email already in use.".into() };
    assert_eq!(e.message(), "Username or email already in use.");
}

// =============================================================================
// Wire types
// =============================================================================

#[test]
fn login_response_with_user_body() {
    let raw = r#"{
        "message": "Login successful",
        "token": "abc.def.ghi",
        "user": {"user_id": 7, "username": "alice", "is_admin": false}
    }"#;
    let resp: LoginResponse = serde_json::from_str(raw).unwrap();
    assert_eq!(resp.token, "abc.def.ghi");
    let user = resp.user.unwrap();
    assert_eq!(user.resolved_id().as_deref(), Some("7"));
    assert_eq!(user.username.as_deref(), Some("alice"));
}

#[test]
fn login_response_without_user_body() {
    let resp: LoginResponse = serde_json::from_str(r#"{"token": "abc.def.ghi"}"#).unwrap();
    assert!(resp.user.is_none());
}

#[test]
fn profile_body_user_id_beats_id() {
    let body: ProfileBody = serde_json::from_str(r#"{"user_id": 7, "id": 99}"#).unwrap();
    assert_eq!(body.resolved_id().as_deref(), Some("7"));
}

#[test]
fn profile_body_falls_back_to_id() {
    let body: ProfileBody = serde_json::from_str(r#"{"id": "99"}"#).unwrap();
    assert_eq!(body.resolved_id().as_deref(), Some("99"));
}

#[test]
fn profile_body_no_id_resolves_none() {
    let body: ProfileBody = serde_json::from_str(r#"{"username": "alice"}"#).unwrap();
    assert!(body.resolved_id().is_none());
}

#[test]
fn profile_body_tolerates_unknown_fields() {
    let body: ProfileBody =
        serde_json::from_str(r#"{"username": "alice", "favorite_anime_count": 12}"#).unwrap();
    assert_eq!(body.username.as_deref(), Some("alice"));
}

#[test]
fn register_payload_omits_absent_options() {
    let payload = RegisterPayload {
        username: "alice".into(),
        email: "alice@example.com".into(),
        password: "hunter2".into(),
        display_name: None,
        admin_code: None,
    };
    let raw = serde_json::to_value(&payload).unwrap();
    assert!(raw.get("display_name").is_none());
    assert!(raw.get("adminCode").is_none());
}

#[test]
fn register_payload_admin_code_uses_backend_key() {
    let payload = RegisterPayload {
        username: "alice".into(),
        email: "a@e".into(),
        password: "pw".into(),
        display_name: Some("Alice".into()),
        admin_code: Some("sesame".into()),
    };
    let raw = serde_json::to_value(&payload).unwrap();
    assert_eq!(raw["adminCode"], "sesame");
    assert_eq!(raw["display_name"], "Alice");
}

#[test]
fn profile_update_skips_none_fields() {
    let fields = ProfileUpdate { display_name: Some("Alice W.".into()), profile_bio: None };
    let raw = serde_json::to_value(&fields).unwrap();
    assert_eq!(raw["display_name"], "Alice W.");
    assert!(raw.get("profile_bio").is_none());
}

// =============================================================================
// HttpAuthApi construction
// =============================================================================

#[test]
fn http_api_trims_base_url_slash() {
    let api = HttpAuthApi::new("http://localhost:5000/", crate::config::HttpTimeouts::default()).unwrap();
    assert_eq!(api.url("/api/auth/login"), "http://localhost:5000/api/auth/login");
}
