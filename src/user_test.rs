use super::*;

fn claims(is_admin: bool) -> Claims {
    Claims {
        id: "7".to_owned(),
        username: "alice".to_owned(),
        email: Some("alice@example.com".to_owned()),
        is_admin,
    }
}

// =============================================================================
// from_claims — provisional user
// =============================================================================

#[test]
fn from_claims_fills_display_fields() {
    let user = SessionUser::from_claims(&claims(true));
    assert_eq!(user.id, "7");
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.display_name, "alice");
    assert_eq!(user.visibility_level, "public");
    assert!(user.is_admin);
}

#[test]
fn from_claims_missing_email_is_empty() {
    let mut c = claims(false);
    c.email = None;
    let user = SessionUser::from_claims(&c);
    assert_eq!(user.email, "");
}

// =============================================================================
// from_profile — server overlay, admin stays claims-sourced
// =============================================================================

#[test]
fn from_profile_overlays_server_fields() {
    let body = ProfileBody {
        user_id: Some(serde_json::json!(7)),
        display_name: Some("Alice W.".to_owned()),
        profile_bio: Some("likes mecha".to_owned()),
        created_at: Some("2024-01-01T00:00:00Z".to_owned()),
        subscription_status: Some("premium".to_owned()),
        profile_picture_url: Some("https://cdn/a.png".to_owned()),
        ..ProfileBody::default()
    };
    let user = SessionUser::from_profile(&claims(false), &body);
    assert_eq!(user.display_name, "Alice W.");
    assert_eq!(user.profile_bio, "likes mecha");
    assert_eq!(user.created_at, "2024-01-01T00:00:00Z");
    assert_eq!(user.subscription_status, "premium");
    assert_eq!(user.profile_picture_url, "https://cdn/a.png");
    // Claims fields survive where the body is silent.
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
}

#[test]
fn from_profile_admin_claim_beats_body() {
    let body = ProfileBody {
        is_admin: Some(serde_json::json!(true)),
        ..ProfileBody::default()
    };
    let user = SessionUser::from_profile(&claims(false), &body);
    assert!(!user.is_admin);

    let body = ProfileBody {
        is_admin: Some(serde_json::json!(false)),
        ..ProfileBody::default()
    };
    let user = SessionUser::from_profile(&claims(true), &body);
    assert!(user.is_admin);
}

#[test]
fn from_profile_missing_fields_keep_defaults() {
    let user = SessionUser::from_profile(&claims(false), &ProfileBody::default());
    assert_eq!(user.display_name, "alice");
    assert_eq!(user.visibility_level, "public");
    assert_eq!(user.profile_bio, "");
}

// =============================================================================
// apply_profile — partial merge
// =============================================================================

#[test]
fn apply_profile_keeps_untouched_fields() {
    let mut user = SessionUser::from_claims(&claims(true));
    user.profile_bio = "old bio".to_owned();
    user.apply_profile(&ProfileBody {
        display_name: Some("New Name".to_owned()),
        ..ProfileBody::default()
    });
    assert_eq!(user.display_name, "New Name");
    assert_eq!(user.profile_bio, "old bio");
    assert!(user.is_admin);
}

#[test]
fn apply_profile_never_touches_admin() {
    let mut user = SessionUser::from_claims(&claims(true));
    user.apply_profile(&ProfileBody {
        is_admin: Some(serde_json::json!("f")),
        ..ProfileBody::default()
    });
    assert!(user.is_admin);
}

// =============================================================================
// from_login_body — no claims, no admin
// =============================================================================

#[test]
fn from_login_body_admin_always_false() {
    let body = ProfileBody {
        id: Some(serde_json::json!(9)),
        username: Some("mallory".to_owned()),
        is_admin: Some(serde_json::json!(true)),
        ..ProfileBody::default()
    };
    let user = SessionUser::from_login_body(&body);
    assert_eq!(user.id, "9");
    assert_eq!(user.username, "mallory");
    assert!(!user.is_admin);
}

#[test]
fn from_login_body_display_name_falls_back_to_username() {
    let body = ProfileBody {
        username: Some("mallory".to_owned()),
        ..ProfileBody::default()
    };
    let user = SessionUser::from_login_body(&body);
    assert_eq!(user.display_name, "mallory");
}
