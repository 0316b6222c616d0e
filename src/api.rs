//! REST transport for the AnimeKo auth endpoints.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures (connect, timeout, body read) and server rejections
//! are distinct variants: the session manager treats 401/403 rejections on
//! the profile endpoint as credential invalidity and everything else as
//! recoverable. Rejection messages come from the server's `{message}` body
//! when it parses, otherwise from a per-endpoint fallback.

use std::time::Duration;

use serde_json::Value;

use crate::config::HttpTimeouts;

pub const LOGIN_FALLBACK: &str = "Login failed. Please check your credentials.";
pub const REGISTER_FALLBACK: &str = "Registration failed";
pub const PROFILE_FALLBACK: &str = "Failed to fetch user profile";
pub const UPDATE_FALLBACK: &str = "Profile update failed";

/// Error returned by [`AuthApi`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP client could not be constructed.
    #[error("http client build failed: {0}")]
    ClientBuild(String),
    /// The request never produced a server response.
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl ApiError {
    /// True when the server rejected the credential itself (401/403).
    #[must_use]
    pub fn is_auth_invalid(&self) -> bool {
        matches!(self, Self::Rejected { status: 401 | 403, .. })
    }

    /// The rejection message when present, otherwise the error display.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, serde::Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Registration payload; `admin_code` elevates the account when it matches
/// the server's configured code.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "adminCode", skip_serializing_if = "Option::is_none")]
    pub admin_code: Option<String>,
}

/// Partial profile update; `None` fields are omitted from the request body.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_bio: Option<String>,
}

/// User fields as the server sends them. Ids arrive under `user_id` or `id`,
/// as JSON numbers or strings, depending on the endpoint.
///
/// `is_admin` is deserialized for completeness but never consulted for
/// authorization; the token claim is the sole source of that flag.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ProfileBody {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub profile_bio: Option<String>,
    #[serde(default)]
    pub visibility_level: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub is_admin: Option<Value>,
}

impl ProfileBody {
    /// Id with the backend's `user_id || id` fallback order, stringified.
    #[must_use]
    pub fn resolved_id(&self) -> Option<String> {
        id_string(self.user_id.as_ref()).or_else(|| id_string(self.id.as_ref()))
    }
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Successful login response: the signed token plus an optional user body.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<ProfileBody>,
}

#[derive(Debug, serde::Deserialize)]
struct UpdateResponse {
    #[serde(default)]
    user: ProfileBody,
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Backend-neutral async trait for the auth endpoints. Enables mocking in
/// tests and swapping the transport without touching the session manager.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token via `POST /api/auth/login`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or server rejection.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Create an account via `POST /api/auth/register`. Returns the raw
    /// creation body; registration does not imply login.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or server rejection.
    async fn register(&self, payload: &RegisterPayload) -> Result<Value, ApiError>;

    /// Fetch the authenticated profile via `GET /api/auth/profile`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`]; 401/403 rejections mean the token is invalid.
    async fn fetch_profile(&self, token: &str) -> Result<ProfileBody, ApiError>;

    /// Update profile fields via `PUT /api/auth/profile`, returning the
    /// server's merged user body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or server rejection.
    async fn update_profile(&self, token: &str, fields: &ProfileUpdate) -> Result<ProfileBody, ApiError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

/// reqwest-backed [`AuthApi`] for a real backend.
pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Build an HTTP transport for `base_url` with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the underlying client fails to
    /// construct.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_body(response: reqwest::Response, fallback: &str) -> Result<String, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(ApiError::Rejected {
                status,
                message: error_message(&text, fallback),
            })
        }
    }
}

/// Extract the server's `message` field from an error body, falling back to
/// `fallback` when the body is not JSON or carries no message.
#[must_use]
pub fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| fallback.to_owned())
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Transport(format!("unexpected response body: {e}")))
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = Self::read_body(response, LOGIN_FALLBACK).await?;
        parse_json(&body)
    }

    async fn register(&self, payload: &RegisterPayload) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(self.url("/api/auth/register"))
            .json(payload)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = Self::read_body(response, REGISTER_FALLBACK).await?;
        parse_json(&body)
    }

    async fn fetch_profile(&self, token: &str) -> Result<ProfileBody, ApiError> {
        let response = self
            .http
            .get(self.url("/api/auth/profile"))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = Self::read_body(response, PROFILE_FALLBACK).await?;
        parse_json(&body)
    }

    async fn update_profile(&self, token: &str, fields: &ProfileUpdate) -> Result<ProfileBody, ApiError> {
        let response = self
            .http
            .put(self.url("/api/auth/profile"))
            .header("Authorization", format!("Bearer {token}"))
            .json(fields)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = Self::read_body(response, UPDATE_FALLBACK).await?;
        let update: UpdateResponse = parse_json(&body)?;
        Ok(update.user)
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
