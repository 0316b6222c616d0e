//! Token claims — unverified JWT payload decode and admin-flag normalization.
//!
//! TRUST MODEL
//! ===========
//! The client never verifies the token signature; it only reads the payload
//! the server signed. Claims are the sole source of authorization-relevant
//! flags (`is_admin`), while the fetched profile is display-only data.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

/// Error returned by [`decode_claims`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The token does not have the `header.payload.signature` shape.
    #[error("malformed token: expected three dot-separated segments")]
    MalformedToken,
    /// The payload segment is not valid base64url.
    #[error("invalid payload encoding: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded payload is not a JSON object.
    #[error("invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A claim the session depends on is absent.
    #[error("missing claim `{0}`")]
    MissingClaim(&'static str),
}

/// Identity and authorization fields decoded from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject id. The backend issues numeric ids; stringified here since
    /// the claim arrives as either a JSON number or string.
    pub id: String,
    /// Login name, also the display-name fallback.
    pub username: String,
    /// Email claim, absent on older tokens.
    pub email: Option<String>,
    /// Admin flag, normalized by [`admin_flag`].
    pub is_admin: bool,
}

/// Decode seam for the session manager. Injected so the token format can be
/// swapped or mocked without touching the state machine.
pub trait TokenDecoder: Send + Sync {
    /// Decode `token` into [`Claims`].
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the token is malformed or lacks the
    /// claims the session depends on.
    fn decode(&self, token: &str) -> Result<Claims, DecodeError>;
}

/// Default decoder: reads the JWT payload segment without verifying the
/// signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtPayloadDecoder;

impl TokenDecoder for JwtPayloadDecoder {
    fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        decode_claims(token)
    }
}

/// Normalize the `is_admin` claim. The backend has emitted the flag as a
/// boolean, a Postgres `"t"`, a numeric `1`, and the strings `"true"`/`"1"`
/// across schema migrations; all of them mean admin.
#[must_use]
pub fn admin_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => matches!(s.as_str(), "t" | "true" | "1"),
        _ => false,
    }
}

/// Decode the payload segment of `token` into [`Claims`].
///
/// # Errors
///
/// Returns a [`DecodeError`] if the token is not three dot-separated
/// segments, the payload is not base64url JSON, or the `id`/`username`
/// claims are missing.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(DecodeError::MalformedToken);
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: Value = serde_json::from_slice(&bytes)?;

    let id = match claims.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(DecodeError::MissingClaim("id")),
    };
    let username = match claims.get("username") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(DecodeError::MissingClaim("username")),
    };
    let email = claims
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(Claims {
        id,
        username,
        email,
        is_admin: admin_flag(claims.get("is_admin")),
    })
}


#[cfg(test)]
#[path = "claims_test.rs"]
mod tests;
