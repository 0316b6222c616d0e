//! Session user record and claims/profile merge rules.
//!
//! MERGE POLICY
//! ============
//! A user is first built from token claims alone (provisional, so role-gated
//! UI can render before the network settles), then overlaid with server
//! profile fields when the fetch confirms. `is_admin` is re-asserted from
//! claims at every merge; profile responses never influence it.

use crate::api::ProfileBody;
use crate::claims::Claims;

/// The resolved user exposed through session snapshots.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SessionUser {
    /// Backend user id (stringified; the server issues integers).
    pub id: String,
    /// Login name.
    pub username: String,
    /// Email address, empty when unknown.
    pub email: String,
    /// Display name, falls back to the username.
    pub display_name: String,
    /// Free-form profile bio.
    pub profile_bio: String,
    /// Profile visibility level, defaults to `"public"`.
    pub visibility_level: String,
    /// Account creation timestamp as reported by the server.
    pub created_at: String,
    /// Subscription status string.
    pub subscription_status: String,
    /// Avatar image URL, empty when unset.
    pub profile_picture_url: String,
    /// Admin flag, always sourced from token claims.
    pub is_admin: bool,
}

impl SessionUser {
    /// Build a provisional user from token claims alone.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.id.clone(),
            username: claims.username.clone(),
            email: claims.email.clone().unwrap_or_default(),
            display_name: claims.username.clone(),
            profile_bio: String::new(),
            visibility_level: "public".to_owned(),
            created_at: String::new(),
            subscription_status: String::new(),
            profile_picture_url: String::new(),
            is_admin: claims.is_admin,
        }
    }

    /// Build a confirmed user by overlaying server profile fields onto
    /// claims. Missing server fields keep their claims-derived or default
    /// values; `is_admin` comes from `claims` regardless of the body.
    #[must_use]
    pub fn from_profile(claims: &Claims, body: &ProfileBody) -> Self {
        let mut user = Self::from_claims(claims);
        user.apply_profile(body);
        user
    }

    /// Build a user from a login response body when the token itself did
    /// not decode. Without claims there is no trusted admin source, so the
    /// flag stays false whatever the body says.
    #[must_use]
    pub fn from_login_body(body: &ProfileBody) -> Self {
        let mut user = Self {
            id: String::new(),
            username: String::new(),
            email: String::new(),
            display_name: String::new(),
            profile_bio: String::new(),
            visibility_level: "public".to_owned(),
            created_at: String::new(),
            subscription_status: String::new(),
            profile_picture_url: String::new(),
            is_admin: false,
        };
        user.apply_profile(body);
        user
    }

    /// Overlay the non-empty fields of a profile body onto this user,
    /// keeping `is_admin` untouched.
    pub fn apply_profile(&mut self, body: &ProfileBody) {
        if let Some(id) = body.resolved_id() {
            self.id = id;
        }
        if let Some(username) = &body.username {
            self.username = username.clone();
        }
        if let Some(email) = &body.email {
            self.email = email.clone();
        }
        if let Some(display_name) = &body.display_name {
            self.display_name = display_name.clone();
        } else if self.display_name.is_empty() {
            self.display_name = self.username.clone();
        }
        if let Some(bio) = &body.profile_bio {
            self.profile_bio = bio.clone();
        }
        if let Some(visibility) = &body.visibility_level {
            self.visibility_level = visibility.clone();
        }
        if let Some(created_at) = &body.created_at {
            self.created_at = created_at.clone();
        }
        if let Some(status) = &body.subscription_status {
            self.subscription_status = status.clone();
        }
        if let Some(url) = &body.profile_picture_url {
            self.profile_picture_url = url.clone();
        }
    }
}

#[cfg(test)]
#[path = "user_test.rs"]
mod tests;
