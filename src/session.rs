//! Session manager — the client-side authentication state machine.
//!
//! ARCHITECTURE
//! ============
//! One `SessionManager` per running application, constructed with injected
//! collaborators (transport, token store, token decoder) and shared by
//! reference. State changes are published as whole [`SessionSnapshot`]
//! values over a `tokio::sync::watch` channel, so readers never observe a
//! partially-applied update and can subscribe instead of polling.
//!
//! TOKEN RESOLUTION
//! ================
//! Two-phase: claims are decoded synchronously the moment a token appears,
//! populating a provisional user so role-gated consumers can render without
//! waiting on the network; the profile endpoint then confirms (or rejects)
//! the session asynchronously. A 401/403 on that confirm forces logout;
//! any other failure keeps the claims-derived user. An epoch counter
//! guards against a slow fetch for an old token clobbering newer state.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::api::{ApiError, AuthApi, HttpAuthApi, PROFILE_FALLBACK, ProfileUpdate, RegisterPayload};
use crate::claims::{Claims, DecodeError, JwtPayloadDecoder, TokenDecoder};
use crate::config::SessionConfig;
use crate::storage::{FileTokenStore, MemoryTokenStore, TokenStore};
use crate::user::SessionUser;

pub const SESSION_EXPIRED: &str = "Session expired. Please login again.";

/// Error returned by session operations. Every failure is also recorded in
/// the snapshot's `error` field before it is returned, except
/// [`SessionError::Superseded`], which belongs to a session that no longer
/// exists and must not pollute its successor's state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation requires a token and none is set.
    #[error("not authenticated")]
    NotAuthenticated,
    /// The session changed (logout or token replacement) before the
    /// operation resolved; its result was discarded.
    #[error("session changed before the operation completed")]
    Superseded,
    /// The backend rejected the token; the session has been logged out.
    #[error("{message}")]
    Expired { message: String },
    /// Transport or server failure from the backend.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The token payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Immutable view of the session, published on every state change.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: Option<SessionUser>,
    pub token: Option<String>,
    /// True from construction until the initial resolution settles.
    pub loading: bool,
    /// Last operation's failure message, cleared when a new one starts.
    pub error: Option<String>,
    /// One-shot flag set on logout; rearm with
    /// [`SessionManager::reset_logout_signal`].
    pub logout_signal: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
            error: None,
            logout_signal: false,
        }
    }
}

impl SessionSnapshot {
    /// True when a token is set and a user (provisional or confirmed)
    /// resolved.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// Admin flag, always claims-sourced via the user record.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

#[derive(Debug, Default)]
struct Inner {
    token: Option<String>,
    user: Option<SessionUser>,
    loading: bool,
    error: Option<String>,
    logout_signal: bool,
    /// Bumped on every token transition; in-flight fetches capture it at
    /// launch and discard their result if it moved before resolution.
    epoch: u64,
}

impl Inner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            token: self.token.clone(),
            loading: self.loading,
            error: self.error.clone(),
            logout_signal: self.logout_signal,
        }
    }
}

/// The session state machine. See the module docs for the resolution model.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    decoder: Arc<dyn TokenDecoder>,
    inner: Mutex<Inner>,
    tx: tokio::sync::watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    /// Build a manager from injected collaborators. The session starts in
    /// `loading` until [`restore`](Self::restore) settles.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>, decoder: Arc<dyn TokenDecoder>) -> Self {
        let inner = Inner { loading: true, ..Inner::default() };
        let (tx, _rx) = tokio::sync::watch::channel(inner.snapshot());
        Self { api, store, decoder, inner: Mutex::new(inner), tx }
    }

    /// Wire the real transport, token store, and JWT decoder from config.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the HTTP client fails to build.
    pub fn from_config(config: &SessionConfig) -> Result<Self, ApiError> {
        let api = Arc::new(HttpAuthApi::new(&config.base_url, config.timeouts)?);
        let store: Arc<dyn TokenStore> = match &config.token_path {
            Some(path) => Arc::new(FileTokenStore::new(path.clone())),
            None => Arc::new(MemoryTokenStore::new()),
        };
        Ok(Self::new(api, store, Arc::new(JwtPayloadDecoder)))
    }

    /// Wire from `ANIMEKO_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the HTTP client fails to build.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_config(&SessionConfig::from_env())
    }

    /// Current state. Prefer [`subscribe`](Self::subscribe) for reactive
    /// consumers.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Watch receiver delivering every snapshot the manager publishes.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut inner);
        self.tx.send_replace(inner.snapshot());
        out
    }

    // =========================================================================
    // STARTUP
    // =========================================================================

    /// Resolve the persisted token, if any: decode claims synchronously
    /// (provisional user), then confirm against the profile endpoint.
    /// Errors settle into the snapshot rather than propagating; startup has
    /// no caller to hand them to. Returns the resolved user, `None` when
    /// the session ends unauthenticated.
    pub async fn restore(&self) -> Option<SessionUser> {
        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted token");
                None
            }
        };

        let Some(token) = token else {
            self.with_inner(|inner| inner.loading = false);
            return None;
        };

        let claims = match self.decoder.decode(&token) {
            Ok(claims) => claims,
            Err(e) => {
                // Keep the raw token: the profile-fetch path decides its
                // fate, and it is never reached without decodable claims.
                tracing::debug!(error = %e, "persisted token did not decode");
                self.with_inner(|inner| {
                    inner.token = Some(token);
                    inner.epoch += 1;
                    inner.loading = false;
                });
                return None;
            }
        };

        // The epoch is captured under the same lock that commits the token,
        // so a logout interleaved before the fetch launches still moves it.
        let epoch = self.with_inner(|inner| {
            inner.token = Some(token.clone());
            inner.epoch += 1;
            inner.user = Some(SessionUser::from_claims(&claims));
            inner.epoch
        });
        tracing::debug!(username = %claims.username, "session restored from persisted token");

        match self.confirm_profile(&token, &claims, epoch).await {
            Ok(user) => Some(user),
            Err(SessionError::Expired { .. }) => None,
            // Transient failure: the claims-derived user stands.
            Err(_) => self.snapshot().user,
        }
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Exchange credentials for a session via `POST /api/auth/login`.
    ///
    /// The admin flag of the resulting user comes from the returned token's
    /// claims, never from the response body.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] and leaves token/user untouched when the
    /// backend rejects the credentials or the request fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionUser, SessionError> {
        self.begin_operation();

        let response = match self.api.login(username, password).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail_operation(e)),
        };

        let claims = self.decoder.decode(&response.token);
        let user = match (response.user.as_ref(), &claims) {
            (Some(body), Ok(claims)) => Some(SessionUser::from_profile(claims, body)),
            (Some(body), Err(e)) => {
                tracing::debug!(error = %e, "login token did not decode; using response body without admin");
                Some(SessionUser::from_login_body(body))
            }
            (None, Ok(claims)) => Some(SessionUser::from_claims(claims)),
            (None, Err(_)) => None,
        };

        if let Err(e) = self.store.save(&response.token) {
            tracing::warn!(error = %e, "failed to persist session token");
        }
        let epoch = self.with_inner(|inner| {
            inner.token = Some(response.token.clone());
            inner.epoch += 1;
            inner.user = user.clone();
            inner.loading = false;
            inner.epoch
        });

        let Some(user) = user else {
            // No user in the body and an undecodable token: the token is
            // committed (the server signed it) but no identity resolved.
            let err = match claims {
                Err(e) => SessionError::from(e),
                Ok(_) => SessionError::NotAuthenticated,
            };
            let message = err.to_string();
            self.with_inner(|inner| inner.error = Some(message));
            return Err(err);
        };

        // The token transition to present triggers the same profile
        // confirmation as a restored token: the login body carries only a
        // minimal user record, the profile endpoint holds the rest. A
        // failed confirmation does not undo a successful login.
        let resolved = match &claims {
            Ok(token_claims) => match self.confirm_profile(&response.token, token_claims, epoch).await {
                Ok(confirmed) => confirmed,
                Err(e) => {
                    tracing::debug!(error = %e, "post-login profile confirmation failed");
                    user
                }
            },
            Err(_) => user,
        };
        tracing::info!(username = %resolved.username, "login succeeded");
        Ok(resolved)
    }

    /// Clear the session. Synchronous and infallible; sets the one-shot
    /// logout signal for consumers that must react to a forced logout.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear persisted token");
        }
        self.with_inner(|inner| {
            inner.token = None;
            inner.user = None;
            inner.epoch += 1;
            inner.logout_signal = true;
        });
        tracing::info!("logged out");
    }

    /// Rearm the one-shot logout signal.
    pub fn reset_logout_signal(&self) {
        self.with_inner(|inner| inner.logout_signal = false);
    }

    /// Create an account via `POST /api/auth/register`. Success does not
    /// mutate session state; registration does not imply login.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] carrying the server's message on
    /// rejection.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<Value, SessionError> {
        self.begin_operation();
        match self.api.register(payload).await {
            Ok(body) => {
                self.with_inner(|inner| inner.loading = false);
                tracing::info!(username = %payload.username, "registration succeeded");
                Ok(body)
            }
            Err(e) => Err(self.fail_operation(e)),
        }
    }

    /// Update profile fields via `PUT /api/auth/profile`, merging the
    /// server's response over the current user while re-asserting the admin
    /// flag from the token's claims.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`]; on failure the profile is left unchanged.
    /// [`SessionError::Superseded`] means the session changed while the
    /// request was in flight and the response was dropped.
    pub async fn update_profile(&self, fields: &ProfileUpdate) -> Result<SessionUser, SessionError> {
        let (token, epoch) = match self.with_inner(|inner| {
            inner.loading = true;
            inner.error = None;
            inner.token.clone().map(|t| (t, inner.epoch))
        }) {
            Some(pair) => pair,
            None => {
                self.with_inner(|inner| {
                    inner.loading = false;
                    inner.error = Some(SessionError::NotAuthenticated.to_string());
                });
                return Err(SessionError::NotAuthenticated);
            }
        };

        let body = match self.api.update_profile(&token, fields).await {
            Ok(body) => body,
            Err(e) => return Err(self.fail_operation(e)),
        };

        let claims = match self.decoder.decode(&token) {
            Ok(claims) => claims,
            Err(e) => {
                self.with_inner(|inner| {
                    inner.loading = false;
                    inner.error = Some(e.to_string());
                });
                return Err(e.into());
            }
        };

        let applied = self.with_inner(|inner| {
            if inner.epoch != epoch {
                tracing::debug!("discarding profile update resolved after token change");
                inner.loading = false;
                return None;
            }
            let mut user = inner
                .user
                .clone()
                .unwrap_or_else(|| SessionUser::from_claims(&claims));
            user.apply_profile(&body);
            user.is_admin = claims.is_admin;
            inner.user = Some(user.clone());
            inner.loading = false;
            Some(user)
        });
        applied.ok_or(SessionError::Superseded)
    }

    /// Re-confirm the current session against the profile endpoint. Same
    /// path [`restore`](Self::restore) drives at startup: 401/403 forces
    /// logout, transient failures keep the claims-derived user.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotAuthenticated`] without a token,
    /// [`SessionError::Expired`] when the backend rejects it, or the
    /// underlying [`ApiError`]/[`DecodeError`].
    pub async fn refresh_profile(&self) -> Result<SessionUser, SessionError> {
        let current = self.with_inner(|inner| {
            inner.error = None;
            inner.token.clone().map(|t| (t, inner.epoch))
        });
        let Some((token, epoch)) = current else {
            self.with_inner(|inner| inner.loading = false);
            return Err(SessionError::NotAuthenticated);
        };

        let claims = match self.decoder.decode(&token) {
            Ok(claims) => claims,
            Err(e) => {
                self.with_inner(|inner| {
                    inner.loading = false;
                    inner.error = Some(e.to_string());
                });
                return Err(e.into());
            }
        };

        self.with_inner(|inner| {
            if inner.user.is_none() {
                inner.user = Some(SessionUser::from_claims(&claims));
            }
        });

        self.confirm_profile(&token, &claims, epoch).await
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Network half of the two-phase resolution. `token`/`claims`/`epoch`
    /// are the values captured when the fetch was initiated; state is only
    /// applied if the token epoch has not moved since, otherwise the result
    /// is dropped and [`SessionError::Superseded`] returned.
    async fn confirm_profile(
        &self,
        token: &str,
        claims: &Claims,
        epoch: u64,
    ) -> Result<SessionUser, SessionError> {
        match self.api.fetch_profile(token).await {
            Ok(body) => {
                let user = SessionUser::from_profile(claims, &body);
                let fresh = self.with_inner(|inner| {
                    let fresh = inner.epoch == epoch;
                    if fresh {
                        inner.user = Some(user.clone());
                    } else {
                        tracing::debug!("discarding stale profile response");
                    }
                    inner.loading = false;
                    fresh
                });
                if fresh {
                    Ok(user)
                } else {
                    Err(SessionError::Superseded)
                }
            }
            Err(e) if e.is_auth_invalid() => {
                let message = match &e {
                    ApiError::Rejected { message, .. } if message.as_str() != PROFILE_FALLBACK => message.clone(),
                    _ => SESSION_EXPIRED.to_owned(),
                };
                let fresh = self.with_inner(|inner| {
                    let fresh = inner.epoch == epoch;
                    if fresh {
                        inner.token = None;
                        inner.user = None;
                        inner.epoch += 1;
                        inner.logout_signal = true;
                        inner.error = Some(message.clone());
                    }
                    inner.loading = false;
                    fresh
                });
                if !fresh {
                    return Err(SessionError::Superseded);
                }
                tracing::warn!(status = ?e, "token rejected by profile endpoint; logging out");
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "failed to clear persisted token");
                }
                Err(SessionError::Expired { message })
            }
            Err(e) => {
                let message = e.message();
                self.with_inner(|inner| {
                    if inner.epoch == epoch {
                        inner.error = Some(message);
                    }
                    inner.loading = false;
                });
                Err(e.into())
            }
        }
    }

    fn begin_operation(&self) {
        self.with_inner(|inner| {
            inner.loading = true;
            inner.error = None;
        });
    }

    fn fail_operation(&self, e: ApiError) -> SessionError {
        let message = e.message();
        self.with_inner(|inner| {
            inner.error = Some(message);
            inner.loading = false;
        });
        e.into()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
