//! Client-side session manager for the AnimeKo REST API.
//!
//! This crate owns the bearer-token lifecycle for a native AnimeKo client:
//! it persists the token between runs, decodes identity and role claims
//! from it, reconciles those claims against the server-fetched profile, and
//! exposes the resulting session state through an atomic snapshot/subscribe
//! interface plus `login` / `logout` / `register` / `update_profile`
//! operations.
//!
//! Claims are the sole source of authorization-relevant flags; the profile
//! is display-only data. See [`session::SessionManager`] for the resolution
//! model.

pub mod api;
pub mod claims;
pub mod config;
pub mod session;
pub mod storage;
pub mod user;

pub use api::{ApiError, AuthApi, HttpAuthApi, LoginResponse, ProfileBody, ProfileUpdate, RegisterPayload};
pub use claims::{Claims, DecodeError, JwtPayloadDecoder, TokenDecoder};
pub use config::SessionConfig;
pub use session::{SessionError, SessionManager, SessionSnapshot};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore};
pub use user::SessionUser;
