//! Durable token storage — the localStorage analog for a native client.
//!
//! CONTRACT
//! ========
//! One fixed slot holding the raw token string. Absence means unauthenticated
//! at startup. The session manager is the only writer: it saves on every
//! transition to a non-empty token and clears on every transition to empty.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

/// Error returned by [`TokenStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying filesystem failure.
    #[error("token storage io error: {0}")]
    Io(#[from] io::Error),
}

/// Persistence seam for the bearer token.
pub trait TokenStore: Send + Sync {
    /// Persist `token`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the token cannot be written.
    fn save(&self, token: &str) -> Result<(), StorageError>;

    /// Read the persisted token, `None` when the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on read failures other than absence.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Remove the persisted token. Clearing an empty slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the slot exists but cannot be removed.
    fn clear(&self) -> Result<(), StorageError>;
}

/// File-backed store: the raw token string at a fixed path.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_owned()))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and storage-less runs.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(token.to_owned());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
