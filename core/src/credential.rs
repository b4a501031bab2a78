//! Bearer token storage.
//!
//! # Design
//! The active session's token lives behind the `CredentialStore` trait and is
//! handed to `ApiClient` explicitly, so nothing reads ambient global state.
//! `FileCredentialStore` is the durable variant: the token survives a process
//! restart and each file is an isolated profile.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Key the token is stored under in the durable credential file.
pub const STORAGE_KEY: &str = "access_token";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to write credential file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove credential file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode credential file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Single-token store backing the active session.
pub trait CredentialStore: Send + Sync {
    /// Persist `token`, replacing any previous one.
    fn store(&self, token: &str) -> Result<(), CredentialError>;

    /// The current token, if any. Never fails.
    fn get(&self) -> Option<String>;

    /// Remove the token. Idempotent.
    fn clear(&self) -> Result<(), CredentialError>;
}

/// Process-local store. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn store(&self, token: &str) -> Result<(), CredentialError> {
        let mut guard = self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut guard = self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    access_token: String,
}

/// Durable store backed by a small JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn store(&self, token: &str) -> Result<(), CredentialError> {
        let encoded = serde_json::to_vec(&StoredCredential {
            access_token: token.to_string(),
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CredentialError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, encoded).map_err(|source| CredentialError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn get(&self) -> Option<String> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cannot read credential file");
                return None;
            }
        };
        match serde_json::from_slice::<StoredCredential>(&raw) {
            Ok(stored) => Some(stored.access_token),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring corrupt credential file");
                None
            }
        }
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CredentialError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
