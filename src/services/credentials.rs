// src/services/credentials.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Username to password-hash storage.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn lookup(&self, username: &str) -> Option<String>;

    /// Returns `false` (and changes nothing) when the username is taken.
    async fn insert_if_absent(&self, username: &str, password_hash: String) -> bool;

    async fn persist(&self) -> Result<(), StoreError>;
}

/// Credentials kept in a single pretty-printed JSON object on disk.
///
/// Writes are serialized and land through a sibling temp file plus rename,
/// so the file on disk always holds one complete snapshot.
pub struct JsonFileStore {
    path: PathBuf,
    users: RwLock<BTreeMap<String, String>>,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Loads `path`, creating it as `{}` when it does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let users = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::write(&path, "{}").await?;
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), "Credential store loaded");

        Ok(Self {
            path,
            users: RwLock::new(users),
            write_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl CredentialStore for JsonFileStore {
    async fn lookup(&self, username: &str) -> Option<String> {
        self.users.read().await.get(username).cloned()
    }

    async fn insert_if_absent(&self, username: &str, password_hash: String) -> bool {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return false;
        }
        users.insert(username.to_string(), password_hash);
        true
    }

    async fn persist(&self) -> Result<(), StoreError> {
        // Held across snapshot and rename: a later snapshot never loses to an older one.
        let _guard = self.write_lock.lock().await;

        let body = {
            let users = self.users.read().await;
            serde_json::to_string_pretty(&*users)?
        };

        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

/// In-process store; `persist` is a no-op.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn lookup(&self, username: &str) -> Option<String> {
        self.users.read().await.get(username).cloned()
    }

    async fn insert_if_absent(&self, username: &str, password_hash: String) -> bool {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return false;
        }
        users.insert(username.to_string(), password_hash);
        true
    }

    async fn persist(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
