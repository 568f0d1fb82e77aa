//! Session Token Storage
//!
//! The account client never reads ambient state for its bearer token; it
//! asks a [`TokenProvider`]. The CLI uses [`FileTokenStore`], tests use
//! [`MemoryTokenStore`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::AccountError;

/// Key the token is stored under
pub const TOKEN_KEY: &str = "session_token";

/// Source and sink of the account session token
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The current token, if signed in
    async fn token(&self) -> Result<Option<String>, AccountError>;

    /// Persist a token
    async fn store(&self, token: &str) -> Result<(), AccountError>;

    /// Forget the token
    async fn clear(&self) -> Result<(), AccountError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
}

/// Token persisted as `{"session_token": "..."}` in a JSON file
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the token file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<TokenFile, AccountError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TokenFile::default()),
            Err(e) => return Err(AccountError::Token(format!("{}: {e}", self.path.display()))),
        };
        serde_json::from_str(&raw)
            .map_err(|e| AccountError::Token(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl TokenProvider for FileTokenStore {
    async fn token(&self) -> Result<Option<String>, AccountError> {
        Ok(self
            .read_file()
            .await?
            .session_token
            .filter(|t| !t.trim().is_empty()))
    }

    async fn store(&self, token: &str) -> Result<(), AccountError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AccountError::Token(format!("{}: {e}", parent.display())))?;
        }
        let body = serde_json::to_string_pretty(&TokenFile {
            session_token: Some(token.to_string()),
        })
        .map_err(|e| AccountError::Token(e.to_string()))?;

        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| AccountError::Token(format!("{}: {e}", self.path.display())))?;
        tracing::debug!(path = %self.path.display(), "Stored session token");
        Ok(())
    }

    async fn clear(&self) -> Result<(), AccountError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Cleared session token");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AccountError::Token(format!("{}: {e}", self.path.display()))),
        }
    }
}

/// In-memory token, for tests and one-off invocations
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// A store already holding `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenProvider for MemoryTokenStore {
    async fn token(&self) -> Result<Option<String>, AccountError> {
        Ok(self.token.lock().clone())
    }

    async fn store(&self, token: &str) -> Result<(), AccountError> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AccountError> {
        *self.token.lock() = None;
        Ok(())
    }
}
