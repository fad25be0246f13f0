//! Persistence of the session credential as a JSON token file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fqcs_model::Credential;

use crate::domains::auth::errors::{AuthResult, StorageError};

/// Reads and writes the token file. The file mirrors the in-memory
/// credential: written in full on every save, removed on logout.
#[derive(Debug, Clone)]
pub struct CredentialStorage {
    path: PathBuf,
}

impl CredentialStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential. A missing file means no session.
    pub async fn load(&self) -> AuthResult<Option<Credential>> {
        read_credential(&self.path).await
    }

    pub async fn save(&self, credential: &Credential) -> AuthResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StorageError::WriteFailed)?;
        }

        let json = serde_json::to_string_pretty(credential)
            .map_err(StorageError::EncodeFailed)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(StorageError::WriteFailed)?;

        log::debug!(
            "[TokenLifecycle] Token saved to {}",
            self.path.display()
        );
        Ok(())
    }

    /// Remove the token file. Removing an absent file succeeds.
    pub async fn delete(&self) -> AuthResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(e).into()),
        }
    }
}

/// Read a credential file, treating a missing file as `None`.
pub async fn read_credential(path: &Path) -> AuthResult<Option<Credential>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::ReadFailed(e).into()),
    };
    let credential = serde_json::from_str(&content)
        .map_err(StorageError::CorruptedData)?;
    Ok(Some(credential))
}
