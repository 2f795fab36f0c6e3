//! Persisted slot for the session token.
//!
//! The slot holds one string. It is cleared only by an explicit logout.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::StorageError;

/// A single persisted token slot.
pub trait TokenStorage: Send + Sync {
    /// The stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the slot cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored token.
    ///
    /// # Errors
    ///
    /// Returns error if the slot cannot be written.
    fn save(&self, token: &str) -> Result<(), StorageError>;

    /// Empty the slot. Clearing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the slot cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Token kept in a file, surviving restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Token kept in memory; for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `token`.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_owned())),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        *self.token.lock() = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.token.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("session").join("token"));

        assert_eq!(storage.load().unwrap(), None);
        storage.save("abc.def").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("abc.def"));

        let reopened = FileTokenStorage::new(storage.path());
        assert_eq!(reopened.load().unwrap().as_deref(), Some("abc.def"));

        storage.clear().unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_blank_file_is_empty_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();

        assert_eq!(FileTokenStorage::new(path).load().unwrap(), None);
    }
}
