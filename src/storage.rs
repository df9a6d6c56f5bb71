// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable client storage.
//!
//! A flat string key/value store, the only state that survives a restart.
//! The session token lives under [`TOKEN_KEY`]; a profile snapshot is
//! written under [`PROFILE_SNAPSHOT_KEY`] but never read back as truth.

use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the last profile submitted by onboarding.
pub const PROFILE_SNAPSHOT_KEY: &str = "fitnessUser";

/// String key/value storage shared by the session and the gateway.
pub trait ClientStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Shared handle to client storage.
pub type SharedStorage = Arc<dyn ClientStorage>;

/// Read the stored bearer token.
///
/// Empty values and the stringified `"null"` / `"undefined"` count as absent.
pub fn read_token(storage: &dyn ClientStorage) -> Result<Option<String>> {
    Ok(storage
        .get_item(TOKEN_KEY)?
        .filter(|t| !matches!(t.trim(), "" | "null" | "undefined")))
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| AppError::Storage("storage lock poisoned".to_string()))
    }
}

impl ClientStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Storage persisted as a JSON object in a single file.
///
/// The file is re-read on every access so that another process logging out
/// is seen by the next call; writes replace the file atomically via rename.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// File name used inside the state directory.
    pub const FILE_NAME: &'static str = "storage.json";

    /// Open (or lazily create) storage inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw)
            .map_err(|e| AppError::Storage(format!("parsing {}: {}", self.path.display(), e)))
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("creating {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(items)
            .map_err(|e| AppError::Storage(format!("encoding storage: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| AppError::Storage(format!("writing {}: {}", self.path.display(), e)))
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Storage("storage lock poisoned".to_string()))?;
        let mut items = self.load()?;
        f(&mut items);
        self.save(&items)
    }
}

impl ClientStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|items| {
            items.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch_dir() -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        std::env::temp_dir().join(format!(
            "fittrack-storage-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ))
    }

    #[test]
    fn test_read_token_treats_stringified_null_as_absent() {
        let storage = MemoryStorage::new();
        assert_eq!(read_token(&storage).unwrap(), None);

        for junk in ["null", "undefined", "", "  "] {
            storage.set_item(TOKEN_KEY, junk).unwrap();
            assert_eq!(read_token(&storage).unwrap(), None, "value {:?}", junk);
        }

        storage.set_item(TOKEN_KEY, "abc.def").unwrap();
        assert_eq!(read_token(&storage).unwrap().as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_memory_storage_remove() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v").unwrap();
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
        // Removing a missing key is fine
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = scratch_dir();
        let storage = FileStorage::in_dir(&dir);
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);

        storage.set_item(TOKEN_KEY, "jwt-123").unwrap();
        storage.set_item(PROFILE_SNAPSHOT_KEY, "{}").unwrap();

        let reopened = FileStorage::in_dir(&dir);
        assert_eq!(reopened.get_item(TOKEN_KEY).unwrap().as_deref(), Some("jwt-123"));

        reopened.remove_item(TOKEN_KEY).unwrap();
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get_item(PROFILE_SNAPSHOT_KEY).unwrap().as_deref(), Some("{}"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(FileStorage::FILE_NAME), "not json").unwrap();

        let storage = FileStorage::in_dir(&dir);
        assert!(matches!(storage.get_item(TOKEN_KEY), Err(AppError::Storage(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
