//! Access token sources
//!
//! The client never owns the bearer token. It asks a [`TokenProvider`] for the
//! current value on every request, so rotation by external auth code is picked
//! up without rebuilding the client.

use super::ClientError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Supplies the current access token, if any
pub trait TokenProvider: Send + Sync {
    /// Current token. `None` means the request goes out unauthenticated.
    fn access_token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn access_token(&self) -> Option<String> {
        self()
    }
}

/// A fixed token, e.g. an API key handed over on the command line
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

impl TokenProvider for StaticToken {
    fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Persisted string key-value storage, shaped like the browser storage API
pub trait KeyValueStore: Send + Sync {
    /// Read an entry. Read failures are reported as a missing entry.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write an entry, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError>;

    /// Delete an entry; deleting a missing entry is not an error
    fn remove_item(&self, key: &str) -> Result<(), ClientError>;
}

/// Reads the token from a [`KeyValueStore`] under a fixed key
#[derive(Clone)]
pub struct StoredToken {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl StoredToken {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl TokenProvider for StoredToken {
    fn access_token(&self) -> Option<String> {
        self.store
            .get_item(&self.key)
            .filter(|token| !token.is_empty())
    }
}

/// In-memory store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.entries
            .write()
            .map_err(|_| ClientError::Storage("memory store lock poisoned".into()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), ClientError> {
        self.entries
            .write()
            .map_err(|_| ClientError::Storage("memory store lock poisoned".into()))?
            .remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file (`{"ACCESS_TOKEN": "..."}`)
///
/// The file is re-read on every lookup so values written by other processes
/// are visible immediately. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, ClientError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).map_err(|e| {
            ClientError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        match self.read_entries() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable token store");
                None
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove_item(&self, key: &str) -> Result<(), ClientError> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Browser `localStorage`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError> {
        Self::storage()
            .ok_or_else(|| ClientError::Storage("localStorage unavailable".into()))?
            .set_item(key, value)
            .map_err(|_| ClientError::Storage(format!("failed to write {key}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), ClientError> {
        Self::storage()
            .ok_or_else(|| ClientError::Storage("localStorage unavailable".into()))?
            .remove_item(key)
            .map_err(|_| ClientError::Storage(format!("failed to remove {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_token_reads_configured_key() {
        let store = MemoryStore::new();
        store.set_item("ACCESS_TOKEN", "abc123").unwrap();
        let provider = StoredToken::new(Arc::new(store), "ACCESS_TOKEN");

        assert_eq!(provider.access_token().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let store = MemoryStore::new();
        store.set_item("ACCESS_TOKEN", "").unwrap();
        let provider = StoredToken::new(Arc::new(store), "ACCESS_TOKEN");

        assert_eq!(provider.access_token(), None);
    }

    #[test]
    fn test_closure_is_a_provider() {
        let provider = || Some("from-closure".to_string());
        assert_eq!(provider.access_token().as_deref(), Some("from-closure"));
    }

    #[test]
    fn test_static_token_debug_is_redacted() {
        let token = StaticToken::new("secret");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn test_file_store_roundtrip_and_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state").join("tokens.json"));

        assert_eq!(store.get_item("ACCESS_TOKEN"), None);

        store.set_item("ACCESS_TOKEN", "first").unwrap();
        store.set_item("REFRESH_TOKEN", "other").unwrap();
        assert_eq!(store.get_item("ACCESS_TOKEN").as_deref(), Some("first"));

        // Another writer rotates the token behind our back
        let writer = FileStore::new(store.path());
        writer.set_item("ACCESS_TOKEN", "second").unwrap();
        assert_eq!(store.get_item("ACCESS_TOKEN").as_deref(), Some("second"));

        store.remove_item("ACCESS_TOKEN").unwrap();
        assert_eq!(store.get_item("ACCESS_TOKEN"), None);
        assert_eq!(store.get_item("REFRESH_TOKEN").as_deref(), Some("other"));
    }

    #[test]
    fn test_corrupt_file_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get_item("ACCESS_TOKEN"), None);
        assert!(store.set_item("ACCESS_TOKEN", "x").is_err());
    }
}
