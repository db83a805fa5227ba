//! Persistent plugin configuration with an in-memory fallback

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Async string key-value persistence
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let contents = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

/// Key under which a plugin's configuration blob lives
pub fn plugin_config_key(plugin_id: &str) -> String {
    format!("plugin:{}:config", plugin_id)
}

/// Plugin configuration store
///
/// Writes are mirrored into memory. Once the backend fails (or when none
/// was supplied) the store keeps serving from memory and warns once.
pub struct PluginConfigStore<B> {
    backend: Option<B>,
    memory: RwLock<HashMap<String, String>>,
    degraded: AtomicBool,
}

impl<B: KeyValueBackend> PluginConfigStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Some(backend),
            memory: RwLock::new(HashMap::new()),
            degraded: AtomicBool::new(false),
        }
    }

    /// Store without persistence
    pub fn in_memory() -> Self {
        Self {
            backend: None,
            memory: RwLock::new(HashMap::new()),
            degraded: AtomicBool::new(true),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.backend.is_some() && !self.degraded.load(Ordering::Relaxed)
    }

    fn active_backend(&self) -> Option<&B> {
        if self.degraded.load(Ordering::Relaxed) {
            None
        } else {
            self.backend.as_ref()
        }
    }

    fn degrade(&self, err: &StoreError) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            warn!("⚠️ Plugin storage unavailable ({}); falling back to in-memory config", err);
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(backend) = self.active_backend() {
            match backend.get(key).await {
                Ok(value) => return value,
                Err(e) => self.degrade(&e),
            }
        }
        self.memory.read().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(backend) = self.active_backend() {
            if let Err(e) = backend.set(key, value.clone()).await {
                self.degrade(&e);
            }
        }
        debug!("plugin config {} updated", key);
        self.memory.write().await.insert(key.to_string(), value);
    }

    pub async fn remove(&self, key: &str) {
        if let Some(backend) = self.active_backend() {
            if let Err(e) = backend.remove(key).await {
                self.degrade(&e);
            }
        }
        self.memory.write().await.remove(key);
    }

    /// Reads and decodes a JSON value; undecodable entries read as absent
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed plugin config {}: {}", key, e);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    struct BrokenBackend;

    impl KeyValueBackend for BrokenBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct OverlayConfig {
        visible: bool,
        corner: String,
    }

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let store = PluginConfigStore::new(MemoryBackend::new());
        assert!(store.is_persistent());

        store.set("a", "1").await;
        assert_eq!(store.get("a").await.as_deref(), Some("1"));

        store.remove("a").await;
        assert_eq!(store.get("a").await, None);
    }

    #[tokio::test]
    async fn test_broken_backend_falls_back_to_memory() {
        let store = PluginConfigStore::new(BrokenBackend);

        store.set("fps:visible", "true").await;
        assert!(!store.is_persistent());
        assert_eq!(store.get("fps:visible").await.as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store: PluginConfigStore<MemoryBackend> = PluginConfigStore::in_memory();
        assert!(!store.is_persistent());
        assert_eq!(store.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_file_backend_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plugins").join("config.json");
        let key = plugin_config_key("fps-overlay");
        let config = OverlayConfig {
            visible: true,
            corner: "top-right".into(),
        };

        let store = PluginConfigStore::new(FileBackend::new(&path));
        store.set_json(&key, &config).await.unwrap();
        assert!(path.exists());

        let reopened = PluginConfigStore::new(FileBackend::new(&path));
        let loaded: Option<OverlayConfig> = reopened.get_json(&key).await;
        assert_eq!(loaded, Some(config));
    }

    #[tokio::test]
    async fn test_corrupt_file_degrades() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = PluginConfigStore::new(FileBackend::new(&path));
        assert_eq!(store.get("x").await, None);
        assert!(!store.is_persistent());

        store.set("x", "y").await;
        assert_eq!(store.get("x").await.as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_malformed_json_value_reads_as_absent() {
        let store = PluginConfigStore::new(MemoryBackend::new());
        store.set("k", "not-json").await;
        let value: Option<OverlayConfig> = store.get_json("k").await;
        assert!(value.is_none());
    }
}
