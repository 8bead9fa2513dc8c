// src/export/store.rs
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Write-once object storage with time-limited read links.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
    /// Read-only, authentication-free URL valid for `ttl`.
    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Used when no bucket is configured: every call fails, which the request
/// handler downgrades to an empty `csvUrl`.
pub struct DisabledStore;

#[async_trait::async_trait]
impl ObjectStore for DisabledStore {
    async fn put(&self, _path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        Err(anyhow!("object storage is not configured"))
    }

    async fn signed_url(&self, _path: &str, _ttl: Duration) -> Result<String> {
        Err(anyhow!("object storage is not configured"))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process store for tests and local runs. URLs use a `memory://` scheme.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut v: Vec<String> = self
            .objects
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        v.sort();
        v
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let mut m = self
            .objects
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        m.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String> {
        let m = self
            .objects
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        if !m.contains_key(path) {
            return Err(anyhow!("no such object: {path}"));
        }
        Ok(format!(
            "memory://{}?expires_in={}",
            urlencoding::encode(path),
            ttl.as_secs()
        ))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
