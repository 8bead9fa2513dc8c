//! Client-side state kept between runs: recent searches and the API key,
//! both on a small key-value store.

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const KEY_API_KEY: &str = "gemini_api_key";
pub const KEY_SEARCH_HISTORY: &str = "search_history";
pub const HISTORY_CAP: usize = 5;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryKv {
    inner: Mutex<BTreeMap<String, String>>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let m = self.inner.lock().map_err(|_| anyhow!("kv mutex poisoned"))?;
        Ok(m.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut m = self.inner.lock().map_err(|_| anyhow!("kv mutex poisoned"))?;
        m.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut m = self.inner.lock().map_err(|_| anyhow!("kv mutex poisoned"))?;
        m.remove(key);
        Ok(())
    }
}

/// One JSON object per file; a missing file reads as empty.
/// Writes go through a temp file + rename.
#[derive(Debug)]
pub struct JsonFileKv {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) if s.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing state file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(map)?;
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn update<F: FnOnce(&mut BTreeMap<String, String>)>(&self, f: F) -> Result<()> {
        let _g = self.lock.lock().map_err(|_| anyhow!("kv mutex poisoned"))?;
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for JsonFileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _g = self.lock.lock().map_err(|_| anyhow!("kv mutex poisoned"))?;
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|m| {
            m.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|m| {
            m.remove(key);
        })
    }
}

/// Most-recent-first list of distinct search terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `store`; unreadable data is logged and treated as empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let raw = match store.get(KEY_SEARCH_HISTORY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                tracing::warn!(error = ?e, "search history unavailable");
                return Self::default();
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(list) => {
                let mut h = Self::default();
                // oldest first so the stored order is preserved
                for term in list.iter().rev() {
                    h.push(term);
                }
                h
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed search history");
                Self::default()
            }
        }
    }

    /// Move `term` to the front (deduplicating) and cap at `HISTORY_CAP`.
    /// Blank terms are ignored. Returns whether the list changed.
    pub fn push(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        if self.entries.first().map(String::as_str) == Some(term) {
            return false;
        }
        self.entries.retain(|t| t != term);
        self.entries.insert(0, term.to_string());
        self.entries.truncate(HISTORY_CAP);
        true
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.set(KEY_SEARCH_HISTORY, &serde_json::to_string(&self.entries)?)
    }
}

pub fn load_api_key(store: &dyn KeyValueStore) -> Result<Option<String>> {
    Ok(store
        .get(KEY_API_KEY)?
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty()))
}

pub fn save_api_key(store: &dyn KeyValueStore, key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("API key is empty"));
    }
    store.set(KEY_API_KEY, key)
}

pub fn clear_api_key(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(KEY_API_KEY)
}
