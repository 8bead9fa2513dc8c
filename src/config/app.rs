// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::ingest::providers::{gdelt, google_news};
use crate::summarize::gemini;

pub const DEFAULT_CONFIG_PATH: &str = "config/sensing.toml";
pub const ENV_CONFIG_PATH: &str = "SENSING_CONFIG_PATH";

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_STORAGE_BUCKET: &str = "SENSING_STORAGE_BUCKET";
pub const ENV_HTTP_TIMEOUT: &str = "SENSING_HTTP_TIMEOUT_SECS";

fn default_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Per outbound call (news sources, Gemini, storage). Clamped to 5..=60.
    pub http_timeout_secs: u64,
    pub gemini: GeminiConfig,
    pub news: NewsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// "ENV" means: read from GEMINI_API_KEY
    pub api_key: String,
    /// Model for the structured (JSON) summary.
    pub model: String,
    /// Model for the grounded web-search report.
    pub report_model: String,
    /// Per-call timeout for the grounded report; web search runs long.
    pub report_timeout_secs: u64,
    pub base_url: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub google_news_base_url: String,
    pub gdelt_base_url: String,
    pub lookback_days: i64,
    pub gdelt_max_records: u32,
    /// How many of the most recent items go into the prompt digest.
    pub digest_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// GCS bucket; `None` disables CSV export.
    pub bucket: Option<String>,
    pub signed_url_ttl_days: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_timeout_secs(),
            gemini: GeminiConfig::default(),
            news: NewsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            signed_url_ttl_days: 7,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".to_string(),
            model: gemini::DEFAULT_MODEL.to_string(),
            report_model: gemini::DEFAULT_REPORT_MODEL.to_string(),
            report_timeout_secs: 60,
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            temperature: 0.4,
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            google_news_base_url: google_news::DEFAULT_BASE_URL.to_string(),
            gdelt_base_url: gdelt::DEFAULT_BASE_URL.to_string(),
            lookback_days: 7,
            gdelt_max_records: gdelt::DEFAULT_MAX_RECORDS,
            digest_limit: 40,
        }
    }
}

impl AppConfig {
    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg = Self::from_toml_str(&data)?;
        Ok(cfg.with_env_overrides().sanitized())
    }

    /// Resolution order:
    /// 1) $SENSING_CONFIG_PATH (must exist)
    /// 2) config/sensing.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied in every case.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(&p);
        }
        Ok(Self::default().with_env_overrides().sanitized())
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing sensing config toml")
    }

    fn with_env_overrides(mut self) -> Self {
        if self.gemini.api_key.trim().eq_ignore_ascii_case("env") {
            self.gemini.api_key = env::var(ENV_GEMINI_API_KEY).unwrap_or_default();
        }
        if let Ok(m) = env::var(ENV_GEMINI_MODEL) {
            if !m.trim().is_empty() {
                self.gemini.model = m.trim().to_string();
            }
        }
        if let Ok(b) = env::var(ENV_STORAGE_BUCKET) {
            let b = b.trim();
            self.storage.bucket = (!b.is_empty()).then(|| b.to_string());
        }
        if let Some(secs) = env::var(ENV_HTTP_TIMEOUT)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.http_timeout_secs = secs;
        }
        self
    }

    fn sanitized(mut self) -> Self {
        self.http_timeout_secs = self.http_timeout_secs.clamp(5, 60);
        self.gemini.report_timeout_secs = self.gemini.report_timeout_secs.clamp(5, 180);
        self.news.lookback_days = self.news.lookback_days.max(1);
        self.news.digest_limit = self.news.digest_limit.max(1);
        // V4 signed URLs cannot outlive 7 days
        self.storage.signed_url_ttl_days = self.storage.signed_url_ttl_days.clamp(1, 7);
        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            self.gemini.temperature = GeminiConfig::default().temperature;
        }
        if let Some(b) = &self.storage.bucket {
            if b.trim().is_empty() {
                self.storage.bucket = None;
            }
        }
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini.report_timeout_secs)
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.storage.signed_url_ttl_days * 24 * 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn toml_values_are_sanitized() {
        env::remove_var(ENV_HTTP_TIMEOUT);
        env::remove_var(ENV_STORAGE_BUCKET);
        let cfg = AppConfig::from_toml_str(
            r#"
http_timeout_secs = 600

[news]
lookback_days = 0
digest_limit = 0

[gemini]
report_model = "gemini-2.5-pro"
report_timeout_secs = 900

[storage]
bucket = "  "
signed_url_ttl_days = 30
"#,
        )
        .unwrap()
        .with_env_overrides()
        .sanitized();

        assert_eq!(cfg.http_timeout_secs, 60);
        assert_eq!(cfg.news.lookback_days, 1);
        assert_eq!(cfg.news.digest_limit, 1);
        assert_eq!(cfg.storage.bucket, None);
        assert_eq!(cfg.storage.signed_url_ttl_days, 7);
        assert_eq!(cfg.gemini.report_model, "gemini-2.5-pro");
        assert_eq!(cfg.report_timeout(), Duration::from_secs(180));
        // untouched sections fall back to defaults
        assert_eq!(cfg.news.gdelt_max_records, 50);
        assert_eq!(cfg.gemini.model, gemini::DEFAULT_MODEL);
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_file_values() {
        env::set_var(ENV_GEMINI_API_KEY, "k-123");
        env::set_var(ENV_STORAGE_BUCKET, "sensing-exports");
        env::set_var(ENV_HTTP_TIMEOUT, "15");

        let cfg = AppConfig::from_toml_str(r#"[gemini]
api_key = "env""#)
            .unwrap()
            .with_env_overrides()
            .sanitized();

        assert_eq!(cfg.gemini.api_key, "k-123");
        assert_eq!(cfg.storage.bucket.as_deref(), Some("sensing-exports"));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(15));

        env::remove_var(ENV_GEMINI_API_KEY);
        env::remove_var(ENV_STORAGE_BUCKET);
        env::remove_var(ENV_HTTP_TIMEOUT);
    }
}
