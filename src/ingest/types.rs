// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One collected article. Identity is `url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub industry: String,
    pub title: String,
    pub source: String, // publisher name or country label
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub collected_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// Fetch items matching `industry`, stamping each with `collected_at`.
    async fn fetch(&self, industry: &str, collected_at: DateTime<Utc>) -> Result<Vec<NewsItem>>;
    fn name(&self) -> &'static str;
}
