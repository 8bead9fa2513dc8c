// src/ingest/providers/gdelt.rs
//! GDELT DOC 2.0 article search (source B).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::histogram;
use serde::Deserialize;
use std::time::Duration;
use time::{macros::format_description, PrimitiveDateTime};

use crate::ingest::{decode_entities, normalize_title};
use crate::ingest::types::{NewsItem, NewsProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.gdeltproject.org";
pub const DEFAULT_MAX_RECORDS: u32 = 50;
const FALLBACK_SOURCE: &str = "GDELT";

#[derive(Debug, Deserialize)]
struct ArtList {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    url: Option<String>,
    title: Option<String>,
    #[serde(rename = "seendate")]
    seen_date: Option<String>,
    #[serde(rename = "sourcecountry")]
    source_country: Option<String>,
}

/// `20250304T013000Z` -> 2025-03-04T01:30:00Z
pub fn parse_seen_date(s: &str) -> Option<DateTime<Utc>> {
    let fmt = format_description!("[year][month][day]T[hour][minute][second]Z");
    let dt = PrimitiveDateTime::parse(s.trim(), &fmt).ok()?.assume_utc();
    DateTime::from_timestamp(dt.unix_timestamp(), 0)
}

pub struct GdeltProvider {
    mode: Mode,
    max_records: u32,
    lookback_days: i64,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl GdeltProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            max_records: DEFAULT_MAX_RECORDS,
            lookback_days: 7,
        }
    }

    pub fn from_url(
        base_url: &str,
        timeout: Duration,
        lookback_days: i64,
        max_records: u32,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sensing-ai/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building gdelt http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            },
            // GDELT rejects maxrecords above 250
            max_records: max_records.clamp(1, 250),
            lookback_days: lookback_days.max(1),
        })
    }

    pub fn search_url(base_url: &str, industry: &str, max_records: u32, days: i64) -> String {
        format!(
            "{}/api/v2/doc/doc?query={}&mode=artlist&format=json&maxrecords={}&timespan={}d",
            base_url,
            urlencoding::encode(industry),
            max_records,
            days
        )
    }

    pub fn parse_items_from_str(
        s: &str,
        industry: &str,
        collected_at: DateTime<Utc>,
    ) -> Result<Vec<NewsItem>> {
        let t0 = std::time::Instant::now();
        // GDELT answers plain-text errors ("Your search contained ...") with status 200
        let list: ArtList = serde_json::from_str(s).context("parsing gdelt artlist json")?;

        let out = list
            .articles
            .into_iter()
            .filter_map(|a| {
                let url = a.url?.trim().to_string();
                // artlist titles arrive HTML-escaped inside the JSON strings
                let title =
                    normalize_title(&decode_entities(a.title.as_deref().unwrap_or_default()));
                let published_at = a.seen_date.as_deref().and_then(parse_seen_date)?;
                if url.is_empty() || title.is_empty() {
                    return None;
                }
                let source = a
                    .source_country
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| FALLBACK_SOURCE.to_string());
                Some(NewsItem {
                    industry: industry.to_string(),
                    title,
                    source,
                    published_at,
                    url,
                    collected_at,
                })
            })
            .collect::<Vec<_>>();

        histogram!("sensing_parse_ms", "provider" => "gdelt")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for GdeltProvider {
    async fn fetch(&self, industry: &str, collected_at: DateTime<Utc>) -> Result<Vec<NewsItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s, industry, collected_at),
            Mode::Http { base_url, client } => {
                let url =
                    Self::search_url(base_url, industry, self.max_records, self.lookback_days);
                let body = client
                    .get(&url)
                    .send()
                    .await
                    .context("gdelt http get()")?
                    .error_for_status()
                    .context("gdelt http status")?
                    .text()
                    .await
                    .context("gdelt http .text()")?;
                Self::parse_items_from_str(&body, industry, collected_at)
            }
        }
    }

    fn name(&self) -> &'static str {
        "gdelt"
    }
}
