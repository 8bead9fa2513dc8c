// src/ingest/providers/google_news.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::normalize_title;
use crate::ingest::types::{NewsItem, NewsProvider};

pub const DEFAULT_BASE_URL: &str = "https://news.google.com";
const FALLBACK_SOURCE: &str = "Google News";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "$text")]
    name: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let dt = OffsetDateTime::parse(ts.trim(), &Rfc2822).ok()?;
    DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

/// Google News RSS search (source A).
pub struct GoogleNewsProvider {
    mode: Mode,
    lookback_days: i64,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl GoogleNewsProvider {
    /// Parse a stored RSS body instead of calling the network.
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            lookback_days: 7,
        }
    }

    pub fn from_url(base_url: &str, timeout: Duration, lookback_days: i64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sensing-ai/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building google news http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            },
            lookback_days: lookback_days.max(1),
        })
    }

    /// `{base}/rss/search?q={query}+after:{date}&hl=ko&gl=KR&ceid=KR:ko`
    pub fn search_url(base_url: &str, industry: &str, after: DateTime<Utc>) -> String {
        format!(
            "{}/rss/search?q={}+after:{}&hl=ko&gl=KR&ceid=KR:ko",
            base_url,
            urlencoding::encode(industry),
            after.format("%Y-%m-%d")
        )
    }

    pub fn parse_items_from_str(
        s: &str,
        industry: &str,
        collected_at: DateTime<Utc>,
    ) -> Result<Vec<NewsItem>> {
        let t0 = std::time::Instant::now();
        let rss: Rss = from_str(s).context("parsing google news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = normalize_title(it.title.as_deref().unwrap_or_default());
            let url = it.link.unwrap_or_default().trim().to_string();
            let published_at = it.pub_date.as_deref().and_then(parse_rfc2822);
            let Some(published_at) = published_at else {
                tracing::debug!(%url, "skipping rss item without a valid pubDate");
                continue;
            };
            if title.is_empty() || url.is_empty() {
                continue;
            }
            let source = it
                .source
                .and_then(|s| s.name)
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| FALLBACK_SOURCE.to_string());

            out.push(NewsItem {
                industry: industry.to_string(),
                title,
                source,
                published_at,
                url,
                collected_at,
            });
        }

        histogram!("sensing_parse_ms", "provider" => "google_news")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for GoogleNewsProvider {
    async fn fetch(&self, industry: &str, collected_at: DateTime<Utc>) -> Result<Vec<NewsItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s, industry, collected_at),
            Mode::Http { base_url, client } => {
                let after = collected_at - ChronoDuration::days(self.lookback_days);
                let url = Self::search_url(base_url, industry, after);
                let body = client
                    .get(&url)
                    .send()
                    .await
                    .context("google news http get()")?
                    .error_for_status()
                    .context("google news http status")?
                    .text()
                    .await
                    .context("google news http .text()")?;
                Self::parse_items_from_str(&body, industry, collected_at)
            }
        }
    }

    fn name(&self) -> &'static str {
        "google_news"
    }
}
