// src/export/mod.rs
pub mod gcs;
pub mod store;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

use crate::export::store::ObjectStore;
use crate::ingest::types::NewsItem;

pub const CSV_COLUMNS: [&str; 6] = [
    "industry",
    "collectedAt",
    "title",
    "source",
    "publishedAt",
    "url",
];

/// Seven days, the longest a V4 signed URL may live.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize items with a header row, columns in `CSV_COLUMNS` order.
pub fn to_csv(items: &[NewsItem]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;

    for it in items {
        writer.write_record([
            it.industry.as_str(),
            iso(&it.collected_at).as_str(),
            it.title.as_str(),
            it.source.as_str(),
            iso(&it.published_at).as_str(),
            it.url.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv writer: {e}"))?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

/// `exports/{industry}/{yyyyMMdd_HHmmss}.csv`
pub fn object_path(industry: &str, now: DateTime<Utc>) -> String {
    let safe = industry.trim().replace(['/', '\\'], "_");
    format!("exports/{}/{}.csv", safe, now.format("%Y%m%d_%H%M%S"))
}

/// Upload the CSV export and return a read-only signed URL.
pub async fn upload_csv(
    store: &dyn ObjectStore,
    industry: &str,
    items: &[NewsItem],
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<String> {
    let body = to_csv(items)?;
    let path = object_path(industry, now);

    store
        .put(&path, body.into_bytes(), "text/csv")
        .await
        .with_context(|| format!("uploading csv export via {}", store.name()))?;
    let url = store
        .signed_url(&path, ttl)
        .await
        .with_context(|| format!("signing csv export via {}", store.name()))?;

    tracing::info!(target: "export", %path, rows = items.len(), "csv exported");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn object_path_is_second_precise_and_slash_safe() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(object_path("반도체", now), "exports/반도체/20250304_050607.csv");
        assert_eq!(object_path("AI/ML", now), "exports/AI_ML/20250304_050607.csv");
    }

    #[test]
    fn header_only_for_empty_input() {
        let out = to_csv(&[]).unwrap();
        assert_eq!(out, "industry,collectedAt,title,source,publishedAt,url\n");
    }
}
