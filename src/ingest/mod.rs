// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{NewsItem, NewsProvider};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "sensing_news_items_total",
            "Unique news items kept after merge."
        );
        describe_counter!(
            "sensing_news_duplicates_total",
            "News items dropped because their url was already seen."
        );
        describe_counter!(
            "sensing_provider_errors_total",
            "Provider fetch/parse errors."
        );
    });
}

/// Decode HTML entities once. Only for sources that hand out escaped text;
/// XML feeds are already unescaped by the parser.
pub fn decode_entities(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

/// Normalize a headline: strip tags, fold typographic quotes, collapse
/// whitespace. Entities are left alone.
pub fn normalize_title(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let mut out = re_tags.replace_all(s, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Dedup by url (first occurrence wins), then sort newest first.
/// Returns (kept, dropped_duplicates).
pub fn merge_dedup_sort(raw: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut kept = Vec::with_capacity(raw.len());
    let mut dup = 0usize;

    for it in raw {
        if !seen.insert(it.url.clone()) {
            dup += 1;
            continue;
        }
        kept.push(it);
    }

    // stable: equal timestamps keep merge order
    kept.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    (kept, dup)
}

/// Query every provider in order and merge the results.
///
/// A failing provider is logged and contributes nothing; the others still
/// flow through. An empty return means "no data", not an error.
pub async fn fetch_news(
    providers: &[Box<dyn NewsProvider>],
    industry: &str,
    collected_at: DateTime<Utc>,
) -> Vec<NewsItem> {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let mut raw = Vec::new();
    for p in providers {
        match p.fetch(industry, collected_at).await {
            Ok(mut v) => {
                tracing::debug!(provider = p.name(), items = v.len(), "provider fetched");
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("sensing_provider_errors_total", "provider" => p.name()).increment(1);
            }
        }
    }

    let (kept, dup) = merge_dedup_sort(raw);

    counter!("sensing_news_items_total").increment(kept.len() as u64);
    counter!("sensing_news_duplicates_total").increment(dup as u64);
    histogram!("sensing_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    tracing::info!(
        target: "ingest",
        industry,
        kept = kept.len(),
        duplicates = dup,
        "news merged"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(url: &str, source: &str, ts: i64) -> NewsItem {
        let at = Utc.timestamp_opt(ts, 0).unwrap();
        NewsItem {
            industry: "반도체".into(),
            title: format!("title {url}"),
            source: source.into(),
            published_at: at,
            url: url.into(),
            collected_at: at,
        }
    }

    #[test]
    fn normalize_title_strips_tags_and_collapses() {
        let s = "  <b>HBM\u{00A0} 수요</b> \u{201C}급증\u{201D}  ";
        assert_eq!(normalize_title(s), r#"HBM 수요 "급증""#);
    }

    #[test]
    fn normalize_title_keeps_literal_entities() {
        assert_eq!(normalize_title("R&amp;D &lt;b&gt; 투자"), "R&amp;D &lt;b&gt; 투자");
        assert_eq!(
            normalize_title(&decode_entities("<b>HBM&nbsp;&nbsp;수요</b> &ldquo;급증&rdquo;")),
            r#"HBM 수요 "급증""#
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let raw = vec![
            item("https://a.test/1", "A", 100),
            item("https://a.test/2", "A", 200),
            item("https://a.test/1", "B", 300),
        ];
        let (kept, dup) = merge_dedup_sort(raw);
        assert_eq!(dup, 1);
        assert_eq!(kept.len(), 2);
        let first = kept.iter().find(|i| i.url == "https://a.test/1").unwrap();
        assert_eq!(first.source, "A");
    }

    #[test]
    fn sort_is_newest_first_and_stable_on_ties() {
        let raw = vec![
            item("https://a.test/1", "A", 100),
            item("https://a.test/2", "A", 300),
            item("https://a.test/3", "B", 300),
            item("https://a.test/4", "B", 200),
        ];
        let (kept, _) = merge_dedup_sort(raw);
        let urls: Vec<_> = kept.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://a.test/2",
                "https://a.test/3",
                "https://a.test/4",
                "https://a.test/1"
            ]
        );
    }
}
