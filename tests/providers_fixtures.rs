// tests/providers_fixtures.rs
mod common;

use chrono::{TimeZone, Utc};
use common::{fixed_now, GDELT_JSON, GOOGLE_XML};
use sensing_ai::ingest::providers::gdelt::GdeltProvider;
use sensing_ai::ingest::providers::google_news::GoogleNewsProvider;
use sensing_ai::ingest::types::NewsProvider;

#[tokio::test]
async fn google_news_fixture_parses_items() {
    let provider = GoogleNewsProvider::from_fixture(GOOGLE_XML);
    let items = provider.fetch("반도체", fixed_now()).await.expect("rss parse ok");

    // the undated item is skipped
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "삼성전자, HBM4 양산 앞당겨 - 연합뉴스");
    assert_eq!(items[0].source, "연합뉴스");
    assert_eq!(
        items[0].published_at,
        Utc.with_ymd_and_hms(2025, 3, 4, 1, 30, 0).unwrap()
    );
    assert_eq!(items[1].title, "SK하이닉스 1분기 실적 전망 & 투자 확대 - 한국경제");
    // missing <source> falls back to the fixed label
    assert_eq!(items[2].source, "Google News");
    assert!(items
        .iter()
        .all(|i| i.industry == "반도체" && i.collected_at == fixed_now()));
}

#[tokio::test]
async fn gdelt_fixture_parses_items() {
    let provider = GdeltProvider::from_fixture(GDELT_JSON);
    let items = provider.fetch("반도체", fixed_now()).await.expect("json parse ok");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].source, "South Korea");
    assert_eq!(
        items[0].published_at,
        Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap()
    );
    // empty sourcecountry falls back to the fixed label
    assert_eq!(items[1].source, "GDELT");
    assert_eq!(items[1].url, "https://global.example.com/fab");
}

#[tokio::test]
async fn malformed_bodies_are_errors() {
    let rss = GoogleNewsProvider::from_fixture("<html><body>503</body></html>");
    assert!(rss.fetch("x", fixed_now()).await.is_err());

    let gdelt = GdeltProvider::from_fixture("<html>rate limited</html>");
    assert!(gdelt.fetch("x", fixed_now()).await.is_err());
}
