// tests/common/mod.rs
// Shared mocks for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sensing_ai::export::store::ObjectStore;
use sensing_ai::ingest::types::{NewsItem, NewsProvider};
use sensing_ai::summarize::{GenerateRequest, GenerativeModel, Generation};

pub const GOOGLE_XML: &str = include_str!("../fixtures/google_news_rss.xml");
pub const GDELT_JSON: &str = include_str!("../fixtures/gdelt_artlist.json");

pub const THREE_TRENDS: &str = r##"```json
{"trends":[
{"date":"2025. 03. 04.","title":"HBM 양산 경쟁 심화","content":"주요 메모리 업체의 HBM4 양산 일정이 앞당겨지는 것으로 나타남.","keywords":["#HBM","#메모리"]},
{"date":"2025. 03. 04.","title":"수출 회복세 지속","content":"반도체 수출이 3개월 연속 증가함.","keywords":["#수출"]},
{"date":"2025. 03. 04.","title":"국내 생산 거점 확대","content":"평택 신규 팹 발표로 설비 투자 확대 가능성 높음.","keywords":["팹","#투자"]}
]}
```"##;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, 3, 0, 0).unwrap()
}

/// Counts calls; either delegates to an inner provider or fails.
pub struct CountingProvider {
    pub calls: Arc<AtomicUsize>,
    inner: Option<Box<dyn NewsProvider>>,
    name: &'static str,
}

impl CountingProvider {
    pub fn wrap(inner: Box<dyn NewsProvider>, calls: Arc<AtomicUsize>) -> Self {
        let name = inner.name();
        Self {
            calls,
            inner: Some(inner),
            name,
        }
    }

    pub fn failing(name: &'static str, calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            inner: None,
            name,
        }
    }
}

#[async_trait]
impl NewsProvider for CountingProvider {
    async fn fetch(&self, industry: &str, collected_at: DateTime<Utc>) -> Result<Vec<NewsItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.inner {
            Some(p) => p.fetch(industry, collected_at).await,
            None => Err(anyhow!("{} is down", self.name)),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

pub struct FailingModel {
    pub calls: AtomicUsize,
}

impl FailingModel {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GenerativeModel for FailingModel {
    async fn generate(&self, _req: GenerateRequest) -> Result<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("quota exceeded"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub struct BrokenStore;

#[async_trait]
impl ObjectStore for BrokenStore {
    async fn put(&self, _path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        Err(anyhow!("403 Forbidden"))
    }

    async fn signed_url(&self, _path: &str, _ttl: Duration) -> Result<String> {
        Err(anyhow!("403 Forbidden"))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

/// Provider whose fetch panics mid-pipeline.
pub struct PanickingProvider;

#[async_trait]
impl NewsProvider for PanickingProvider {
    async fn fetch(&self, _industry: &str, _collected_at: DateTime<Utc>) -> Result<Vec<NewsItem>> {
        panic!("feed parser state corrupted");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}
