// src/sensing.rs
//! Request pipeline: fetch news -> (export CSV || summarize) -> response.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::SenseError;
use crate::export::gcs::GcsStore;
use crate::export::store::{DisabledStore, ObjectStore};
use crate::export::{upload_csv, DEFAULT_SIGNED_URL_TTL};
use crate::ingest::types::NewsProvider;
use crate::ingest::{fetch_news, providers};
use crate::summarize::prompt::{seoul_today, structured_date, DEFAULT_DIGEST_LIMIT};
use crate::summarize::{build_model, summarize_trends, DynModel, TrendResult};

/// Aggregate returned to the caller. `csv_url` is empty when export failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SensingResponse {
    pub trends: Vec<TrendResult>,
    pub csv_url: String,
    pub industry: String,
}

pub struct SensingService {
    providers: Vec<Box<dyn NewsProvider>>,
    store: Arc<dyn ObjectStore>,
    model: DynModel,
    digest_limit: usize,
    signed_url_ttl: Duration,
}

impl SensingService {
    pub fn new(
        providers: Vec<Box<dyn NewsProvider>>,
        store: Arc<dyn ObjectStore>,
        model: DynModel,
    ) -> Self {
        Self {
            providers,
            store,
            model,
            digest_limit: DEFAULT_DIGEST_LIMIT,
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
        }
    }

    pub fn with_digest_limit(mut self, limit: usize) -> Self {
        self.digest_limit = limit.max(1);
        self
    }

    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    /// Wire live providers, storage and model from config.
    /// A storage backend that cannot start only disables CSV export.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self> {
        let timeout = cfg.http_timeout();
        let providers = providers::from_config(&cfg.news, timeout)?;

        let store: Arc<dyn ObjectStore> = match cfg.storage.bucket.as_deref() {
            Some(bucket) => match GcsStore::connect(bucket).await {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    tracing::warn!(error = ?e, bucket, "gcs unavailable; csv export disabled");
                    Arc::new(DisabledStore)
                }
            },
            None => {
                tracing::info!("no storage bucket configured; csv export disabled");
                Arc::new(DisabledStore)
            }
        };

        let model = build_model(&cfg.gemini, &cfg.gemini.model, timeout)?;

        Ok(Self::new(providers, store, model)
            .with_digest_limit(cfg.news.digest_limit)
            .with_signed_url_ttl(cfg.signed_url_ttl()))
    }

    pub async fn sense(&self, industry: &str) -> Result<SensingResponse, SenseError> {
        self.sense_at(industry, Utc::now()).await
    }

    pub async fn sense_at(
        &self,
        industry: &str,
        now: DateTime<Utc>,
    ) -> Result<SensingResponse, SenseError> {
        let industry = industry.trim();
        if industry.is_empty() {
            return Err(SenseError::MissingIndustry);
        }

        let items = fetch_news(&self.providers, industry, now).await;
        if items.is_empty() {
            tracing::info!(industry, "no news collected");
            return Err(SenseError::NoNews(industry.to_string()));
        }

        let today = structured_date(seoul_today(now));

        let export = async {
            match upload_csv(self.store.as_ref(), industry, &items, now, self.signed_url_ttl).await
            {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(error = ?e, industry, "csv export failed; continuing without csvUrl");
                    counter!("sensing_export_failures_total").increment(1);
                    String::new()
                }
            }
        };
        let summary = summarize_trends(
            self.model.as_ref(),
            industry,
            &items,
            &today,
            self.digest_limit,
        );

        let (csv_url, trends) = tokio::join!(export, summary);

        Ok(SensingResponse {
            trends: trends?,
            csv_url,
            industry: industry.to_string(),
        })
    }
}
