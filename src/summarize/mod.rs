//! Trend summarization: model abstraction, prompt builders, structured JSON
//! summary, grounded free-text report and citation splicing.

pub mod citations;
pub mod gemini;
pub mod prompt;
pub mod report;
pub mod structured;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::config::app::GeminiConfig;

pub use structured::{summarize_trends, SummaryError};

/// One trend theme of the structured report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendResult {
    pub date: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Let the model run its own web search (grounding).
    pub web_search: bool,
    /// Ask for `application/json` output.
    pub json_output: bool,
}

impl GenerateRequest {
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            web_search: false,
            json_output: true,
        }
    }

    pub fn grounded(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            web_search: true,
            json_output: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: String,
    pub grounding: Option<GroundingMetadata>,
}

/// Citation evidence attached to a search-augmented answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default)]
    pub grounding_supports: Vec<GroundingSupport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingSupport {
    pub segment: Option<Segment>,
    #[serde(default)]
    pub grounding_chunk_indices: Vec<usize>,
}

/// A span of the generated text. Indices are UTF-8 byte offsets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start_index: Option<usize>,
    pub end_index: Option<usize>,
    pub text: Option<String>,
}

#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, req: GenerateRequest) -> Result<Generation>;
    /// Model/provider name for diagnostics.
    fn name(&self) -> &str;
}

pub type DynModel = Arc<dyn GenerativeModel>;

/// Returned when no API key is configured; every call errors.
pub struct DisabledModel;

#[async_trait::async_trait]
impl GenerativeModel for DisabledModel {
    async fn generate(&self, _req: GenerateRequest) -> Result<Generation> {
        Err(anyhow!("GEMINI_API_KEY is not set"))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Deterministic model returning a fixed generation. Records every prompt.
pub struct StaticModel {
    pub fixed: Generation,
    pub calls: std::sync::Mutex<Vec<GenerateRequest>>,
}

impl StaticModel {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_grounding(text, None)
    }

    pub fn with_grounding(text: impl Into<String>, grounding: Option<GroundingMetadata>) -> Self {
        Self {
            fixed: Generation {
                text: text.into(),
                grounding,
            },
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl GenerativeModel for StaticModel {
    async fn generate(&self, req: GenerateRequest) -> Result<Generation> {
        if let Ok(mut c) = self.calls.lock() {
            c.push(req);
        }
        Ok(self.fixed.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

const MOCK_SUMMARY: &str = r##"{"trends":[
{"date":"mock","title":"공급망 재편 가속","content":"주요 기업의 생산 거점 이전이 이어지는 것으로 나타남.","keywords":["#공급망","#리쇼어링"]},
{"date":"mock","title":"설비 투자 확대","content":"하반기 설비 투자 계획이 상향 조정됨.","keywords":["#설비투자"]},
{"date":"mock","title":"규제 대응 강화","content":"신규 규제 시행을 앞두고 대응 조직 신설이 이어짐.","keywords":["#규제","#컴플라이언스"]}
]}"##;

/// Factory: build the model according to config and environment.
///
/// * `SENSING_TEST_MODE=mock` → canned three-trend JSON.
/// * empty API key → `DisabledModel`.
/// * otherwise the Gemini REST client.
pub fn build_model(cfg: &GeminiConfig, model: &str, timeout: std::time::Duration) -> Result<DynModel> {
    if std::env::var("SENSING_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(StaticModel::new(MOCK_SUMMARY)));
    }
    if cfg.api_key.trim().is_empty() {
        tracing::warn!("Gemini API key missing; summaries will fail");
        return Ok(Arc::new(DisabledModel));
    }
    let client = gemini::GeminiClient::configured(&cfg.api_key, cfg, model, timeout)?;
    Ok(Arc::new(client))
}
