// src/summarize/gemini.rs
//! Gemini `generateContent` REST client.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::app::GeminiConfig;
use crate::summarize::{GenerateRequest, GenerativeModel, Generation, GroundingMetadata};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_REPORT_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Req<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartOut<'a>>,
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Deserialize)]
struct PartIn {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("API key is required");
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("sensing-ai/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.4,
        })
    }

    /// Client for `model` with the endpoint and sampling settings of `cfg`.
    pub fn configured(
        api_key: &str,
        cfg: &GeminiConfig,
        model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self::new(api_key, model, timeout)?
            .with_base_url(&cfg.base_url)
            .with_temperature(cfg.temperature))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

fn into_generation(body: Resp) -> Result<Generation> {
    let Some(cand) = body.candidates.into_iter().next() else {
        let reason = body
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        bail!("gemini returned no candidates ({reason})");
    };

    let text: String = cand
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        bail!(
            "gemini returned empty text (finish_reason={})",
            cand.finish_reason.as_deref().unwrap_or("unknown")
        );
    }

    Ok(Generation {
        text,
        grounding: cand.grounding_metadata,
    })
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, req: GenerateRequest) -> Result<Generation> {
        let body = Req {
            contents: vec![Content {
                role: "user",
                parts: vec![PartOut { text: &req.prompt }],
            }],
            tools: if req.web_search {
                vec![Tool {
                    google_search: serde_json::json!({}),
                }]
            } else {
                Vec::new()
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: req.json_output.then_some("application/json"),
            },
        };

        let t0 = std::time::Instant::now();
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let msg = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            return Err(anyhow!("gemini API error ({status}): {msg}"));
        }

        let parsed: Resp = resp.json().await.context("decoding gemini response")?;
        let out = into_generation(parsed)?;
        tracing::debug!(
            model = %self.model,
            ms = t0.elapsed().as_millis() as u64,
            grounded = out.grounding.is_some(),
            "gemini generation done"
        );
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
