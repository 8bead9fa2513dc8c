// src/summarize/structured.rs
//! Structured (JSON) trend summary over a pre-fetched news digest.

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::ingest::types::NewsItem;
use crate::summarize::prompt::structured_prompt;
use crate::summarize::{GenerateRequest, GenerativeModel, TrendResult};

pub const EXPECTED_TRENDS: usize = 3;
pub const KEYWORD_MARKER: char = '#';

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summary generation failed: model call: {0}")]
    Model(String),
    #[error("summary generation failed: malformed output: {0}")]
    Parse(String),
    #[error("summary generation failed: {0}")]
    Contract(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    trends: Vec<TrendResult>,
}

/// Remove markdown code-fence wrappers (```json ... ```).
pub fn strip_code_fences(raw: &str) -> String {
    static RE_FENCE: OnceCell<Regex> = OnceCell::new();
    let re = RE_FENCE.get_or_init(|| Regex::new(r"```[A-Za-z]*").unwrap());
    re.replace_all(raw.trim(), "").trim().to_string()
}

/// Parse the model text into trends. Tries the whole (de-fenced) text first,
/// then the outermost `{...}` slice when the model wrapped the JSON in prose.
pub fn parse_trends(raw: &str) -> Result<Vec<TrendResult>, SummaryError> {
    let text = strip_code_fences(raw);
    let first = match serde_json::from_str::<Envelope>(&text) {
        Ok(env) => return Ok(env.trends),
        Err(e) => e,
    };

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Envelope>(&text[start..=end])
                .map(|env| env.trends)
                .map_err(|e| SummaryError::Parse(e.to_string()))
        }
        _ => Err(SummaryError::Parse(first.to_string())),
    }
}

fn normalize_keyword(k: &str) -> Option<String> {
    let k = k.trim();
    if k.trim_start_matches(KEYWORD_MARKER).trim().is_empty() {
        return None;
    }
    if k.starts_with(KEYWORD_MARKER) {
        Some(k.to_string())
    } else {
        Some(format!("{KEYWORD_MARKER}{k}"))
    }
}

/// Enforce the output contract: exactly three themes, non-empty title and
/// content, at least one `#`-prefixed keyword each.
pub fn validate_trends(trends: Vec<TrendResult>) -> Result<Vec<TrendResult>, SummaryError> {
    if trends.len() != EXPECTED_TRENDS {
        return Err(SummaryError::Contract(format!(
            "expected {EXPECTED_TRENDS} trends, got {}",
            trends.len()
        )));
    }

    trends
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let title = t.title.trim().to_string();
            let content = t.content.trim().to_string();
            if title.is_empty() || content.is_empty() {
                return Err(SummaryError::Contract(format!(
                    "trend {} has an empty title or content",
                    i + 1
                )));
            }
            let keywords: Vec<String> = t
                .keywords
                .iter()
                .filter_map(|k| normalize_keyword(k))
                .collect();
            if keywords.is_empty() {
                return Err(SummaryError::Contract(format!(
                    "trend {} has no keywords",
                    i + 1
                )));
            }
            Ok(TrendResult {
                date: t.date.trim().to_string(),
                title,
                content,
                keywords,
            })
        })
        .collect()
}

/// Summarize the most recent news into exactly three trend themes.
pub async fn summarize_trends(
    model: &dyn GenerativeModel,
    industry: &str,
    items: &[NewsItem],
    today: &str,
    digest_limit: usize,
) -> Result<Vec<TrendResult>, SummaryError> {
    let prompt = structured_prompt(industry, items, today, digest_limit);

    let out = model
        .generate(GenerateRequest::json(prompt))
        .await
        .map_err(|e| {
            counter!("sensing_summary_failures_total", "stage" => "model").increment(1);
            SummaryError::Model(format!("{e:#}"))
        })?;

    let trends = parse_trends(&out.text).and_then(validate_trends);
    match &trends {
        Ok(t) => tracing::info!(target: "summarize", industry, model = model.name(), trends = t.len(), "trends summarized"),
        Err(e) => {
            counter!("sensing_summary_failures_total", "stage" => "parse").increment(1);
            tracing::warn!(target: "summarize", industry, error = %e, "rejected model output");
        }
    }
    trends
}
