// src/summarize/report.rs
//! Free-text weekly report written from the model's own web search.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use crate::config::app::GeminiConfig;
use crate::summarize::citations::{sections, splice_citations};
use crate::summarize::gemini::GeminiClient;
use crate::summarize::prompt::{report_date, report_prompt};
use crate::summarize::structured::EXPECTED_TRENDS;
use crate::summarize::{GenerateRequest, GenerativeModel};

/// Ask the model for the report, then splice grounded sources into it.
pub async fn generate_trend_report(
    model: &dyn GenerativeModel,
    industry: &str,
    today: NaiveDate,
) -> Result<String> {
    let industry = industry.trim();
    if industry.is_empty() {
        bail!("Industry is required");
    }

    let prompt = report_prompt(industry, &report_date(today));
    let out = model
        .generate(GenerateRequest::grounded(prompt))
        .await
        .context("grounded report generation failed")?;

    let found = sections(&out.text).len();
    if found != EXPECTED_TRENDS {
        tracing::warn!(
            target: "summarize",
            industry,
            sections = found,
            "report does not have the expected number of sections"
        );
    }

    let text = match &out.grounding {
        Some(meta) if !meta.grounding_chunks.is_empty() => splice_citations(&out.text, meta),
        _ => {
            tracing::debug!(industry, "no grounding metadata; report left as generated");
            out.text
        }
    };
    Ok(text)
}

/// Client-side entry point: validate inputs, build a Gemini client for
/// `api_key` on `cfg.report_model`, generate the report.
pub async fn generate_trend_report_with_key(
    api_key: &str,
    industry: &str,
    cfg: &GeminiConfig,
    timeout: Duration,
    today: NaiveDate,
) -> Result<String> {
    if api_key.trim().is_empty() {
        bail!("API key is required");
    }
    if industry.trim().is_empty() {
        bail!("Industry is required");
    }
    let client = GeminiClient::configured(api_key, cfg, &cfg.report_model, timeout)?;
    generate_trend_report(&client, industry, today).await
}
