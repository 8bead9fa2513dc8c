//! Terminal client: grounded trend reports straight from Gemini, or a call to
//! a running sensing server. Keeps the API key and the last five searches in
//! a local JSON file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use sensing_ai::config::app::GeminiConfig;
use sensing_ai::config::AppConfig;
use sensing_ai::error::ErrorBody;
use sensing_ai::history::{
    clear_api_key, load_api_key, save_api_key, JsonFileKv, KeyValueStore, SearchHistory,
};
use sensing_ai::sensing::SensingResponse;
use sensing_ai::summarize::prompt::seoul_today;
use sensing_ai::summarize::report::generate_trend_report_with_key;

#[derive(Parser)]
#[command(name = "sensing-cli", version, about = "Weekly industry trend reports")]
struct Cli {
    /// Local state file (API key, search history)
    #[arg(long, env = "SENSING_STATE_PATH", default_value = ".sensing/state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask Gemini to search the web and write a sourced report
    Report {
        industry: String,
        /// Overrides GEMINI_API_KEY and the stored key; stored on success
        #[arg(long)]
        api_key: Option<String>,
        /// Defaults to `gemini.report_model` from the config file
        #[arg(long)]
        model: Option<String>,
        /// Defaults to `gemini.report_timeout_secs` from the config file
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Run the full pipeline on a sensing server (POST /api/sense)
    Sense {
        industry: String,
        #[arg(long, env = "SENSING_SERVER", default_value = "http://127.0.0.1:8000")]
        server: String,
    },
    /// Show recent searches
    History,
    /// Store the Gemini API key locally (plain text, this machine only)
    SetKey { key: String },
    /// Forget the stored API key
    ClearKey,
}

/// Flag first, then the configured key (GEMINI_API_KEY when the file says
/// "ENV"), then the locally stored one.
fn resolve_api_key(flag: Option<&str>, configured: &str, kv: &dyn KeyValueStore) -> Result<String> {
    if let Some(k) = flag.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(k.to_string());
    }
    if !configured.trim().is_empty() {
        return Ok(configured.trim().to_string());
    }
    load_api_key(kv)?
        .ok_or_else(|| anyhow!("no API key: pass --api-key, set GEMINI_API_KEY or run `set-key`"))
}

/// Config values with command-line overrides applied.
fn report_settings(
    cfg: &AppConfig,
    model: Option<String>,
    timeout_secs: Option<u64>,
) -> (GeminiConfig, Duration) {
    let mut gemini = cfg.gemini.clone();
    if let Some(m) = model.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
        gemini.report_model = m;
    }
    let timeout = timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| cfg.report_timeout());
    (gemini, timeout)
}

fn remember(kv: &dyn KeyValueStore, industry: &str) {
    let mut history = SearchHistory::load(kv);
    if history.push(industry) {
        if let Err(e) = history.save(kv) {
            tracing::warn!(error = ?e, "could not save search history");
        }
    }
}

async fn run_report(
    kv: &dyn KeyValueStore,
    cfg: &AppConfig,
    industry: &str,
    api_key: Option<&str>,
    model: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let key = resolve_api_key(api_key, &cfg.gemini.api_key, kv)?;
    let (gemini, timeout) = report_settings(cfg, model, timeout_secs);
    tracing::debug!(model = %gemini.report_model, timeout_secs = timeout.as_secs(), "generating report");

    let report =
        generate_trend_report_with_key(&key, industry, &gemini, timeout, seoul_today(Utc::now()))
            .await?;
    println!("{report}");

    if api_key.is_some() {
        save_api_key(kv, &key)?;
    }
    remember(kv, industry);
    Ok(())
}

async fn run_sense(kv: &dyn KeyValueStore, industry: &str, server: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()?;
    let url = format!("{}/api/sense", server.trim_end_matches('/'));
    let resp = client
        .post(&url)
        .json(&serde_json::json!({ "industry": industry }))
        .send()
        .await
        .with_context(|| format!("POST {url}"))?;

    let status = resp.status();
    if !status.is_success() {
        let msg = resp
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());
        return Err(anyhow!("{msg} ({status})"));
    }

    let body: SensingResponse = resp.json().await.context("decoding sensing response")?;
    for (i, t) in body.trends.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, t.title, t.date);
        println!("{}", t.content);
        println!("{}\n", t.keywords.join(" "));
    }
    if body.csv_url.is_empty() {
        println!("(CSV export unavailable)");
    } else {
        println!("CSV: {}", body.csv_url);
    }

    remember(kv, industry);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let kv = JsonFileKv::new(&cli.state);

    match cli.command {
        Command::Report {
            industry,
            api_key,
            model,
            timeout_secs,
        } => {
            let cfg = AppConfig::load_default()?;
            run_report(&kv, &cfg, &industry, api_key.as_deref(), model, timeout_secs).await
        }
        Command::Sense { industry, server } => run_sense(&kv, &industry, &server).await,
        Command::History => {
            let history = SearchHistory::load(&kv);
            if history.entries().is_empty() {
                println!("(no searches yet)");
            }
            for term in history.entries() {
                println!("{term}");
            }
            Ok(())
        }
        Command::SetKey { key } => {
            save_api_key(&kv, &key)?;
            println!("API key stored in {} (plain text)", kv.path().display());
            Ok(())
        }
        Command::ClearKey => {
            clear_api_key(&kv)?;
            println!("API key removed");
            Ok(())
        }
    }
}
