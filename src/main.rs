//! Sensing service binary entrypoint.
//! Boots the Axum HTTP server: config, providers, storage, model, metrics.

use sensing_ai::config::AppConfig;
use sensing_ai::metrics::Metrics;
use sensing_ai::{create_router, AppState, SensingService};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Local runs get our own subscriber; under Shuttle the runtime's subscriber
/// is already installed and `try_init` is a no-op.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sensing_ai=info,tower_http=info,warn"));

    let json = std::env::var("SENSING_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default()?;
    tracing::info!(
        model = %cfg.gemini.model,
        key_len = cfg.gemini.api_key.len(),
        bucket = ?cfg.storage.bucket,
        timeout_secs = cfg.http_timeout_secs,
        "sensing config loaded"
    );

    let service = SensingService::from_config(&cfg).await?;
    let mut router = create_router(AppState::new(service));

    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
