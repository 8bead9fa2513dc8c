use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use metrics::{counter, histogram};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::error::{panic_response, SenseError};
use crate::sensing::{SensingResponse, SensingService};

#[derive(Clone)]
pub struct AppState {
    pub sensing: Arc<SensingService>,
}

impl AppState {
    pub fn new(service: SensingService) -> Self {
        Self {
            sensing: Arc::new(service),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/sense", post(sense))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct SenseReq {
    #[serde(default)]
    industry: Option<String>,
}

async fn sense(
    State(state): State<AppState>,
    payload: Result<Json<SenseReq>, JsonRejection>,
) -> Result<Json<SensingResponse>, SenseError> {
    let t0 = Instant::now();

    let industry = match payload {
        Ok(Json(body)) => body.industry.unwrap_or_default(),
        Err(rej) => {
            tracing::debug!(error = %rej, "unreadable /api/sense body");
            String::new()
        }
    };

    let res = state.sensing.sense(&industry).await;

    let status = match &res {
        Ok(_) => 200,
        Err(e) => e.status().as_u16(),
    };
    counter!("sensing_requests_total", "status" => status.to_string()).increment(1);
    histogram!("sensing_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    res.map(Json)
}
