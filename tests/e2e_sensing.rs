// tests/e2e_sensing.rs
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use http::{Request, StatusCode};
use tower::ServiceExt;

use common::{
    BrokenStore, CountingProvider, FailingModel, PanickingProvider, GDELT_JSON, GOOGLE_XML,
    THREE_TRENDS,
};
use sensing_ai::error::{ErrorBody, MSG_MISSING_INDUSTRY, MSG_NO_NEWS, MSG_SUMMARY_FAILED};
use sensing_ai::export::store::{MemoryStore, ObjectStore};
use sensing_ai::ingest::providers::gdelt::GdeltProvider;
use sensing_ai::ingest::providers::google_news::GoogleNewsProvider;
use sensing_ai::ingest::types::NewsProvider;
use sensing_ai::summarize::{DynModel, StaticModel};
use sensing_ai::{create_router, AppState, SensingResponse, SensingService};

fn fixture_providers(calls: &Arc<AtomicUsize>) -> Vec<Box<dyn NewsProvider>> {
    vec![
        Box::new(CountingProvider::wrap(
            Box::new(GoogleNewsProvider::from_fixture(GOOGLE_XML)),
            calls.clone(),
        )),
        Box::new(CountingProvider::wrap(
            Box::new(GdeltProvider::from_fixture(GDELT_JSON)),
            calls.clone(),
        )),
    ]
}

fn app(
    providers: Vec<Box<dyn NewsProvider>>,
    store: Arc<dyn ObjectStore>,
    model: DynModel,
) -> axum::Router {
    create_router(AppState::new(SensingService::new(providers, store, model)))
}

fn sense_req(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/sense")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    to_bytes(resp.into_body(), 1 << 20).await.unwrap().to_vec()
}

#[tokio::test]
async fn health_ok() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        fixture_providers(&calls),
        Arc::new(MemoryStore::new()),
        Arc::new(StaticModel::new(THREE_TRENDS)),
    );
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"OK");
}

#[tokio::test]
async fn semiconductor_request_returns_trends_and_csv_url() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryStore::new());
    let model = Arc::new(StaticModel::new(THREE_TRENDS));
    let app = app(fixture_providers(&calls), store.clone(), model.clone());

    let resp = app
        .oneshot(sense_req(r#"{"industry":"  반도체 "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let out: SensingResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(out.industry, "반도체");
    assert_eq!(out.trends.len(), 3);
    assert!(out.csv_url.starts_with("memory://exports"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(model.call_count(), 1);

    let paths = store.paths();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].starts_with("exports/반도체/"));
    let csv = String::from_utf8(store.get(&paths[0]).unwrap().bytes).unwrap();
    // header + four merged, deduplicated items
    assert_eq!(csv.lines().count(), 5);
}

#[tokio::test]
async fn response_uses_camel_case_fields() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        fixture_providers(&calls),
        Arc::new(MemoryStore::new()),
        Arc::new(StaticModel::new(THREE_TRENDS)),
    );
    let resp = app.oneshot(sense_req(r#"{"industry":"반도체"}"#)).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(v.get("csvUrl").is_some());
    assert!(v["trends"][0].get("keywords").is_some());
}

#[tokio::test]
async fn empty_industry_is_rejected_without_fetching() {
    for body in [r#"{"industry":""}"#, r#"{"industry":"   "}"#, r#"{}"#, "not json"] {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = Arc::new(StaticModel::new(THREE_TRENDS));
        let app = app(
            fixture_providers(&calls),
            Arc::new(MemoryStore::new()),
            model.clone(),
        );

        let resp = app.oneshot(sense_req(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
        let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(err.error, MSG_MISSING_INDUSTRY);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(model.call_count(), 0);
    }
}

#[tokio::test]
async fn no_news_is_not_found_and_skips_the_model() {
    let calls = Arc::new(AtomicUsize::new(0));
    let model = Arc::new(StaticModel::new(THREE_TRENDS));
    let store = Arc::new(MemoryStore::new());
    let providers: Vec<Box<dyn NewsProvider>> = vec![
        Box::new(CountingProvider::failing("google_news", calls.clone())),
        Box::new(CountingProvider::failing("gdelt", calls.clone())),
    ];
    let app = app(providers, store.clone(), model.clone());

    let resp = app.oneshot(sense_req(r#"{"industry":"반도체"}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, MSG_NO_NEWS);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(model.call_count(), 0);
    assert!(store.paths().is_empty());
}

#[tokio::test]
async fn export_failure_still_returns_trends() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        fixture_providers(&calls),
        Arc::new(BrokenStore),
        Arc::new(StaticModel::new(THREE_TRENDS)),
    );

    let resp = app.oneshot(sense_req(r#"{"industry":"반도체"}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let out: SensingResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(out.trends.len(), 3);
    assert_eq!(out.csv_url, "");
}

#[tokio::test]
async fn summary_failure_is_internal_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        fixture_providers(&calls),
        Arc::new(MemoryStore::new()),
        Arc::new(FailingModel::new()),
    );

    let resp = app.oneshot(sense_req(r#"{"industry":"반도체"}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, MSG_SUMMARY_FAILED);
}

#[tokio::test]
async fn unparseable_summary_is_internal_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        fixture_providers(&calls),
        Arc::new(MemoryStore::new()),
        Arc::new(StaticModel::new("{\"trends\": \"none\"}")),
    );

    let resp = app.oneshot(sense_req(r#"{"industry":"반도체"}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(v["error"].as_str().is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn panic_in_pipeline_is_internal_error_with_message() {
    let model = Arc::new(StaticModel::new(THREE_TRENDS));
    let providers: Vec<Box<dyn NewsProvider>> = vec![Box::new(PanickingProvider)];
    let app = app(providers, Arc::new(MemoryStore::new()), model.clone());

    let resp = app.oneshot(sense_req(r#"{"industry":"반도체"}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(err.error, "feed parser state corrupted");
    assert_eq!(model.call_count(), 0);
}
