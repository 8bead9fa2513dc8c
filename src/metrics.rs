use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the request-level series.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("sensing_requests_total", "POST /api/sense by status.");
        describe_counter!(
            "sensing_export_failures_total",
            "CSV exports that failed (request continued without csvUrl)."
        );
        describe_counter!(
            "sensing_summary_failures_total",
            "Summaries rejected, by stage (model, parse)."
        );
        describe_histogram!("sensing_request_ms", "End-to-end /api/sense latency.");
        describe_histogram!("sensing_fetch_ms", "News fetch + merge latency.");
        describe_histogram!("sensing_parse_ms", "Provider body parse time.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
