// src/metrics.rs
use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

static GLOBAL: OnceCell<Metrics> = OnceCell::new();

impl Metrics {
    /// Install the Prometheus recorder once per process and describe the
    /// analysis series so they show up on `/metrics`.
    pub fn install() -> anyhow::Result<&'static Metrics> {
        GLOBAL.get_or_try_init(|| {
            // Use default buckets to avoid API differences across crate versions.
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .context("prometheus: install recorder")?;

            describe_counter!("analysis_total", "Completed analyses by result source.");
            describe_counter!(
                "analysis_fallback_total",
                "Analyses served by the local engine, by fallback reason."
            );
            describe_histogram!("analysis_duration_ms", "End-to-end analysis time in milliseconds.");

            Ok(Metrics { handle })
        })
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
