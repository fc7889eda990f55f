// src/main.rs
//! ECOLOJIA NOVA service binary.
//! Boots the Axum HTTP server around one shared analysis session.

use anyhow::Context;
use tracing::info;

use ecolojia_nova::{logging, router, AnalysisSession, AnalyzerConfig, AppState, Metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let metrics = Metrics::install()?;
    let cfg = AnalyzerConfig::load()?;
    let session = AnalysisSession::from_config(&cfg)?;
    let app = router(AppState::new(session)).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("binding {}", cfg.bind))?;
    info!(addr = %cfg.bind, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
