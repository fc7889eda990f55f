// src/analyze/remote.rs
//! Remote scoring adapter: scorer abstraction + HTTP client + test scorers.
//!
//! The session treats the remote backend as an oracle it asks first. Every
//! failure here is recoverable: the caller falls back to the local engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::analyzer::AnalyzerConfig;
use crate::error::RemoteError;
use crate::result::PartialResult;

/// Body of the remote scoring call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRequest {
    pub product_name: String,
    pub ingredients: String,
    pub category: String,
}

#[async_trait]
pub trait RemoteScorer: Send + Sync {
    /// One attempt, no retry. Timeout is enforced by the caller.
    async fn score(&self, req: &RemoteRequest) -> Result<PartialResult, RemoteError>;
    /// Scorer name for diagnostics/logs.
    fn name(&self) -> &'static str;
}

pub type DynRemoteScorer = Arc<dyn RemoteScorer>;

/// Env switch for deterministic scorers in tests and local runs.
pub const ENV_REMOTE_MODE: &str = "ECOLOJIA_REMOTE_MODE";

/// Factory: build a scorer according to config and environment.
///
/// * `ECOLOJIA_REMOTE_MODE=mock`     → empty-payload mock (everything backfilled locally)
/// * `ECOLOJIA_REMOTE_MODE=error`    → always answers HTTP 503
/// * `ECOLOJIA_REMOTE_MODE=disabled` → disabled scorer
/// * else, `enabled == false` or no base URL → disabled scorer
/// * else the HTTP scorer.
pub fn build_scorer_from_config(config: &AnalyzerConfig) -> anyhow::Result<DynRemoteScorer> {
    match std::env::var(ENV_REMOTE_MODE).ok().as_deref() {
        Some("mock") => return Ok(Arc::new(MockScorer::new(PartialResult::default()))),
        Some("error") => return Ok(Arc::new(FailingScorer::new(RemoteError::Status(503)))),
        Some("disabled") => return Ok(Arc::new(DisabledScorer)),
        _ => {}
    }

    if !config.enabled {
        return Ok(Arc::new(DisabledScorer));
    }
    match config.base_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Arc::new(HttpScorer::new(config)?)),
        _ => Ok(Arc::new(DisabledScorer)),
    }
}

// ------------------------------------------------------------
// HTTP scorer
// ------------------------------------------------------------

/// Calls `POST {base_url}{endpoint}` with a JSON `RemoteRequest`.
pub struct HttpScorer {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpScorer {
    pub fn new(config: &AnalyzerConfig) -> anyhow::Result<Self> {
        let base = config
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("remote scorer needs a base_url"))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("ecolojia-nova/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .build()?;
        Ok(Self {
            http,
            url: join_url(base, &config.endpoint),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl RemoteScorer for HttpScorer {
    async fn score(&self, req: &RemoteRequest) -> Result<PartialResult, RemoteError> {
        let mut builder = self.http.post(&self.url).json(req);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        resp.json::<PartialResult>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        base.to_string()
    } else if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    }
}

// ------------------------------------------------------------
// Disabled / mock / failing scorers
// ------------------------------------------------------------

/// No remote configured; always falls back.
pub struct DisabledScorer;

#[async_trait]
impl RemoteScorer for DisabledScorer {
    async fn score(&self, _req: &RemoteRequest) -> Result<PartialResult, RemoteError> {
        Err(RemoteError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns a fixed payload, optionally after a delay. Counts calls.
pub struct MockScorer {
    payload: PartialResult,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockScorer {
    pub fn new(payload: PartialResult) -> Self {
        Self {
            payload,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteScorer for MockScorer {
    async fn score(&self, _req: &RemoteRequest) -> Result<PartialResult, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.payload.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Always fails with the given error.
pub struct FailingScorer {
    error: RemoteError,
}

impl FailingScorer {
    pub fn new(error: RemoteError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl RemoteScorer for FailingScorer {
    async fn score(&self, _req: &RemoteRequest) -> Result<PartialResult, RemoteError> {
        Err(self.error.clone())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> RemoteRequest {
        RemoteRequest {
            product_name: "Pain".into(),
            ingredients: "farine, eau".into(),
            category: "alimentaire".into(),
        }
    }

    #[test]
    fn url_joining() {
        assert_eq!(join_url("http://x/", "/api/analyze/product"), "http://x/api/analyze/product");
        assert_eq!(join_url("http://x", "api/a"), "http://x/api/a");
        assert_eq!(join_url(" http://x/ ", ""), "http://x");
    }

    #[test]
    fn request_serializes_camel_case() {
        let v = serde_json::to_value(req()).unwrap();
        assert_eq!(v["productName"], "Pain");
        assert_eq!(v["category"], "alimentaire");
    }

    #[tokio::test]
    async fn disabled_and_failing_scorers_error() {
        assert_eq!(DisabledScorer.score(&req()).await, Err(RemoteError::Disabled));
        let failing = FailingScorer::new(RemoteError::Status(502));
        assert_eq!(failing.score(&req()).await, Err(RemoteError::Status(502)));
    }

    #[tokio::test]
    async fn mock_counts_calls() {
        let mock = MockScorer::new(PartialResult {
            nova_group: Some(2),
            ..Default::default()
        });
        let out = mock.score(&req()).await.unwrap();
        assert_eq!(out.nova_group, Some(2));
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn disabled_config_builds_disabled_scorer() {
        let cfg = AnalyzerConfig {
            enabled: false,
            ..Default::default()
        };
        // The env switch is not set in unit tests.
        if std::env::var(ENV_REMOTE_MODE).is_err() {
            let scorer = build_scorer_from_config(&cfg).unwrap();
            assert_eq!(scorer.name(), "disabled");
        }
    }
}
