// src/session.rs
//! Analysis session: remote-first scoring with a local fallback, a
//! single-in-flight guard, and the last-call-wins "current analysis" slot.
//!
//! Flow of `analyze_product`:
//! 1) validate input (empty name/ingredients → `InvalidInput`)
//! 2) take the in-flight token (already taken → `Busy`, no side effects)
//! 3) ask the remote scorer, bounded by `remote_timeout`
//! 4) success → merge the partial payload over the local result
//!    failure/timeout → notify observers, wait `fallback_delay`, local result
//! 5) store as current analysis, release the token (on every path)

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::analyze::{analyze_locally, remote, DynRemoteScorer, RemoteRequest};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, RemoteError};
use crate::logging::anon_hash;
use crate::result::{ClassificationResult, DEFAULT_CATEGORY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub remote_timeout: Duration,
    pub fallback_delay: Duration,
    pub default_category: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(8),
            fallback_delay: Duration::from_millis(1500),
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl From<&AnalyzerConfig> for SessionConfig {
    fn from(cfg: &AnalyzerConfig) -> Self {
        Self {
            remote_timeout: cfg.remote_timeout(),
            fallback_delay: cfg.fallback_delay(),
            default_category: cfg.default_category.clone(),
        }
    }
}

/// Why the local engine produced the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Timeout(Duration),
    Remote(RemoteError),
}

impl FallbackReason {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FallbackReason::Timeout(_))
    }

    /// Metric label: `timeout`, or the remote error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FallbackReason::Timeout(_) => "timeout",
            FallbackReason::Remote(e) => e.kind(),
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Timeout(d) => write!(f, "remote timed out after {} ms", d.as_millis()),
            FallbackReason::Remote(e) => write!(f, "{e}"),
        }
    }
}

/// Notified each time an analysis falls back to the local engine.
pub trait FallbackObserver: Send + Sync {
    fn on_fallback(&self, reason: &FallbackReason);
}

impl<F> FallbackObserver for F
where
    F: Fn(&FallbackReason) + Send + Sync,
{
    fn on_fallback(&self, reason: &FallbackReason) {
        self(reason)
    }
}

pub struct AnalysisSession {
    remote: DynRemoteScorer,
    config: SessionConfig,
    observers: Vec<Arc<dyn FallbackObserver>>,
    /// 0 = idle, otherwise the token of the analysis in flight.
    in_flight: AtomicU64,
    next_token: AtomicU64,
    current: RwLock<Option<ClassificationResult>>,
}

/// Releases the in-flight token on drop, unless a reset already did.
struct InFlight<'a> {
    slot: &'a AtomicU64,
    token: u64,
}

impl InFlight<'_> {
    fn still_owned(&self) -> bool {
        self.slot.load(Ordering::Acquire) == self.token
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let _ = self
            .slot
            .compare_exchange(self.token, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

impl AnalysisSession {
    pub fn new(remote: DynRemoteScorer, config: SessionConfig) -> Self {
        Self {
            remote,
            config,
            observers: Vec::new(),
            in_flight: AtomicU64::new(0),
            next_token: AtomicU64::new(1),
            current: RwLock::new(None),
        }
    }

    /// Build scorer + session from loaded configuration.
    pub fn from_config(cfg: &AnalyzerConfig) -> anyhow::Result<Self> {
        let scorer = remote::build_scorer_from_config(cfg)?;
        info!(scorer = scorer.name(), timeout_ms = cfg.timeout_ms, "analysis session ready");
        Ok(Self::new(scorer, SessionConfig::from(cfg)))
    }

    pub fn with_observer<O: FallbackObserver + 'static>(mut self, observer: O) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    pub async fn analyze_product(
        &self,
        product_name: &str,
        ingredients: &str,
    ) -> Result<ClassificationResult, AnalysisError> {
        self.analyze_product_in(product_name, ingredients, None).await
    }

    /// Same as `analyze_product` with an explicit category.
    pub async fn analyze_product_in(
        &self,
        product_name: &str,
        ingredients: &str,
        category: Option<&str>,
    ) -> Result<ClassificationResult, AnalysisError> {
        if product_name.trim().is_empty() {
            return Err(AnalysisError::InvalidInput("product name is empty".into()));
        }
        if ingredients.trim().is_empty() {
            return Err(AnalysisError::InvalidInput("ingredients are empty".into()));
        }

        let guard = self.acquire()?;
        let id = anon_hash(ingredients);
        let started = Instant::now();

        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.config.default_category.as_str())
            .to_string();
        let req = RemoteRequest {
            product_name: product_name.trim().to_string(),
            ingredients: ingredients.to_string(),
            category,
        };

        debug!(%id, scorer = self.remote.name(), "analysis started");
        let result = self.run(&id, req).await?;

        if let Err(msg) = result.check_invariants() {
            warn!(%id, %msg, "result failed invariant check");
            return Err(AnalysisError::Critical(msg));
        }

        let elapsed = started.elapsed();
        counter!("analysis_total", "source" => result.source.as_str()).increment(1);
        histogram!("analysis_duration_ms").record(elapsed.as_secs_f64() * 1000.0);

        info!(
            %id,
            nova = result.nova_group,
            health_score = result.health_score,
            source = ?result.source,
            elapsed_ms = elapsed.as_millis() as u64,
            "analysis done"
        );

        if !self.store_if_owned(&guard, &result) {
            debug!(%id, "session reset during analysis, result not stored");
        }
        Ok(result)
    }

    /// Ownership is checked under the same write lock `reset` takes.
    fn store_if_owned(&self, guard: &InFlight<'_>, result: &ClassificationResult) -> bool {
        let mut current = self.current.write().expect("current analysis lock poisoned");
        if !guard.still_owned() {
            return false;
        }
        *current = Some(result.clone());
        true
    }

    async fn run(&self, id: &str, req: RemoteRequest) -> Result<ClassificationResult, AnalysisError> {
        let timeout = self.config.remote_timeout;
        let reason = match tokio::time::timeout(timeout, self.remote.score(&req)).await {
            Ok(Ok(partial)) => {
                let local = run_local(&req).await?;
                return Ok(partial.merge_over(local, &req.ingredients));
            }
            Ok(Err(RemoteError::Disabled)) => {
                debug!(%id, "remote scoring disabled, using local engine");
                FallbackReason::Remote(RemoteError::Disabled)
            }
            Ok(Err(e)) => {
                warn!(%id, error = %e, "remote scoring failed, using local engine");
                FallbackReason::Remote(e)
            }
            Err(_) => {
                warn!(%id, timeout_ms = timeout.as_millis() as u64, "remote scoring timed out, using local engine");
                FallbackReason::Timeout(timeout)
            }
        };

        counter!("analysis_fallback_total", "reason" => reason.kind()).increment(1);
        for obs in &self.observers {
            obs.on_fallback(&reason);
        }

        if !self.config.fallback_delay.is_zero() {
            tokio::time::sleep(self.config.fallback_delay).await;
        }
        run_local(&req).await
    }

    /// Last completed analysis, if any.
    pub fn current_analysis(&self) -> Option<ClassificationResult> {
        self.current
            .read()
            .expect("current analysis lock poisoned")
            .clone()
    }

    pub fn is_analyzing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) != 0
    }

    /// Clears the current result and the in-flight flag. An analysis still
    /// running returns to its caller but is not stored.
    pub fn reset(&self) {
        let mut current = self.current.write().expect("current analysis lock poisoned");
        self.in_flight.store(0, Ordering::Release);
        *current = None;
    }

    fn acquire(&self) -> Result<InFlight<'_>, AnalysisError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.in_flight
            .compare_exchange(0, token, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight {
                slot: &self.in_flight,
                token,
            })
            .map_err(|_| AnalysisError::Busy)
    }
}

/// Local engine on the blocking pool; a panic in there becomes `Critical`.
async fn run_local(req: &RemoteRequest) -> Result<ClassificationResult, AnalysisError> {
    let RemoteRequest {
        product_name,
        ingredients,
        category,
    } = req.clone();
    tokio::task::spawn_blocking(move || analyze_locally(&product_name, &ingredients, &category))
        .await
        .map_err(|e| AnalysisError::Critical(e.to_string()))
}
