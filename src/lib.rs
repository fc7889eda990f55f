// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod result;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{analyze_locally, NovaGroup};
pub use crate::api::{router, AppState};
pub use crate::config::AnalyzerConfig;
pub use crate::error::{AnalysisError, RemoteError};
pub use crate::metrics::Metrics;
pub use crate::result::{ClassificationResult, DetectedAdditive, RiskLevel};
pub use crate::session::{AnalysisSession, FallbackObserver, FallbackReason, SessionConfig};
