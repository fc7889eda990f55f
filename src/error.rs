// src/error.rs
//! Error types. Only `AnalysisError` reaches callers; `RemoteError` is
//! always turned into a local fallback.

/// Failures surfaced by `AnalysisSession`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("an analysis is already in progress, retry once it completes")]
    Busy,

    #[error("analyse impossible: {0}")]
    Critical(String),
}

impl AnalysisError {
    /// Stable machine-readable code for API bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => "invalid_input",
            AnalysisError::Busy => "busy",
            AnalysisError::Critical(_) => "critical",
        }
    }
}

/// Why a remote scoring attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("remote scoring disabled")]
    Disabled,

    #[error("remote answered HTTP {0}")]
    Status(u16),

    #[error("network failure: {0}")]
    Network(String),

    #[error("undecodable remote payload: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::Disabled => "disabled",
            RemoteError::Status(_) => "status",
            RemoteError::Network(_) => "network",
            RemoteError::Decode(_) => "decode",
        }
    }
}
