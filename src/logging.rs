// src/logging.rs
//! Tracing setup and log-safe helpers. Raw ingredient text is never logged;
//! events carry a short hashed id instead.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "ecolojia_nova=info,warn";
pub const ENV_LOG_JSON: &str = "ECOLOJIA_LOG_JSON";

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `ECOLOJIA_LOG_JSON=1` switches to JSON lines. Safe to call twice.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var(ENV_LOG_JSON)
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// First 6 bytes of SHA-256, hex. Stable id for a text without logging it.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("sucre, sel");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("sucre, sel"));
        assert_ne!(a, anon_hash("sucre, sel marin"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
