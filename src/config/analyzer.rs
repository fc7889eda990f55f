// src/config/analyzer.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::result::DEFAULT_CATEGORY;

pub const DEFAULT_CONFIG_JSON: &str = "config/analyzer.json";
pub const DEFAULT_CONFIG_TOML: &str = "config/analyzer.toml";

pub const ENV_CONFIG_PATH: &str = "ECOLOJIA_CONFIG_PATH";
pub const ENV_API_URL: &str = "ECOLOJIA_API_URL";
pub const ENV_API_KEY: &str = "ECOLOJIA_API_KEY";
pub const ENV_REMOTE_TIMEOUT_MS: &str = "ECOLOJIA_REMOTE_TIMEOUT_MS";
pub const ENV_FALLBACK_DELAY_MS: &str = "ECOLOJIA_FALLBACK_DELAY_MS";
pub const ENV_BIND: &str = "ECOLOJIA_BIND";

fn default_enabled() -> bool {
    true
}
fn default_endpoint() -> String {
    "/api/analyze/product".to_string()
}
fn default_timeout_ms() -> u64 {
    8_000
}
fn default_fallback_delay_ms() -> u64 {
    1_500
}
fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}
fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Ask the remote scorer at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// e.g. "https://api.ecolojia.app"; no remote call when absent.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// "ENV" means: read from ECOLOJIA_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Artificial delay before the local fallback result is returned.
    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: None,
            endpoint: default_endpoint(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            fallback_delay_ms: default_fallback_delay_ms(),
            default_category: default_category(),
            bind: default_bind(),
        }
    }
}

impl AnalyzerConfig {
    /// Load from an explicit path; `.toml` is parsed as TOML, anything else as JSON.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading analyzer config from {}", path.display()))?;
        let is_toml = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        let cfg: AnalyzerConfig = if is_toml {
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
        } else {
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
        };
        Ok(cfg)
    }

    /// Resolution order:
    /// 1) $ECOLOJIA_CONFIG_PATH (must exist)
    /// 2) config/analyzer.json
    /// 3) config/analyzer.toml
    /// 4) defaults
    ///
    /// Env overrides are applied on top, then values are sanitized.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let json = Path::new(DEFAULT_CONFIG_JSON);
                let toml_path = Path::new(DEFAULT_CONFIG_TOML);
                if json.exists() {
                    Self::load_from_file(json)?
                } else if toml_path.exists() {
                    Self::load_from_file(toml_path)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Apply overrides from an env-like lookup (injected for tests).
    pub fn apply_env<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = get(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = Some(url.trim().to_string());
        }
        if let Some(ms) = get(ENV_REMOTE_TIMEOUT_MS) {
            self.timeout_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("{ENV_REMOTE_TIMEOUT_MS} must be milliseconds"))?;
        }
        if let Some(ms) = get(ENV_FALLBACK_DELAY_MS) {
            self.fallback_delay_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("{ENV_FALLBACK_DELAY_MS} must be milliseconds"))?;
        }
        if let Some(bind) = get(ENV_BIND).filter(|v| !v.trim().is_empty()) {
            self.bind = bind.trim().to_string();
        }

        // Resolve api key if "ENV"
        let wants_env_key = self
            .api_key
            .as_deref()
            .is_some_and(|k| k.trim().eq_ignore_ascii_case("env"));
        if wants_env_key {
            self.api_key = Some(
                get(ENV_API_KEY)
                    .ok_or_else(|| anyhow::anyhow!("Missing {ENV_API_KEY} env var"))?,
            );
        } else if self.api_key.is_none() {
            self.api_key = get(ENV_API_KEY).filter(|k| !k.is_empty());
        }
        Ok(())
    }

    /// Zero timeout or blank category fall back to defaults.
    pub fn sanitize(&mut self) {
        if self.timeout_ms == 0 {
            self.timeout_ms = default_timeout_ms();
        }
        if self.default_category.trim().is_empty() {
            self.default_category = default_category();
        }
        if self.endpoint.trim().is_empty() {
            self.endpoint = default_endpoint();
        }
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn unique_tmp_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        dir.push(format!("analyzer_cfg_test_{}", nanos));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.remote_timeout(), Duration::from_secs(8));
        assert_eq!(cfg.fallback_delay(), Duration::from_millis(1500));
        assert_eq!(cfg.default_category, "alimentaire");
        assert!(cfg.base_url.is_none());
    }

    #[test]
    fn loads_json_and_toml() {
        let dir = unique_tmp_dir();

        let json = dir.join("analyzer.json");
        let mut f = fs::File::create(&json).unwrap();
        write!(f, r#"{{"base_url":"http://api.local","timeout_ms":2000}}"#).unwrap();
        let cfg = AnalyzerConfig::load_from_file(&json).unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("http://api.local"));
        assert_eq!(cfg.timeout_ms, 2000);
        assert_eq!(cfg.fallback_delay_ms, 1500);

        let toml_path = dir.join("analyzer.toml");
        let mut f = fs::File::create(&toml_path).unwrap();
        writeln!(f, "enabled = false\nfallback_delay_ms = 0").unwrap();
        let cfg = AnalyzerConfig::load_from_file(&toml_path).unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.fallback_delay_ms, 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn env_overrides_and_key_resolution() {
        let mut cfg = AnalyzerConfig {
            api_key: Some("ENV".into()),
            ..Default::default()
        };
        cfg.apply_env(env(&[
            (ENV_API_URL, " http://remote "),
            (ENV_REMOTE_TIMEOUT_MS, "1200"),
            (ENV_API_KEY, "secret"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("http://remote"));
        assert_eq!(cfg.timeout_ms, 1200);
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn env_key_required_when_requested() {
        let mut cfg = AnalyzerConfig {
            api_key: Some("env".into()),
            ..Default::default()
        };
        assert!(cfg.apply_env(env(&[])).is_err());
    }

    #[test]
    fn bad_number_is_an_error() {
        let mut cfg = AnalyzerConfig::default();
        assert!(cfg.apply_env(env(&[(ENV_FALLBACK_DELAY_MS, "soon")])).is_err());
    }

    #[test]
    fn sanitize_restores_defaults() {
        let mut cfg = AnalyzerConfig {
            timeout_ms: 0,
            default_category: "  ".into(),
            endpoint: String::new(),
            ..Default::default()
        };
        cfg.sanitize();
        assert_eq!(cfg, AnalyzerConfig::default());
    }
}
