use std::time::Duration;

use serde::Deserialize;

use crate::error::{CodemateError, Result};

/// Browser-like identity; some pricing pages reject unidentified clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Runtime settings: defaults, then an optional TOML file named by
/// `$CODEMATE_CONFIG`, then `CODEMATE_*` environment overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub fresh_ttl_secs: u64,
    pub stale_ttl_secs: u64,
    /// How long a cache entry is usable for tools without a live source.
    pub catalog_ttl_secs: u64,
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fresh_ttl_secs: 6 * 60 * 60,
            stale_ttl_secs: 24 * 60 * 60,
            catalog_ttl_secs: 72 * 60 * 60,
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string. Missing keys keep their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(toml_str)
            .map_err(|e| CodemateError::Config(format!("bad config file: {e}")))?;
        settings.validate()
    }

    /// Load from `$CODEMATE_CONFIG` (if set) and the environment.
    pub fn load() -> Result<Self> {
        let base = match std::env::var("CODEMATE_CONFIG") {
            Ok(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| CodemateError::Config(format!("cannot read {path}: {e}")))?;
                Self::from_toml_str(&content)?
            }
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `CODEMATE_*` overrides from `lookup`, then validate.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CODEMATE_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = parse_secs("CODEMATE_FETCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("CODEMATE_USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = lookup("CODEMATE_FRESH_TTL_SECS") {
            self.fresh_ttl_secs = parse_secs("CODEMATE_FRESH_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("CODEMATE_STALE_TTL_SECS") {
            self.stale_ttl_secs = parse_secs("CODEMATE_STALE_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("CODEMATE_CATALOG_TTL_SECS") {
            self.catalog_ttl_secs = parse_secs("CODEMATE_CATALOG_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("CODEMATE_BIND") {
            self.bind = v;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.fetch_timeout_secs == 0 {
            return Err(CodemateError::Config(
                "fetch_timeout_secs must be positive".into(),
            ));
        }
        if self.fresh_ttl_secs >= self.stale_ttl_secs {
            return Err(CodemateError::Config(format!(
                "fresh_ttl_secs ({}) must be below stale_ttl_secs ({})",
                self.fresh_ttl_secs, self.stale_ttl_secs
            )));
        }
        if self.catalog_ttl_secs < self.stale_ttl_secs {
            return Err(CodemateError::Config(format!(
                "catalog_ttl_secs ({}) must be at least stale_ttl_secs ({})",
                self.catalog_ttl_secs, self.stale_ttl_secs
            )));
        }
        Ok(self)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn fresh_ttl(&self) -> Duration {
        Duration::from_secs(self.fresh_ttl_secs)
    }

    pub fn stale_ttl(&self) -> Duration {
        Duration::from_secs(self.stale_ttl_secs)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| CodemateError::Config(format!("{key}: expected seconds, got {value:?}")))
}
