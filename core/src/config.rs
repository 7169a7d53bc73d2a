//! Client configuration.
//!
//! Resolved in priority order:
//! 1. Environment variables (`POKEDEX_BASE_URL`, `POKEDEX_PAGE_LIMIT`,
//!    `POKEDEX_TIMEOUT_SECS`, `POKEDEX_SEARCH_DEBOUNCE_MS`,
//!    `POKEDEX_STOP_TIMEOUT_MS`) via [`ClientConfig::from_env`].
//! 2. Values deserialized by the host (JSON, TOML, ...). Missing keys fall
//!    back to the defaults.
//! 3. Compiled defaults.
//!
//! | Key | Default |
//! |-----|---------|
//! | `base_url` | `https://pokeapi.co/api/v2` |
//! | `page_limit` | `100` |
//! | `connect_timeout` / `read_timeout` / `write_timeout` | 30 s |
//! | `search_debounce` | 300 ms |
//! | `stop_timeout` | 5 s |
//! | `max_idle_connections` | 8 |

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Page size requested from the list endpoint.
    pub page_limit: u32,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Quiescence window before a search query is applied.
    pub search_debounce: Duration,
    /// Grace period before an unobserved list stream is torn down.
    pub stop_timeout: Duration,
    pub max_idle_connections: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: 100,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            search_debounce: Duration::from_millis(300),
            stop_timeout: Duration::from_millis(5_000),
            max_idle_connections: 8,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `POKEDEX_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = lookup("POKEDEX_BASE_URL") {
            self.base_url = url;
        }
        if let Some(raw) = lookup("POKEDEX_PAGE_LIMIT") {
            self.page_limit = parse_positive("POKEDEX_PAGE_LIMIT", &raw)? as u32;
        }
        if let Some(raw) = lookup("POKEDEX_TIMEOUT_SECS") {
            let timeout = Duration::from_secs(parse_positive("POKEDEX_TIMEOUT_SECS", &raw)?);
            self.connect_timeout = timeout;
            self.read_timeout = timeout;
            self.write_timeout = timeout;
        }
        if let Some(raw) = lookup("POKEDEX_SEARCH_DEBOUNCE_MS") {
            self.search_debounce = Duration::from_millis(parse_positive("POKEDEX_SEARCH_DEBOUNCE_MS", &raw)?);
        }
        if let Some(raw) = lookup("POKEDEX_STOP_TIMEOUT_MS") {
            self.stop_timeout = Duration::from_millis(parse_positive("POKEDEX_STOP_TIMEOUT_MS", &raw)?);
        }
        Ok(self)
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|value| *value > 0 && *value <= u64::from(u32::MAX))
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            expected: "a positive integer",
            value: raw.to_string(),
        })
}
