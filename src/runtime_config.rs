// =============================================================================
// Runtime Configuration — dashboard service settings
// =============================================================================
//
// Every field carries a serde default so that an older or partial config
// file still loads. The file is read once at startup and never written back:
// a missing file means defaults, a malformed one is a startup error.
//
// Environment overrides (applied after the file is loaded):
//   PORTFOLIO_BIND_ADDR, PORTFOLIO_HISTORY_URL, PORTFOLIO_USER_ID
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::indicators::IndicatorParams;

pub const DEFAULT_CONFIG_PATH: &str = "portfolio_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_user_id() -> String {
    "demo-user-1".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_symbol() -> String {
    "AAPL".to_string()
}

fn default_history_days() -> u32 {
    100
}

fn default_tick_interval_ms() -> u64 {
    2000
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// The single demo user the dashboard serves.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Address the HTTP/WebSocket server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Symbol charted when a request does not name one.
    #[serde(default = "default_symbol")]
    pub default_symbol: String,

    /// Base URL of the price-history provider. `None` => mock data only.
    #[serde(default)]
    pub history_url: Option<String>,

    /// Days of daily candles requested per symbol.
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Serve generated candles when the provider is missing or unreachable.
    #[serde(default = "default_true")]
    pub mock_fallback: bool,

    /// Interval between simulated price ticks while streaming.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default)]
    pub indicators: IndicatorParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            bind_addr: default_bind_addr(),
            default_symbol: default_symbol(),
            history_url: None,
            history_days: default_history_days(),
            mock_fallback: true,
            tick_interval_ms: default_tick_interval_ms(),
            indicators: IndicatorParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// Missing file is an error so the caller can fall back to defaults with a
    /// warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            default_symbol = %config.default_symbol,
            history_url = ?config.history_url,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Load `path`, or defaults when the file does not exist. A file that
    /// exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "runtime config not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply overrides from a key lookup (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = non_empty("PORTFOLIO_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(url) = non_empty("PORTFOLIO_HISTORY_URL") {
            self.history_url = Some(url);
        }
        if let Some(user) = non_empty("PORTFOLIO_USER_ID") {
            self.user_id = user;
        }
    }
}
