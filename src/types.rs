// =============================================================================
// Shared types used across the portfolio dashboard
// =============================================================================
//
// One canonical struct per entity. Wire formats (history provider JSON, API
// request bodies) are mapped onto these once at the boundary.

use serde::{Deserialize, Serialize};

/// A single OHLCV candle. `time` is a UNIX timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

/// One output sample of an indicator, aligned to the candle that supplied the
/// last term of its window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: i64,
    pub value: f64,
}

pub type IndicatorSeries = Vec<IndicatorPoint>;

/// A stock position held by the demo user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: String,
    pub symbol: String,
    /// Display name shown next to the ticker.
    #[serde(default)]
    pub name: String,
    pub quantity: f64,
    pub purchase_price: f64,
    /// UNIX seconds.
    pub purchased_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    /// Whether `price` satisfies this condition against `target`.
    pub fn is_met(self, price: f64, target: f64) -> bool {
        match self {
            Self::Above => price >= target,
            Self::Below => price <= target,
        }
    }
}

impl Holding {
    /// Display name given to a holding added by ticker alone.
    pub fn default_name(symbol: &str) -> String {
        format!("{symbol} Corp.")
    }
}

impl std::fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => write!(f, "ABOVE"),
            Self::Below => write!(f, "BELOW"),
        }
    }
}

/// A price alert. Once triggered it stays triggered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: String,
    pub symbol: String,
    pub target_price: f64,
    pub condition: AlertCondition,
    pub is_triggered: bool,
    pub triggered_price: Option<f64>,
    pub triggered_at: Option<i64>,
    pub created_at: i64,
}

/// A live (or simulated) quote for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_pct: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: u64,
    pub timestamp: i64,
}

/// Whether simulated price streaming is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamStatus {
    Idle,
    Streaming,
}

impl Default for StreamStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Streaming => write!(f, "Streaming"),
        }
    }
}
