// =============================================================================
// Price History Client — OHLCV candles over HTTP with mock fallback
// =============================================================================
//
// GET {base_url}/history?symbol=SYM&days=N returns a JSON array of
// `{ time, open, high, low, close, volume }`. Numeric fields may arrive as
// numbers or as strings. Everything is mapped onto `Candle` here and
// sanitised before it reaches the indicator engine.
// =============================================================================

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use super::mock::generate_mock_history;
use super::validation::sanitize_series;
use crate::types::Candle;

/// Fetches candle history for one symbol at a time.
#[derive(Clone)]
pub struct HistoryClient {
    base_url: Option<String>,
    days: u32,
    mock_fallback: bool,
    client: reqwest::Client,
}

impl HistoryClient {
    /// Create a new client. With `base_url == None` every fetch is served by
    /// the mock generator (if `mock_fallback` is set).
    pub fn new(base_url: Option<String>, days: u32, mock_fallback: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build history HTTP client")?;

        let base_url = base_url.map(|u| u.trim_end_matches('/').to_string());
        debug!(base_url = ?base_url, days, mock_fallback, "HistoryClient initialised");

        Ok(Self {
            base_url,
            days,
            mock_fallback,
            client,
        })
    }

    /// Fetch the candle series for `symbol`, oldest first.
    #[instrument(skip(self), name = "history::fetch")]
    pub async fn fetch(&self, symbol: &str) -> Result<Vec<Candle>> {
        let Some(base_url) = self.base_url.as_deref() else {
            if self.mock_fallback {
                debug!(symbol, "no history provider configured, using mock data");
                return Ok(generate_mock_history(symbol, self.days as usize));
            }
            anyhow::bail!("no history provider configured and mock fallback disabled");
        };

        match self.fetch_remote(base_url, symbol).await {
            Ok(candles) => Ok(candles),
            Err(e) if self.mock_fallback => {
                warn!(symbol, error = %e, "history provider unreachable, falling back to mock data");
                Ok(generate_mock_history(symbol, self.days as usize))
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_remote(&self, base_url: &str, symbol: &str) -> Result<Vec<Candle>> {
        let url = format!("{base_url}/history");

        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol.to_string()), ("days", self.days.to_string())])
            .send()
            .await
            .context("GET /history request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let excerpt: String = text.chars().take(200).collect();
            anyhow::bail!("GET /history returned {}: {}", status, excerpt);
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse history response")?;

        let candles = sanitize_series(symbol, parse_history_body(&body)?);
        info!(symbol, count = candles.len(), "history fetched");
        Ok(candles)
    }
}

/// Map the provider's JSON array onto candles. Entries that are not objects
/// or lack a required field fail the whole response.
pub fn parse_history_body(body: &serde_json::Value) -> Result<Vec<Candle>> {
    let raw = body.as_array().context("history response is not an array")?;

    raw.iter()
        .enumerate()
        .map(|(i, entry)| {
            let time = parse_i64(&entry["time"])
                .with_context(|| format!("entry {i}: missing or invalid time"))?;
            let volume = match &entry["volume"] {
                serde_json::Value::Null => 0.0,
                v => parse_f64(v, "volume").with_context(|| format!("entry {i}"))?,
            };
            Ok(Candle {
                time,
                open: parse_f64(&entry["open"], "open").with_context(|| format!("entry {i}"))?,
                high: parse_f64(&entry["high"], "high").with_context(|| format!("entry {i}"))?,
                low: parse_f64(&entry["low"], "low").with_context(|| format!("entry {i}"))?,
                close: parse_f64(&entry["close"], "close").with_context(|| format!("entry {i}"))?,
                volume: volume.max(0.0).round() as u64,
            })
        })
        .collect()
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn parse_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

fn parse_i64(val: &serde_json::Value) -> Result<i64> {
    match val {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .context("time is not an integer"),
        serde_json::Value::String(s) => s.parse::<i64>().context("time is not an integer"),
        _ => anyhow::bail!("time has unexpected JSON type"),
    }
}

/// Local history provider for tests.
///
/// - `{base}/good/history?symbol=AAPL&days=5`: unsorted and partly invalid
///   candles; other query strings get 404.
/// - `{base}/broken/history`: 500 with a plain-text body.
/// - `{base}/garbage/history`: 200 with a body that is not JSON.
#[cfg(test)]
pub(crate) mod test_provider {
    use std::collections::HashMap;

    use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

    async fn good(Query(q): Query<HashMap<String, String>>) -> axum::response::Response {
        if q.get("symbol").map(String::as_str) != Some("AAPL") || q.get("days").map(String::as_str) != Some("5") {
            return StatusCode::NOT_FOUND.into_response();
        }
        Json(serde_json::json!([
            { "time": 100, "open": 10.0, "high": 11.0, "low": 9.0, "close": 10.5, "volume": 1 },
            { "time": 300, "open": 10.5, "high": 12.0, "low": 10.0, "close": 11.0, "volume": 2 },
            { "time": 200, "open": 11.0, "high": 12.0, "low": 10.0, "close": 11.5, "volume": 3 },
            { "time": 400, "open": 11.0, "high": 9.0, "low": 10.0, "close": 11.5, "volume": 4 },
            { "time": "500", "open": "11.5", "high": "13", "low": "11", "close": "12.25", "volume": "5" }
        ]))
        .into_response()
    }

    async fn broken() -> impl IntoResponse {
        (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
    }

    async fn garbage() -> impl IntoResponse {
        "definitely not json"
    }

    /// Serve the provider on an ephemeral port and return its base URL.
    pub(crate) async fn spawn() -> String {
        let app = Router::new()
            .route("/good/history", get(good))
            .route("/broken/history", get(broken))
            .route("/garbage/history", get(garbage));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}
