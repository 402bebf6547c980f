// =============================================================================
// Central Application State — Portfolio Dashboard
// =============================================================================
//
// The dashboard is an immutable `DashboardSnapshot`. Every change arrives as a
// discrete `DashboardEvent`; `DashboardSnapshot::apply` is a pure function that
// returns the next snapshot. `AppState` owns the current snapshot behind an
// `Arc` so readers (REST handlers, WebSocket push, price simulator) clone a
// pointer and never hold the lock while serialising.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock around the current `Arc<DashboardSnapshot>`; writers
//     swap the whole pointer.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::chart::ChartView;
use crate::indicators::IndicatorParams;
use crate::market_data::HistoryClient;
use crate::portfolio::{summarize, PortfolioSummary};
use crate::runtime_config::RuntimeConfig;
use crate::types::{AlertCondition, Candle, Holding, PriceAlert, PriceUpdate, StreamStatus};

// =============================================================================
// Events
// =============================================================================

/// A discrete change to the dashboard. Ids and timestamps are assigned when
/// the event is created so that applying it is deterministic.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    HoldingAdded {
        id: String,
        symbol: String,
        quantity: f64,
        purchase_price: f64,
        at: i64,
    },
    HoldingRemoved {
        id: String,
    },
    AlertSet {
        id: String,
        symbol: String,
        target_price: f64,
        condition: AlertCondition,
        at: i64,
    },
    PriceTick(PriceUpdate),
    StreamingStarted,
    StreamingStopped,
    SymbolSelected {
        symbol: String,
        candles: Vec<Candle>,
    },
}

impl DashboardEvent {
    pub fn add_holding(symbol: &str, quantity: f64, purchase_price: f64) -> Self {
        Self::HoldingAdded {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: normalize_symbol(symbol),
            quantity,
            purchase_price,
            at: Utc::now().timestamp(),
        }
    }

    pub fn set_alert(symbol: &str, target_price: f64, condition: AlertCondition) -> Self {
        Self::AlertSet {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: normalize_symbol(symbol),
            target_price,
            condition,
            at: Utc::now().timestamp(),
        }
    }

    /// Id of the holding or alert this event creates or removes.
    pub fn subject_id(&self) -> Option<&str> {
        match self {
            Self::HoldingAdded { id, .. }
            | Self::HoldingRemoved { id }
            | Self::AlertSet { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::HoldingAdded { .. } => "holding_added",
            Self::HoldingRemoved { .. } => "holding_removed",
            Self::AlertSet { .. } => "alert_set",
            Self::PriceTick(_) => "price_tick",
            Self::StreamingStarted => "streaming_started",
            Self::StreamingStopped => "streaming_stopped",
            Self::SymbolSelected { .. } => "symbol_selected",
        }
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Why an event was rejected. The snapshot is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    Invalid(String),
    NotFound(String),
    Conflict(String),
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid request: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
        }
    }
}

impl std::error::Error for EventError {}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

// =============================================================================
// Snapshot
// =============================================================================

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub user_id: String,
    pub holdings: Vec<Holding>,
    /// Insertion order (oldest first).
    pub alerts: Vec<PriceAlert>,
    pub latest_prices: HashMap<String, PriceUpdate>,
    pub streaming: StreamStatus,
    pub chart: Option<ChartView>,
    pub indicator_params: IndicatorParams,
}

impl DashboardSnapshot {
    pub fn new(user_id: impl Into<String>, indicator_params: IndicatorParams) -> Self {
        Self {
            user_id: user_id.into(),
            holdings: Vec::new(),
            alerts: Vec::new(),
            latest_prices: HashMap::new(),
            streaming: StreamStatus::Idle,
            chart: None,
            indicator_params,
        }
    }

    /// Return the snapshot that results from `event`.
    pub fn apply(&self, event: DashboardEvent) -> Result<Self, EventError> {
        let mut next = self.clone();

        match event {
            DashboardEvent::HoldingAdded {
                id,
                symbol,
                quantity,
                purchase_price,
                at,
            } => {
                if symbol.is_empty() {
                    return Err(EventError::Invalid("symbol must not be empty".into()));
                }
                if !positive(quantity) || !positive(purchase_price) {
                    return Err(EventError::Invalid(
                        "quantity and purchase_price must be positive numbers".into(),
                    ));
                }
                next.holdings.push(Holding {
                    id,
                    name: Holding::default_name(&symbol),
                    symbol,
                    quantity,
                    purchase_price,
                    purchased_at: at,
                });
            }

            DashboardEvent::HoldingRemoved { id } => {
                let before = next.holdings.len();
                next.holdings.retain(|h| h.id != id);
                if next.holdings.len() == before {
                    return Err(EventError::NotFound(format!("holding {id}")));
                }
                if next.holdings.is_empty() {
                    next.streaming = StreamStatus::Idle;
                }
            }

            DashboardEvent::AlertSet {
                id,
                symbol,
                target_price,
                condition,
                at,
            } => {
                if symbol.is_empty() {
                    return Err(EventError::Invalid("symbol must not be empty".into()));
                }
                if !positive(target_price) {
                    return Err(EventError::Invalid("target_price must be a positive number".into()));
                }
                next.alerts.push(PriceAlert {
                    id,
                    symbol,
                    target_price,
                    condition,
                    is_triggered: false,
                    triggered_price: None,
                    triggered_at: None,
                    created_at: at,
                });
            }

            DashboardEvent::PriceTick(update) => {
                for alert in next
                    .alerts
                    .iter_mut()
                    .filter(|a| !a.is_triggered && a.symbol == update.symbol)
                {
                    if alert.condition.is_met(update.price, alert.target_price) {
                        alert.is_triggered = true;
                        alert.triggered_price = Some(update.price);
                        alert.triggered_at = Some(update.timestamp);
                        info!(
                            alert_id = %alert.id,
                            symbol = %alert.symbol,
                            condition = %alert.condition,
                            target = alert.target_price,
                            price = update.price,
                            "price alert triggered"
                        );
                    }
                }
                next.latest_prices.insert(update.symbol.clone(), update);
            }

            DashboardEvent::StreamingStarted => {
                if next.holdings.is_empty() {
                    return Err(EventError::Conflict("add some holdings before streaming".into()));
                }
                next.streaming = StreamStatus::Streaming;
            }

            DashboardEvent::StreamingStopped => {
                next.streaming = StreamStatus::Idle;
            }

            DashboardEvent::SymbolSelected { symbol, candles } => {
                next.chart = Some(ChartView::build(symbol, candles, self.indicator_params));
            }
        }

        Ok(next)
    }

    /// Distinct symbols across all holdings, in first-seen order.
    pub fn held_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for h in &self.holdings {
            if !symbols.contains(&h.symbol) {
                symbols.push(h.symbol.clone());
            }
        }
        symbols
    }

    /// Symbols the price feed quotes: every held symbol, then every symbol
    /// with an untriggered alert, in first-seen order.
    pub fn quoted_symbols(&self) -> Vec<String> {
        let mut symbols = self.held_symbols();
        for a in self.alerts.iter().filter(|a| !a.is_triggered) {
            if !symbols.contains(&a.symbol) {
                symbols.push(a.symbol.clone());
            }
        }
        symbols
    }

    pub fn alerts_newest_first(&self) -> Vec<PriceAlert> {
        self.alerts.iter().rev().cloned().collect()
    }

    pub fn portfolio(&self) -> PortfolioSummary {
        summarize(&self.holdings, &self.latest_prices)
    }
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter. Incremented on every applied
    /// event; the WebSocket feed uses it to detect changes.
    pub state_version: AtomicU64,

    /// Open WebSocket connections.
    pub ws_clients: AtomicUsize,

    /// Fixed for the life of the process.
    pub runtime_config: RuntimeConfig,

    pub history: HistoryClient,

    snapshot: RwLock<Arc<DashboardSnapshot>>,

    /// Instant when the service started. Used for uptime.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, history: HistoryClient) -> Self {
        let snapshot = DashboardSnapshot::new(config.user_id.clone(), config.indicators);

        Self {
            state_version: AtomicU64::new(1),
            ws_clients: AtomicUsize::new(0),
            runtime_config: config,
            history,
            snapshot: RwLock::new(Arc::new(snapshot)),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Snapshot access ─────────────────────────────────────────────────

    /// The current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot.read().clone()
    }

    /// Apply `event` and publish the resulting snapshot.
    pub fn dispatch(&self, event: DashboardEvent) -> Result<Arc<DashboardSnapshot>, EventError> {
        let kind = event.kind();
        let mut current = self.snapshot.write();
        let next = Arc::new(current.apply(event)?);
        *current = next.clone();
        drop(current);

        self.increment_version();
        if kind != "price_tick" {
            info!(event = kind, version = self.current_state_version(), "dashboard event applied");
        }
        Ok(next)
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Serialisable view of the whole dashboard, sent by `GET /api/v1/state`
    /// and the WebSocket feed.
    ///
    /// The version is read before the snapshot. `dispatch` bumps the version
    /// after publishing, so the view is never older than its version claims.
    pub fn build_state_view(&self) -> StateView {
        let state_version = self.current_state_version();
        let snapshot = self.snapshot();
        StateView {
            state_version,
            server_time: Utc::now().timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            ws_clients: self.ws_clients.load(Ordering::Relaxed),
            user_id: snapshot.user_id.clone(),
            streaming: snapshot.streaming,
            portfolio: snapshot.portfolio(),
            alerts: snapshot.alerts_newest_first(),
            latest_prices: snapshot.latest_prices.clone(),
            chart: snapshot.chart.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_secs: u64,
    pub ws_clients: usize,
    pub user_id: String,
    pub streaming: StreamStatus,
    pub portfolio: PortfolioSummary,
    pub alerts: Vec<PriceAlert>,
    pub latest_prices: HashMap<String, PriceUpdate>,
    pub chart: Option<ChartView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::candles_from_closes;

    fn empty() -> DashboardSnapshot {
        DashboardSnapshot::new("demo-user-1", IndicatorParams::default())
    }

    fn tick(symbol: &str, price: f64, ts: i64) -> DashboardEvent {
        DashboardEvent::PriceTick(PriceUpdate {
            symbol: symbol.into(),
            price,
            change: 0.0,
            change_pct: 0.0,
            day_high: price,
            day_low: price,
            volume: 0,
            timestamp: ts,
        })
    }

    #[test]
    fn add_holding_normalises_symbol() {
        let s = empty().apply(DashboardEvent::add_holding(" aapl ", 10.0, 150.0)).unwrap();
        assert_eq!(s.holdings.len(), 1);
        assert_eq!(s.holdings[0].symbol, "AAPL");
        assert_eq!(s.holdings[0].name, "AAPL Corp.");
        assert!(!s.holdings[0].id.is_empty());
    }

    #[test]
    fn add_holding_rejects_bad_numbers() {
        for (q, p) in [(0.0, 10.0), (1.0, -5.0), (f64::NAN, 1.0), (1.0, f64::INFINITY)] {
            let err = empty().apply(DashboardEvent::add_holding("AAPL", q, p)).unwrap_err();
            assert!(matches!(err, EventError::Invalid(_)));
        }
        let err = empty().apply(DashboardEvent::add_holding("  ", 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, EventError::Invalid(_)));
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let original = empty();
        let next = original.apply(DashboardEvent::add_holding("MSFT", 1.0, 300.0)).unwrap();
        assert!(original.holdings.is_empty());
        assert_eq!(next.holdings.len(), 1);
    }

    #[test]
    fn remove_unknown_holding_is_not_found() {
        let err = empty()
            .apply(DashboardEvent::HoldingRemoved { id: "nope".into() })
            .unwrap_err();
        assert_eq!(err, EventError::NotFound("holding nope".into()));
    }

    #[test]
    fn removing_last_holding_stops_streaming() {
        let s = empty().apply(DashboardEvent::add_holding("AAPL", 1.0, 1.0)).unwrap();
        let s = s.apply(DashboardEvent::StreamingStarted).unwrap();
        assert_eq!(s.streaming, StreamStatus::Streaming);

        let id = s.holdings[0].id.clone();
        let s = s.apply(DashboardEvent::HoldingRemoved { id }).unwrap();
        assert!(s.holdings.is_empty());
        assert_eq!(s.streaming, StreamStatus::Idle);
    }

    #[test]
    fn streaming_requires_holdings() {
        let err = empty().apply(DashboardEvent::StreamingStarted).unwrap_err();
        assert!(matches!(err, EventError::Conflict(_)));
    }

    #[test]
    fn price_tick_triggers_matching_alerts_once() {
        let s = empty()
            .apply(DashboardEvent::set_alert("AAPL", 180.0, AlertCondition::Above))
            .unwrap()
            .apply(DashboardEvent::set_alert("AAPL", 170.0, AlertCondition::Below))
            .unwrap()
            .apply(DashboardEvent::set_alert("MSFT", 1.0, AlertCondition::Above))
            .unwrap();

        let s = s.apply(tick("AAPL", 179.0, 100)).unwrap();
        assert!(s.alerts.iter().all(|a| !a.is_triggered));

        let s = s.apply(tick("AAPL", 181.25, 200)).unwrap();
        assert!(s.alerts[0].is_triggered);
        assert_eq!(s.alerts[0].triggered_price, Some(181.25));
        assert_eq!(s.alerts[0].triggered_at, Some(200));
        assert!(!s.alerts[1].is_triggered);
        assert!(!s.alerts[2].is_triggered);

        // A later tick does not overwrite the trigger record.
        let s = s.apply(tick("AAPL", 190.0, 300)).unwrap();
        assert_eq!(s.alerts[0].triggered_price, Some(181.25));

        let s = s.apply(tick("AAPL", 169.0, 400)).unwrap();
        assert!(s.alerts[1].is_triggered);
        assert_eq!(s.latest_prices["AAPL"].price, 169.0);
    }

    #[test]
    fn alert_rejects_non_positive_target() {
        let err = empty()
            .apply(DashboardEvent::set_alert("AAPL", 0.0, AlertCondition::Above))
            .unwrap_err();
        assert!(matches!(err, EventError::Invalid(_)));
    }

    #[test]
    fn symbol_selection_recomputes_chart() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let s = empty()
            .apply(DashboardEvent::SymbolSelected {
                symbol: "AAPL".into(),
                candles: candles_from_closes(&closes),
            })
            .unwrap();
        let chart = s.chart.as_ref().unwrap();
        assert_eq!(chart.symbol, "AAPL");
        assert_eq!(chart.summary.sma, Some(119.5));

        let s = s
            .apply(DashboardEvent::SymbolSelected {
                symbol: "MSFT".into(),
                candles: candles_from_closes(&[5.0; 3]),
            })
            .unwrap();
        let chart = s.chart.as_ref().unwrap();
        assert_eq!(chart.symbol, "MSFT");
        assert_eq!(chart.summary.sma, None);
    }

    #[test]
    fn held_symbols_are_distinct() {
        let s = empty()
            .apply(DashboardEvent::add_holding("AAPL", 1.0, 1.0))
            .unwrap()
            .apply(DashboardEvent::add_holding("MSFT", 1.0, 1.0))
            .unwrap()
            .apply(DashboardEvent::add_holding("aapl", 2.0, 2.0))
            .unwrap();
        assert_eq!(s.held_symbols(), vec!["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[test]
    fn quoted_symbols_include_untriggered_alert_symbols() {
        let s = empty()
            .apply(DashboardEvent::add_holding("AAPL", 1.0, 1.0))
            .unwrap()
            .apply(DashboardEvent::set_alert("GOOGL", 1.0, AlertCondition::Above))
            .unwrap()
            .apply(DashboardEvent::set_alert("AAPL", 1.0, AlertCondition::Above))
            .unwrap()
            .apply(DashboardEvent::set_alert("TSLA", 1.0, AlertCondition::Above))
            .unwrap();
        assert_eq!(s.quoted_symbols(), vec!["AAPL", "GOOGL", "TSLA"]);

        // Once every alert on a non-held symbol has fired it is no longer quoted.
        let s = s.apply(tick("TSLA", 2.0, 1)).unwrap();
        assert_eq!(s.quoted_symbols(), vec!["AAPL", "GOOGL"]);
    }

    #[test]
    fn subject_id_names_created_entity() {
        let add = DashboardEvent::add_holding("AAPL", 1.0, 1.0);
        let s = empty().apply(add.clone()).unwrap();
        assert_eq!(add.subject_id(), Some(s.holdings[0].id.as_str()));

        let alert = DashboardEvent::set_alert("AAPL", 1.0, AlertCondition::Below);
        let s = s.apply(alert.clone()).unwrap();
        assert_eq!(alert.subject_id(), Some(s.alerts[0].id.as_str()));

        assert_eq!(DashboardEvent::StreamingStarted.subject_id(), None);
    }

    #[test]
    fn state_view_version_never_ahead_of_its_content() {
        let history = HistoryClient::new(None, 10, true).unwrap();
        let state = AppState::new(RuntimeConfig::default(), history);

        let view = state.build_state_view();
        state.dispatch(DashboardEvent::add_holding("AAPL", 1.0, 100.0)).unwrap();

        // The holding is not in `view`, so its version must differ from the
        // current one and a pusher comparing versions will resend.
        assert!(view.portfolio.holdings.is_empty());
        assert!(view.state_version < state.current_state_version());

        let view = state.build_state_view();
        assert_eq!(view.state_version, state.current_state_version());
        assert_eq!(view.portfolio.holdings.len(), 1);
    }

    #[test]
    fn dispatch_bumps_version_only_on_success() {
        let history = HistoryClient::new(None, 10, true).unwrap();
        let state = AppState::new(RuntimeConfig::default(), history);
        let v0 = state.current_state_version();

        assert!(state.dispatch(DashboardEvent::StreamingStarted).is_err());
        assert_eq!(state.current_state_version(), v0);

        state.dispatch(DashboardEvent::add_holding("AAPL", 1.0, 100.0)).unwrap();
        assert_eq!(state.current_state_version(), v0 + 1);
        assert_eq!(state.snapshot().holdings.len(), 1);

        let view = state.build_state_view();
        assert_eq!(view.user_id, "demo-user-1");
        assert_eq!(view.portfolio.holdings.len(), 1);
    }
}
