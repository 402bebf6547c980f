// =============================================================================
// Simulated price feed
// =============================================================================
//
// While the dashboard is streaming, every tick moves each held symbol, and
// each symbol with a pending alert, by a random amount within ±2 % and applies
// the quote as a `PriceTick` event. Starting prices come from the last quote,
// the demo base-price table, the holding's purchase price, or the alert's
// target, in that order.
// =============================================================================

use std::sync::Arc;

use rand::Rng;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app_state::{AppState, DashboardEvent, DashboardSnapshot};
use crate::market_data::base_price;
use crate::types::{PriceUpdate, StreamStatus};

/// Largest single-tick move, in percent.
const MAX_MOVE_PCT: f64 = 2.0;

/// Produce the next simulated quote for `symbol` from `last_price`.
pub fn next_quote<R: Rng + ?Sized>(rng: &mut R, symbol: &str, last_price: f64, now: i64) -> PriceUpdate {
    let change_pct = (rng.random::<f64>() - 0.5) * 2.0 * MAX_MOVE_PCT;
    let change = last_price * change_pct / 100.0;
    let price = last_price + change;

    PriceUpdate {
        symbol: symbol.to_string(),
        price,
        change,
        change_pct,
        day_high: price * 1.02,
        day_low: price * 0.98,
        volume: rng.random_range(0..10_000_000u64),
        timestamp: now,
    }
}

/// Price a symbol starts from before any quote exists.
pub fn reference_price(snapshot: &DashboardSnapshot, symbol: &str) -> Option<f64> {
    if let Some(update) = snapshot.latest_prices.get(symbol) {
        return Some(update.price);
    }
    if let Some(price) = base_price(symbol) {
        return Some(price);
    }
    snapshot
        .holdings
        .iter()
        .find(|h| h.symbol == symbol)
        .map(|h| h.purchase_price)
        .or_else(|| {
            snapshot
                .alerts
                .iter()
                .find(|a| a.symbol == symbol)
                .map(|a| a.target_price)
        })
}

/// Run one simulation step against `state`. Returns the number of quotes
/// applied (zero when not streaming).
pub fn step<R: Rng + ?Sized>(state: &AppState, rng: &mut R, now: i64) -> usize {
    let snapshot = state.snapshot();
    if snapshot.streaming != StreamStatus::Streaming {
        return 0;
    }

    let mut applied = 0;
    for symbol in snapshot.quoted_symbols() {
        let Some(last) = reference_price(&snapshot, &symbol) else {
            continue;
        };
        let quote = next_quote(rng, &symbol, last, now);
        match state.dispatch(DashboardEvent::PriceTick(quote)) {
            Ok(_) => applied += 1,
            Err(e) => warn!(symbol = %symbol, error = %e, "price tick rejected"),
        }
    }
    debug!(applied, "simulated price step");
    applied
}

/// Drive the simulator forever at the configured tick interval.
pub async fn run_price_simulator(state: Arc<AppState>) {
    let tick_ms = state.runtime_config.tick_interval_ms.max(50);
    info!(tick_ms, "price simulator started");

    let mut ticker = interval(Duration::from_millis(tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let mut rng = rand::rng();
        step(&state, &mut rng, chrono::Utc::now().timestamp());
    }
}
