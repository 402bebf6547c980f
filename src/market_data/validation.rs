//! Boundary checks for candles arriving from a history provider.

use tracing::warn;

use crate::types::Candle;

/// Validate a candle has reasonable values.
pub fn validate_candle(candle: &Candle) -> bool {
    candle.open.is_finite()
        && candle.high.is_finite()
        && candle.low.is_finite()
        && candle.close.is_finite()
        && candle.high >= candle.low
        && candle.open > 0.0
        && candle.close > 0.0
        && candle.low > 0.0
}

/// Drop invalid candles and any candle whose time does not strictly follow
/// the previous kept candle. The result is safe to feed to the indicators.
pub fn sanitize_series(symbol: &str, candles: Vec<Candle>) -> Vec<Candle> {
    let total = candles.len();
    let mut kept: Vec<Candle> = Vec::with_capacity(total);

    for candle in candles {
        if !validate_candle(&candle) {
            continue;
        }
        if let Some(last) = kept.last() {
            if candle.time <= last.time {
                continue;
            }
        }
        kept.push(candle);
    }

    let dropped = total - kept.len();
    if dropped > 0 {
        warn!(symbol = %symbol, dropped, kept = kept.len(), "dropped malformed or out-of-order candles");
    }

    kept
}
