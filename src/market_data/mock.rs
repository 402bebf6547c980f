// =============================================================================
// Mock price history — used when no history provider is reachable
// =============================================================================
//
// Daily random walk: each day moves the close by up to ±10, wicks extend up
// to 10 beyond the body, volume is 500k–1.5M. Prices are rounded to cents and
// floored at one cent so every candle passes validation.
// =============================================================================

use rand::Rng;

use crate::indicators::round2;
use crate::types::Candle;

const SECONDS_PER_DAY: i64 = 86_400;
const DEFAULT_BASE_PRICE: f64 = 150.0;
const MIN_PRICE: f64 = 0.01;

/// Reference prices for the demo symbols.
pub fn base_price(symbol: &str) -> Option<f64> {
    let price = match symbol {
        "AAPL" => 175.50,
        "GOOGL" => 140.25,
        "MSFT" => 380.75,
        "AMZN" => 152.30,
        "TSLA" => 242.80,
        "META" => 485.20,
        "NVDA" => 495.60,
        "NFLX" => 475.90,
        "JPM" => 210.45,
        "JNJ" => 165.80,
        _ => return None,
    };
    Some(price)
}

/// Generate `days` daily candles ending on the day containing `end_time`.
pub fn generate_history<R: Rng + ?Sized>(
    rng: &mut R,
    symbol: &str,
    end_time: i64,
    days: usize,
) -> Vec<Candle> {
    let last_day = end_time - end_time.rem_euclid(SECONDS_PER_DAY);
    let first_day = last_day - (days as i64 - 1) * SECONDS_PER_DAY;

    let mut price = base_price(symbol).unwrap_or(DEFAULT_BASE_PRICE);
    let mut candles = Vec::with_capacity(days);

    for d in 0..days as i64 {
        let change = (rng.random::<f64>() - 0.5) * 20.0;
        let open = price;
        let close = (price + change).max(MIN_PRICE);
        let high = open.max(close) + rng.random::<f64>() * 10.0;
        let low = (open.min(close) - rng.random::<f64>() * 10.0).max(MIN_PRICE);
        let volume = rng.random_range(500_000..1_500_000u64);

        candles.push(Candle {
            time: first_day + d * SECONDS_PER_DAY,
            open: round2(open).max(MIN_PRICE),
            high: round2(high),
            low: round2(low),
            close: round2(close).max(MIN_PRICE),
            volume,
        });

        price = close;
    }

    candles
}

/// Convenience wrapper using the thread RNG and the current time.
pub fn generate_mock_history(symbol: &str, days: usize) -> Vec<Candle> {
    let mut rng = rand::rng();
    generate_history(&mut rng, symbol, chrono::Utc::now().timestamp(), days)
}
