// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Price changes from consecutive closes, split into gains and losses.
// Step 2 — Seed average gain / average loss with the SMA of the first
//          `period` gains / losses.
// Step 3 — Wilder's smoothing for every later change:
//            avg = (avg * (period - 1) + sample) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// The first point (candle index `period`) uses the seeded averages directly.
// =============================================================================

use super::round2;
use crate::types::{Candle, IndicatorPoint, IndicatorSeries};

/// Zone thresholds used for the dashboard label.
pub const OVERBOUGHT: f64 = 70.0;
pub const OVERSOLD: f64 = 30.0;

/// Compute the RSI series for `series` and `period`.
///
/// The result has `len - period` points, the first stamped with
/// `series[period].time`.
///
/// # Edge cases
/// - `period == 0` or `len < period + 1` => empty series
/// - average loss zero with gains => 100.0
/// - average loss and average gain both zero (flat) => 50.0
pub fn compute_rsi(series: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || series.len() < period + 1 {
        return Vec::new();
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = series
        .windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            }
        })
        .unzip();

    let period_f = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / period_f;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period_f;

    let mut result = Vec::with_capacity(series.len() - period);
    result.push(IndicatorPoint {
        time: series[period].time,
        value: round2(rsi_from_averages(avg_gain, avg_loss)),
    });

    // Change `j` ends at candle `j + 1`.
    for j in period..gains.len() {
        avg_gain = (avg_gain * (period_f - 1.0) + gains[j]) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + losses[j]) / period_f;

        result.push(IndicatorPoint {
            time: series[j + 1].time,
            value: round2(rsi_from_averages(avg_gain, avg_loss)),
        });
    }

    result
}

/// Label for an RSI reading.
pub fn zone_label(rsi: f64) -> &'static str {
    if rsi >= OVERBOUGHT {
        "OVERBOUGHT"
    } else if rsi <= OVERSOLD {
        "OVERSOLD"
    } else {
        "NEUTRAL"
    }
}

/// Convert averages into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}
