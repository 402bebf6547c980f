// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean of the closing price over a trailing window of `period`
// candles. No partial windows are ever emitted.
// =============================================================================

use super::round2;
use crate::types::{Candle, IndicatorPoint, IndicatorSeries};

/// Compute the SMA series for `series` and `period`.
///
/// One point per index `i` in `period - 1 ..= len - 1`, stamped with
/// `series[i].time`. Returns an empty series when `period == 0` or the input
/// is shorter than `period`.
pub fn compute_sma(series: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || series.len() < period {
        return Vec::new();
    }

    series
        .windows(period)
        .map(|window| {
            let sum: f64 = window.iter().map(|c| c.close).sum();
            IndicatorPoint {
                time: window[period - 1].time,
                value: round2(sum / period as f64),
            }
        })
        .collect()
}
