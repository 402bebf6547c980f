// =============================================================================
// Moving Average Convergence Divergence (MACD line)
// =============================================================================
//
//   MACD_t = EMA12_t - EMA26_t
//
// The two EMA accumulators start at different candle indices (11 and 25), so
// each is indexed by its own warm-up offset, never by the raw candle index.
// =============================================================================

use super::ema::compute_ema;
use super::round2;
use crate::types::{Candle, IndicatorPoint, IndicatorSeries};

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;

/// Compute the MACD line for `series`.
///
/// Returns an empty series with fewer than 26 candles; otherwise one point per
/// candle from index 25, stamped with that candle's time.
pub fn compute_macd(series: &[Candle]) -> IndicatorSeries {
    if series.len() < SLOW_PERIOD {
        return Vec::new();
    }

    let fast = compute_ema(series, FAST_PERIOD);
    let slow = compute_ema(series, SLOW_PERIOD);

    let fast_offset = FAST_PERIOD - 1;
    let slow_offset = SLOW_PERIOD - 1;

    (slow_offset..series.len())
        .filter_map(|i| {
            let f = fast.get(i - fast_offset)?;
            let s = slow.get(i - slow_offset)?;
            Some(IndicatorPoint {
                time: series[i].time,
                value: round2(f - s),
            })
        })
        .collect()
}
