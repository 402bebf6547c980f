// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices than the SMA does.
//
// Formula:
//   k     = 2 / (period + 1)
//   EMA_t = close_t * k + EMA_{t-1} * (1 - k)
//
// The first value is seeded with the SMA of the first `period` closes.
//
// This is an accumulator for MACD only: values are NOT rounded and carry no
// timestamps. Element `j` of the result belongs to candle `j + period - 1`.
// =============================================================================

use crate::types::Candle;

/// Compute the raw EMA accumulator over `series` closes.
///
/// Returns an empty `Vec` when `period == 0` or the series is shorter than
/// `period`. Otherwise the result has `series.len() - period + 1` elements and
/// the first one is the SMA seed.
pub(crate) fn compute_ema(series: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || series.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);

    let seed = series[..period].iter().map(|c| c.close).sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(series.len() - period + 1);
    result.push(seed);

    let mut prev = seed;
    for candle in &series[period..] {
        prev = candle.close * k + prev * (1.0 - k);
        result.push(prev);
    }

    result
}
