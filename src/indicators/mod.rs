// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free transformations of an ordered candle series into
// indicator series. Insufficient history never errors: the affected series is
// simply empty so the chart can skip drawing it. Every emitted value is
// rounded to two decimals at production time.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};

use crate::types::{Candle, IndicatorSeries};

pub use macd::compute_macd;
pub use rsi::compute_rsi;
pub use sma::compute_sma;

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn default_sma_period() -> usize {
    20
}

fn default_rsi_period() -> usize {
    14
}

/// Look-back periods for the configurable indicators. MACD is fixed 12/26.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_sma_period")]
    pub sma_period: usize,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_period: default_sma_period(),
            rsi_period: default_rsi_period(),
        }
    }
}

/// Every series the dashboard draws for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub sma: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub macd: IndicatorSeries,
}

/// Most-recent values shown next to the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<&'static str>,
    pub macd: Option<f64>,
}

impl IndicatorSet {
    /// Compute the full set for `series`.
    pub fn compute(series: &[Candle], params: IndicatorParams) -> Self {
        Self {
            sma: compute_sma(series, params.sma_period),
            rsi: compute_rsi(series, params.rsi_period),
            macd: compute_macd(series),
        }
    }

    pub fn summary(&self) -> IndicatorSummary {
        let rsi = self.rsi.last().map(|p| p.value);
        IndicatorSummary {
            sma: self.sma.last().map(|p| p.value),
            rsi,
            rsi_zone: rsi.map(rsi::zone_label),
            macd: self.macd.last().map(|p| p.value),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::candles_from_closes;
    use super::*;

    #[test]
    fn round2_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(-2.5), -2.5);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(3.14159), 3.14);
    }

    #[test]
    fn compute_all_is_deterministic() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 7.3 + i as f64 * 0.11)
            .collect();
        let series = candles_from_closes(&closes);
        let before = series.clone();

        let a = IndicatorSet::compute(&series, IndicatorParams::default());
        let b = IndicatorSet::compute(&series, IndicatorParams::default());

        assert_eq!(a, b);
        for (x, y) in a.macd.iter().zip(b.macd.iter()) {
            assert_eq!(x.value.to_bits(), y.value.to_bits());
        }
        assert_eq!(series, before);
    }

    #[test]
    fn outputs_never_look_ahead() {
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i % 7) as f64).collect();
        let series = candles_from_closes(&closes);
        let set = IndicatorSet::compute(&series, IndicatorParams::default());

        let first_allowed = |period: usize| series[period - 1].time;
        assert!(set.sma.iter().all(|p| p.time >= first_allowed(20)));
        assert!(set.rsi.iter().all(|p| p.time >= series[14].time));
        assert!(set.macd.iter().all(|p| p.time >= first_allowed(26)));
        for s in [&set.sma, &set.rsi, &set.macd] {
            assert!(s.iter().all(|p| series.iter().any(|c| c.time == p.time)));
        }
    }

    #[test]
    fn summary_uses_last_points() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let set = IndicatorSet::compute(&candles_from_closes(&closes), IndicatorParams::default());
        let summary = set.summary();

        assert_eq!(summary.sma, set.sma.last().map(|p| p.value));
        assert_eq!(summary.rsi, Some(100.0));
        assert_eq!(summary.rsi_zone, Some("OVERBOUGHT"));
        assert_eq!(summary.macd, Some(7.0));
    }

    #[test]
    fn summary_empty_when_history_too_short() {
        let set = IndicatorSet::compute(&candles_from_closes(&[1.0, 2.0]), IndicatorParams::default());
        let summary = set.summary();
        assert_eq!(summary.sma, None);
        assert_eq!(summary.rsi, None);
        assert_eq!(summary.rsi_zone, None);
        assert_eq!(summary.macd, None);
    }

    #[test]
    fn params_default_from_empty_json() {
        let p: IndicatorParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p, IndicatorParams::default());
        assert_eq!(p.sma_period, 20);
        assert_eq!(p.rsi_period, 14);
    }
}
