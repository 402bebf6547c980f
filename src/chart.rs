// =============================================================================
// Chart payload — candles plus indicator overlays for one symbol
// =============================================================================
//
// The renderer receives overlays keyed by name and color, each tagged with
// the pane it belongs on. An overlay with no points is still listed so the
// client can show "not enough history" instead of silently omitting it.
// =============================================================================

use serde::Serialize;

use crate::indicators::{IndicatorParams, IndicatorSet, IndicatorSummary};
use crate::types::{Candle, IndicatorSeries};

pub const SMA_COLOR: &str = "#2962FF";
pub const RSI_COLOR: &str = "#9C27B0";
pub const MACD_COLOR: &str = "#FF6D00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    /// Drawn over the candles.
    Price,
    /// Drawn in its own panel below the candles.
    Oscillator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub name: String,
    pub color: &'static str,
    pub pane: Pane,
    pub points: IndicatorSeries,
}

/// Everything the chart view needs for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub overlays: Vec<Overlay>,
    pub summary: IndicatorSummary,
}

impl ChartView {
    /// Derive the overlays for `candles`. Called again whenever the symbol or
    /// its candle series changes.
    pub fn build(symbol: impl Into<String>, candles: Vec<Candle>, params: IndicatorParams) -> Self {
        let set = IndicatorSet::compute(&candles, params);
        let summary = set.summary();

        let overlays = vec![
            Overlay {
                name: format!("SMA({})", params.sma_period),
                color: SMA_COLOR,
                pane: Pane::Price,
                points: set.sma,
            },
            Overlay {
                name: format!("RSI({})", params.rsi_period),
                color: RSI_COLOR,
                pane: Pane::Oscillator,
                points: set.rsi,
            },
            Overlay {
                name: "MACD(12,26)".to_string(),
                color: MACD_COLOR,
                pane: Pane::Oscillator,
                points: set.macd,
            },
        ];

        Self {
            symbol: symbol.into(),
            candles,
            overlays,
            summary,
        }
    }

    pub fn overlay(&self, prefix: &str) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.name.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::candles_from_closes;

    #[test]
    fn build_lists_all_three_overlays() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let view = ChartView::build("AAPL", candles_from_closes(&closes), IndicatorParams::default());

        assert_eq!(view.overlays.len(), 3);
        let sma = view.overlay("SMA").unwrap();
        assert_eq!(sma.name, "SMA(20)");
        assert_eq!(sma.color, SMA_COLOR);
        assert_eq!(sma.pane, Pane::Price);
        assert_eq!(sma.points.len(), 41);

        assert_eq!(view.overlay("RSI").unwrap().points.len(), 46);
        assert_eq!(view.overlay("MACD").unwrap().points.len(), 35);
        assert_eq!(view.summary.macd, Some(7.0));
    }

    #[test]
    fn short_history_keeps_empty_overlays() {
        let view = ChartView::build("TSLA", candles_from_closes(&[1.0, 2.0, 3.0]), IndicatorParams::default());
        assert_eq!(view.overlays.len(), 3);
        assert!(view.overlays.iter().all(|o| o.points.is_empty()));
        assert_eq!(view.candles.len(), 3);
    }

    #[test]
    fn custom_periods_flow_into_names() {
        let params = IndicatorParams {
            sma_period: 5,
            rsi_period: 7,
        };
        let closes: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let view = ChartView::build("MSFT", candles_from_closes(&closes), params);
        assert_eq!(view.overlay("SMA").unwrap().name, "SMA(5)");
        assert_eq!(view.overlay("SMA").unwrap().points.len(), 6);
        assert_eq!(view.overlay("RSI").unwrap().name, "RSI(7)");
        assert_eq!(view.overlay("RSI").unwrap().points.len(), 3);
    }

    #[test]
    fn serialises_pane_lowercase() {
        let view = ChartView::build("AAPL", candles_from_closes(&[1.0; 30]), IndicatorParams::default());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["overlays"][0]["pane"], "price");
        assert_eq!(json["overlays"][2]["pane"], "oscillator");
        assert_eq!(json["overlays"][2]["color"], MACD_COLOR);
    }
}
