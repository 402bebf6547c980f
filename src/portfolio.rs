// =============================================================================
// Portfolio valuation
// =============================================================================
//
// A holding is marked at the latest streamed price for its symbol when one is
// known, otherwise at its purchase price (zero gain). Totals are plain sums;
// the total percentage is relative to total cost.
// =============================================================================

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{Holding, PriceUpdate};

/// One holding with its mark-to-market figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuedHolding {
    #[serde(flatten)]
    pub holding: Holding,
    pub current_price: f64,
    /// True when `current_price` came from a price tick.
    pub is_live: bool,
    pub market_value: f64,
    pub gain_loss: f64,
    pub gain_loss_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub holdings: Vec<ValuedHolding>,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_pct: f64,
}

pub fn value_holding(holding: &Holding, latest: Option<&PriceUpdate>) -> ValuedHolding {
    let (current_price, is_live) = match latest {
        Some(update) => (update.price, true),
        None => (holding.purchase_price, false),
    };

    let gain_loss = (current_price - holding.purchase_price) * holding.quantity;
    let gain_loss_pct = if holding.purchase_price > 0.0 {
        (current_price - holding.purchase_price) / holding.purchase_price * 100.0
    } else {
        0.0
    };

    ValuedHolding {
        holding: holding.clone(),
        current_price,
        is_live,
        market_value: current_price * holding.quantity,
        gain_loss,
        gain_loss_pct,
    }
}

pub fn summarize(holdings: &[Holding], prices: &HashMap<String, PriceUpdate>) -> PortfolioSummary {
    let valued: Vec<ValuedHolding> = holdings
        .iter()
        .map(|h| value_holding(h, prices.get(&h.symbol)))
        .collect();

    let total_value: f64 = valued.iter().map(|v| v.market_value).sum();
    let total_cost: f64 = holdings.iter().map(|h| h.purchase_price * h.quantity).sum();
    let total_gain_loss = total_value - total_cost;
    let total_gain_loss_pct = if total_cost > 0.0 {
        total_gain_loss / total_cost * 100.0
    } else {
        0.0
    };

    PortfolioSummary {
        holdings: valued,
        total_value,
        total_cost,
        total_gain_loss,
        total_gain_loss_pct,
    }
}
