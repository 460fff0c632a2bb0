//! Spread metrics calculation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::GroupingTick;

/// Spread summary shown in the spread row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadMetrics {
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,

    /// Best ask minus best bid
    pub spread: Option<Decimal>,

    /// Spread as a percentage of the mid price
    pub spread_percent: Option<Decimal>,

    /// Average of best bid and best ask
    pub mid_price: Option<Decimal>,
}

impl SpreadMetrics {
    pub fn from_best(best_bid: Option<Decimal>, best_ask: Option<Decimal>) -> Self {
        let (spread, mid_price) = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => (ask.checked_sub(bid), midpoint(bid, ask)),
            _ => (None, None),
        };
        let spread_percent = match (spread, mid_price) {
            (Some(spread), Some(mid)) if mid > Decimal::ZERO => spread
                .checked_div(mid)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED)),
            _ => None,
        };

        Self {
            best_bid,
            best_ask,
            spread,
            spread_percent,
            mid_price,
        }
    }

    /// Both sides present and not crossed
    pub fn is_healthy(&self) -> bool {
        matches!(self.spread, Some(spread) if spread > Decimal::ZERO)
    }

    /// Mid price as displayed under grouping
    ///
    /// Rounded half-up to the grouping tick from the best grouped prices. When
    /// that lands on either best price, precision is raised by one digit so the
    /// mid still reads as being between them.
    pub fn grouped_mid_price(
        best_grouped_bid: Option<Decimal>,
        best_grouped_ask: Option<Decimal>,
        tick: &GroupingTick,
    ) -> Option<Decimal> {
        let (bid, ask) = (best_grouped_bid?, best_grouped_ask?);
        let mid = midpoint(bid, ask)?;
        let rounded = tick.round(mid)?;

        if rounded == bid || rounded == ask {
            let finer = GroupingTick::new(tick.tick_size / Decimal::TEN).ok()?;
            finer.round(mid)
        } else {
            Some(rounded)
        }
    }
}

/// Halfway between `a` and `b` without overflowing on large prices
fn midpoint(a: Decimal, b: Decimal) -> Option<Decimal> {
    let half_gap = b.checked_sub(a)?.checked_div(Decimal::TWO)?;
    a.checked_add(half_gap)
}
