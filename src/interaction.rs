//! Row clicks and hovers
//!
//! Resolves a display row back to its price and, when the trade form is
//! editing a limit price, hands that price over.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::orderbook::{GroupedLevel, GroupingTick, Side};

/// Trade form field that currently has focus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeInputTarget {
    #[default]
    None,
    LimitPrice,
    TriggerPrice,
    Size,
}

/// The trade entry form, as seen from the order book
#[cfg_attr(test, mockall::automock)]
pub trait LimitPriceSink {
    fn set_limit_price(&mut self, price: &str);
}

/// Maps display rows to prices
#[derive(Debug, Clone, Copy)]
pub struct RowInteractionMapper {
    /// Market tick used to print limit prices
    market_tick: GroupingTick,
}

impl RowInteractionMapper {
    pub fn new(market_tick: GroupingTick) -> Self {
        Self { market_tick }
    }

    /// Price of display row `index`, `None` for placeholders
    pub fn price_at(rows: &[Option<GroupedLevel>], index: usize) -> Option<Decimal> {
        rows.get(index)?.as_ref().map(|row| row.price)
    }

    /// Hover text for a row
    pub fn hover(&self, rows: &[Option<GroupedLevel>], index: usize) -> Option<String> {
        Self::price_at(rows, index).map(|price| self.market_tick.format(price))
    }

    /// Handle a click on display row `index` of `side`
    ///
    /// Returns true if a limit price was sent.
    pub fn click(
        &self,
        side: Side,
        rows: &[Option<GroupedLevel>],
        index: usize,
        active_input: TradeInputTarget,
        sink: &mut dyn LimitPriceSink,
    ) -> bool {
        if active_input != TradeInputTarget::LimitPrice {
            return false;
        }
        let Some(price) = Self::price_at(rows, index) else {
            return false;
        };

        let formatted = self.market_tick.format(price);
        debug!(?side, index, price = %formatted, "Order book row selected as limit price");
        sink.set_limit_price(&formatted);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn rows() -> Vec<Option<GroupedLevel>> {
        vec![
            None,
            Some(GroupedLevel {
                price: dec!(100.12),
                size: dec!(5),
                size_cost: dec!(500.6),
                cumulative_size: dec!(5),
                cumulative_cost: dec!(500.6),
            }),
        ]
    }

    fn mapper() -> RowInteractionMapper {
        RowInteractionMapper::new(GroupingTick::new(dec!(0.01)).unwrap())
    }

    #[test]
    fn test_click_sets_limit_price_once() {
        let mut sink = MockLimitPriceSink::new();
        sink.expect_set_limit_price()
            .with(eq("100.12"))
            .times(1)
            .return_const(());

        assert!(mapper().click(Side::Ask, &rows(), 1, TradeInputTarget::LimitPrice, &mut sink));
    }

    #[test]
    fn test_click_ignored_for_other_inputs() {
        let mut sink = MockLimitPriceSink::new();
        sink.expect_set_limit_price().times(0);

        for target in [
            TradeInputTarget::None,
            TradeInputTarget::TriggerPrice,
            TradeInputTarget::Size,
        ] {
            assert!(!mapper().click(Side::Bid, &rows(), 1, target, &mut sink));
        }
    }

    #[test]
    fn test_placeholder_and_out_of_range_are_noops() {
        let mut sink = MockLimitPriceSink::new();
        sink.expect_set_limit_price().times(0);

        assert!(!mapper().click(Side::Bid, &rows(), 0, TradeInputTarget::LimitPrice, &mut sink));
        assert!(!mapper().click(Side::Bid, &rows(), 7, TradeInputTarget::LimitPrice, &mut sink));
    }

    #[test]
    fn test_hover_formats_to_market_tick() {
        let coarse = RowInteractionMapper::new(GroupingTick::new(dec!(0.001)).unwrap());
        assert_eq!(coarse.hover(&rows(), 1), Some("100.120".to_string()));
        assert_eq!(mapper().hover(&rows(), 0), None);
    }
}
