//! Histogram scaling range

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{GroupedLevel, Side};

/// Largest depth on screen per side
///
/// Derived from the sliced rows only, so bar widths follow what is visible
/// rather than liquidity far below the fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramRange {
    pub max_bid_cumulative: Decimal,
    pub max_ask_cumulative: Decimal,
}

impl HistogramRange {
    pub fn from_rows(bids: &[Option<GroupedLevel>], asks: &[Option<GroupedLevel>]) -> Self {
        Self {
            max_bid_cumulative: max_cumulative(bids),
            max_ask_cumulative: max_cumulative(asks),
        }
    }

    pub fn for_side(&self, side: Side) -> Decimal {
        match side {
            Side::Bid => self.max_bid_cumulative,
            Side::Ask => self.max_ask_cumulative,
        }
    }

    /// One range for both sides so their bars are comparable
    pub fn shared(&self) -> Decimal {
        self.max_bid_cumulative.max(self.max_ask_cumulative)
    }

    /// Range a side's bars are scaled against
    pub fn scale_for(&self, side: Side, scale: HistogramScale) -> Decimal {
        match scale {
            HistogramScale::PerSide => self.for_side(side),
            HistogramScale::Shared => self.shared(),
        }
    }
}

/// Whether the two sides share one histogram range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramScale {
    #[default]
    PerSide,
    Shared,
}

fn max_cumulative(rows: &[Option<GroupedLevel>]) -> Decimal {
    rows.iter()
        .flatten()
        .map(|row| row.cumulative_size)
        .max()
        .unwrap_or(Decimal::ZERO)
}
