//! Order book module
//!
//! Turns raw feed snapshots into grouped, sliced rows ready for display.

mod aggregator;
mod book;
mod grouping;
mod histogram;
mod metrics;
mod slicer;

pub use aggregator::{aggregate, validate_side};
pub use book::BookAggregator;
pub use grouping::{format_fixed, GroupingLadder, GroupingTick, DEFAULT_GROUPING_MULTIPLIERS};
pub use histogram::{HistogramRange, HistogramScale};
pub use metrics::SpreadMetrics;
pub use slicer::{slice_rows, Layout};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{OrderbookError, Result};

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// True if `next` lies further from the spread than `prev` on this side
    pub fn is_worse(self, prev: Decimal, next: Decimal) -> bool {
        match self {
            Side::Bid => next < prev,
            Side::Ask => next > prev,
        }
    }
}

/// A single raw level as received from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
    pub side: Side,
    /// Feed offset that last touched this level, used when uncrossing
    #[serde(default)]
    pub offset: u64,
}

impl PriceLevel {
    pub fn new(side: Side, price: Decimal, size: Decimal) -> Self {
        Self {
            price,
            size,
            side,
            offset: 0,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Build a level from floating point feed values, rejecting NaN and infinities
    pub fn try_from_f64(side: Side, price: f64, size: f64) -> Result<Self> {
        let price = Decimal::try_from(price)
            .map_err(|e| OrderbookError::InvalidLevel(format!("price {price}: {e}")))?;
        let size = Decimal::try_from(size)
            .map_err(|e| OrderbookError::InvalidLevel(format!("size {size}: {e}")))?;
        Ok(Self::new(side, price, size))
    }

    /// Notional value of the level, `None` if it overflows
    pub fn cost(&self) -> Option<Decimal> {
        self.price.checked_mul(self.size)
    }
}

/// One display bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedLevel {
    /// Bucket price, a multiple of the active tick size
    pub price: Decimal,
    /// Size resting inside this bucket
    pub size: Decimal,
    pub size_cost: Decimal,
    /// Depth: size at this bucket or better
    pub cumulative_size: Decimal,
    pub cumulative_cost: Decimal,
}

/// Full book as delivered by the feed
///
/// Shared behind an `Arc` and never mutated once published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    pub sequence: u64,
    /// Bids sorted by price descending (highest first)
    pub bids: Vec<PriceLevel>,
    /// Asks sorted by price ascending (lowest first)
    pub asks: Vec<PriceLevel>,
}

impl OrderbookSnapshot {
    pub fn levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }
}
