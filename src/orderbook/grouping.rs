//! Grouping tick ladder
//!
//! A market's allowed grouping resolutions are its native tick size times an
//! ascending list of multipliers. The finest entry is selected whenever the
//! market changes.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Side;
use crate::error::{OrderbookError, Result};

/// Multipliers applied to the market tick size when no configuration is given
pub const DEFAULT_GROUPING_MULTIPLIERS: [u32; 8] = [1, 2, 5, 10, 20, 50, 100, 1000];

/// One rung of the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingTick {
    pub tick_size: Decimal,
    /// Fraction digits needed to print a multiple of `tick_size`
    pub decimals: u32,
}

impl GroupingTick {
    pub fn new(tick_size: Decimal) -> Result<Self> {
        if tick_size <= Decimal::ZERO {
            return Err(OrderbookError::InvalidTickSize(tick_size.to_string()));
        }
        let tick_size = tick_size.normalize();
        Ok(Self {
            tick_size,
            decimals: tick_size.scale(),
        })
    }

    /// Bucket price for a level on `side`
    ///
    /// Bids round down and asks round up so no bucket straddles the spread.
    /// `None` if the bucket is not representable.
    pub fn bucket(&self, side: Side, price: Decimal) -> Option<Decimal> {
        let ticks = price.checked_div(self.tick_size)?;
        let ticks = match side {
            Side::Bid => ticks.floor(),
            Side::Ask => ticks.ceil(),
        };
        ticks.checked_mul(self.tick_size)
    }

    /// Round half-up to a multiple of this tick
    pub fn round(&self, price: Decimal) -> Option<Decimal> {
        let ticks = price
            .checked_div(self.tick_size)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        ticks.checked_mul(self.tick_size)
    }

    /// Render a price with exactly `decimals` fraction digits
    pub fn format(&self, price: Decimal) -> String {
        format_fixed(price, self.decimals)
    }
}

/// Fixed-point rendering that never falls back to scientific notation
pub fn format_fixed(value: Decimal, decimals: u32) -> String {
    let mut value = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(decimals);
    value.to_string()
}

/// Ordered grouping resolutions for the current market
#[derive(Debug, Clone)]
pub struct GroupingLadder {
    market_tick: GroupingTick,
    multipliers: Vec<u32>,
    ticks: Vec<GroupingTick>,
    index: usize,
}

impl GroupingLadder {
    /// Build a ladder from the market tick size and a list of multipliers
    pub fn new(market_tick_size: Decimal, multipliers: &[u32]) -> Result<Self> {
        let mut multipliers: Vec<u32> = multipliers.to_vec();
        multipliers.sort_unstable();
        multipliers.dedup();

        if multipliers.is_empty() || multipliers[0] == 0 {
            return Err(OrderbookError::ConfigError(
                "grouping multipliers must be non-empty and positive".to_string(),
            ));
        }

        let market_tick = GroupingTick::new(market_tick_size)?;
        let ticks = Self::build(&market_tick, &multipliers)?;

        Ok(Self {
            market_tick,
            multipliers,
            ticks,
            index: 0,
        })
    }

    fn build(market_tick: &GroupingTick, multipliers: &[u32]) -> Result<Vec<GroupingTick>> {
        multipliers
            .iter()
            .map(|m| {
                let tick_size = market_tick
                    .tick_size
                    .checked_mul(Decimal::from(*m))
                    .ok_or_else(|| {
                        OrderbookError::InvalidTickSize(format!("{} x {m}", market_tick.tick_size))
                    })?;
                GroupingTick::new(tick_size)
            })
            .collect()
    }

    /// Rebuild for a new market and select its finest tick
    pub fn reset_for_market(&mut self, market_tick_size: Decimal) -> Result<()> {
        let market_tick = GroupingTick::new(market_tick_size)?;
        self.ticks = Self::build(&market_tick, &self.multipliers)?;
        self.market_tick = market_tick;
        self.index = 0;
        debug!(tick_size = %market_tick.tick_size, "Grouping ladder reset");
        Ok(())
    }

    /// The active grouping tick
    pub fn current(&self) -> GroupingTick {
        self.ticks[self.index]
    }

    /// The market's own tick size, used for limit price formatting
    pub fn market_tick(&self) -> GroupingTick {
        self.market_tick
    }

    pub fn multiplier(&self) -> u32 {
        self.multipliers[self.index]
    }

    pub fn ticks(&self) -> &[GroupingTick] {
        &self.ticks
    }

    pub fn can_increase(&self) -> bool {
        self.index + 1 < self.ticks.len()
    }

    pub fn can_decrease(&self) -> bool {
        self.index > 0
    }

    /// Step to the next coarser tick; clamps at the coarsest
    ///
    /// Returns true if the tick changed.
    pub fn increase(&mut self) -> bool {
        if !self.can_increase() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Step to the next finer tick; clamps at the finest
    pub fn decrease(&mut self) -> bool {
        if !self.can_decrease() {
            return false;
        }
        self.index -= 1;
        true
    }
}
