//! Level aggregation
//!
//! Buckets one side of the book into grouped levels. Input is walked from the
//! best price outward and work stops once the row budget is full, so the cost
//! of an update follows the number of displayed rows rather than book depth.

use rust_decimal::Decimal;

use super::{GroupedLevel, GroupingTick, PriceLevel, Side};
use crate::error::{OrderbookError, Result};

/// Check that a side is well formed
///
/// Prices must be positive and strictly moving away from the spread, sizes
/// must not be negative. Zero sizes are allowed and skipped by [`aggregate`].
/// Every bucket under `tick`, every level cost and the side's total size and
/// cost must be representable, so aggregating any run of the side succeeds.
pub fn validate_side(levels: &[PriceLevel], side: Side, tick: &GroupingTick) -> Result<()> {
    let mut prev: Option<Decimal> = None;
    let mut total_size = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;

    for (index, level) in levels.iter().enumerate() {
        if level.side != side {
            return Err(OrderbookError::malformed(side, index, "level tagged with the wrong side"));
        }
        if level.price <= Decimal::ZERO {
            return Err(OrderbookError::malformed(
                side,
                index,
                format!("non-positive price {}", level.price),
            ));
        }
        if level.size < Decimal::ZERO {
            return Err(OrderbookError::malformed(
                side,
                index,
                format!("negative size {}", level.size),
            ));
        }
        if let Some(prev) = prev {
            if !side.is_worse(prev, level.price) {
                return Err(OrderbookError::malformed(
                    side,
                    index,
                    format!("price {} out of order after {}", level.price, prev),
                ));
            }
        }
        prev = Some(level.price);

        if tick.bucket(side, level.price).is_none() {
            return Err(overflow(side, index, "bucket price"));
        }
        let cost = level.cost().ok_or_else(|| overflow(side, index, "level cost"))?;
        total_size = total_size
            .checked_add(level.size)
            .ok_or_else(|| overflow(side, index, "cumulative size"))?;
        total_cost = total_cost
            .checked_add(cost)
            .ok_or_else(|| overflow(side, index, "cumulative cost"))?;
    }

    Ok(())
}

fn overflow(side: Side, index: usize, what: &str) -> OrderbookError {
    OrderbookError::malformed(side, index, format!("{what} overflows"))
}

/// Group `levels` (best first) into at most `max_rows` buckets of `tick`
///
/// Fails only on arithmetic overflow, which [`validate_side`] rules out for
/// the same tick.
pub fn aggregate(
    levels: &[PriceLevel],
    side: Side,
    tick: &GroupingTick,
    max_rows: usize,
) -> Result<Vec<GroupedLevel>> {
    let mut grouped: Vec<GroupedLevel> = Vec::with_capacity(max_rows.min(levels.len()));
    let mut cumulative_size = Decimal::ZERO;
    let mut cumulative_cost = Decimal::ZERO;

    for (index, level) in levels.iter().enumerate() {
        if level.size.is_zero() {
            continue;
        }

        let bucket = tick
            .bucket(side, level.price)
            .ok_or_else(|| overflow(side, index, "bucket price"))?;
        let same_bucket = matches!(grouped.last(), Some(last) if last.price == bucket);

        if !same_bucket {
            if grouped.len() == max_rows {
                break;
            }
            grouped.push(GroupedLevel {
                price: bucket,
                size: Decimal::ZERO,
                size_cost: Decimal::ZERO,
                cumulative_size,
                cumulative_cost,
            });
        }

        let cost = level.cost().ok_or_else(|| overflow(side, index, "level cost"))?;
        cumulative_size = cumulative_size
            .checked_add(level.size)
            .ok_or_else(|| overflow(side, index, "cumulative size"))?;
        cumulative_cost = cumulative_cost
            .checked_add(cost)
            .ok_or_else(|| overflow(side, index, "cumulative cost"))?;

        if let Some(last) = grouped.last_mut() {
            // bucket sums never exceed the running totals checked above
            last.size += level.size;
            last.size_cost += cost;
            last.cumulative_size = cumulative_size;
            last.cumulative_cost = cumulative_cost;
        }
    }

    Ok(grouped)
}
