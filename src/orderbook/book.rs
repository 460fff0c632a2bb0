//! Last-known-good book state
//!
//! Each side keeps the most recent snapshot that validated for it, so a bad
//! side in one update never blanks the view or drags the other side back.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use super::{
    aggregate, validate_side, GroupedLevel, GroupingTick, OrderbookSnapshot, PriceLevel, Side,
    SpreadMetrics,
};
use crate::telemetry;

/// Which sides of an incoming snapshot were taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestOutcome {
    pub bids_accepted: bool,
    pub asks_accepted: bool,
    pub stale: bool,
}

impl IngestOutcome {
    pub fn changed(&self) -> bool {
        self.bids_accepted || self.asks_accepted
    }
}

/// Aggregated order book for the current market
#[derive(Debug)]
pub struct BookAggregator {
    /// Row budget per side
    max_rows: usize,
    /// Snapshot whose bid side is current
    bid_source: Option<Arc<OrderbookSnapshot>>,
    /// Snapshot whose ask side is current
    ask_source: Option<Arc<OrderbookSnapshot>>,
    /// Levels dropped from the front of each side to uncross the book
    bid_skip: usize,
    ask_skip: usize,
    grouped_bids: Vec<GroupedLevel>,
    grouped_asks: Vec<GroupedLevel>,
    last_sequence: Option<u64>,
}

impl BookAggregator {
    pub fn new(max_rows: usize) -> Self {
        Self {
            max_rows,
            bid_source: None,
            ask_source: None,
            bid_skip: 0,
            ask_skip: 0,
            grouped_bids: Vec::new(),
            grouped_asks: Vec::new(),
            last_sequence: None,
        }
    }

    /// Forget everything, e.g. on market change
    pub fn reset(&mut self) {
        *self = Self::new(self.max_rows);
    }

    pub fn set_max_rows(&mut self, max_rows: usize, tick: &GroupingTick) {
        self.max_rows = max_rows;
        self.regroup(tick);
    }

    /// Take a new snapshot, validating each side independently
    pub fn ingest(&mut self, snapshot: Arc<OrderbookSnapshot>, tick: &GroupingTick) -> IngestOutcome {
        if let Some(last) = self.last_sequence {
            if snapshot.sequence < last {
                trace!(sequence = snapshot.sequence, last, "Skipping stale snapshot");
                return IngestOutcome {
                    stale: true,
                    ..Default::default()
                };
            }
        }

        let mut outcome = IngestOutcome::default();

        match validate_side(&snapshot.bids, Side::Bid, tick) {
            Ok(()) => {
                self.bid_source = Some(snapshot.clone());
                outcome.bids_accepted = true;
            }
            Err(e) => {
                warn!(sequence = snapshot.sequence, error = %e, "Rejected bid side, keeping last good bids");
                telemetry::side_rejected(Side::Bid);
            }
        }

        match validate_side(&snapshot.asks, Side::Ask, tick) {
            Ok(()) => {
                self.ask_source = Some(snapshot.clone());
                outcome.asks_accepted = true;
            }
            Err(e) => {
                warn!(sequence = snapshot.sequence, error = %e, "Rejected ask side, keeping last good asks");
                telemetry::side_rejected(Side::Ask);
            }
        }

        if outcome.changed() {
            self.last_sequence = Some(snapshot.sequence);
            self.regroup(tick);
        }

        outcome
    }

    /// Recompute grouped levels under `tick`
    pub fn regroup(&mut self, tick: &GroupingTick) {
        (self.bid_skip, self.ask_skip) = uncross(self.raw(Side::Bid), self.raw(Side::Ask));

        for side in [Side::Bid, Side::Ask] {
            match aggregate(self.levels(side), side, tick, self.max_rows) {
                Ok(grouped) => match side {
                    Side::Bid => self.grouped_bids = grouped,
                    Side::Ask => self.grouped_asks = grouped,
                },
                Err(e) => {
                    warn!(?side, tick_size = %tick.tick_size, error = %e, "Cannot regroup side, keeping last grouping");
                    telemetry::side_rejected(side);
                }
            }
        }

        debug!(
            tick_size = %tick.tick_size,
            bid_rows = self.grouped_bids.len(),
            ask_rows = self.grouped_asks.len(),
            bid_skip = self.bid_skip,
            ask_skip = self.ask_skip,
            "Regrouped order book"
        );
    }

    /// True once any side has ever validated
    pub fn has_orderbook(&self) -> bool {
        self.bid_source.is_some() || self.ask_source.is_some()
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    pub fn grouped(&self, side: Side) -> &[GroupedLevel] {
        match side {
            Side::Bid => &self.grouped_bids,
            Side::Ask => &self.grouped_asks,
        }
    }

    fn raw(&self, side: Side) -> &[PriceLevel] {
        let source = match side {
            Side::Bid => &self.bid_source,
            Side::Ask => &self.ask_source,
        };
        source.as_deref().map(|s| s.levels(side)).unwrap_or(&[])
    }

    /// Uncrossed raw levels for a side, best first
    pub fn levels(&self, side: Side) -> &[PriceLevel] {
        let (raw, skip) = match side {
            Side::Bid => (self.raw(Side::Bid), self.bid_skip),
            Side::Ask => (self.raw(Side::Ask), self.ask_skip),
        };
        raw.get(skip..).unwrap_or(&[])
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        best(self.levels(Side::Bid))
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        best(self.levels(Side::Ask))
    }

    pub fn spread_metrics(&self) -> SpreadMetrics {
        SpreadMetrics::from_best(self.best_bid(), self.best_ask())
    }
}

fn best(levels: &[PriceLevel]) -> Option<Decimal> {
    levels.iter().find(|l| !l.size.is_zero()).map(|l| l.price)
}

/// Count how many levels to drop from the front of each side until the best
/// ask is above the best bid
///
/// With equal offsets the larger size wins (ties keep the ask); otherwise
/// the level touched by the older offset is dropped.
fn uncross(bids: &[PriceLevel], asks: &[PriceLevel]) -> (usize, usize) {
    let (mut b, mut a) = (0, 0);

    loop {
        // Zero sizes are removals, they never cross
        while bids.get(b).is_some_and(|l| l.size.is_zero()) {
            b += 1;
        }
        while asks.get(a).is_some_and(|l| l.size.is_zero()) {
            a += 1;
        }

        let (Some(bid), Some(ask)) = (bids.get(b), asks.get(a)) else {
            break;
        };
        if ask.price > bid.price {
            break;
        }

        let drop_bid = if ask.offset == bid.offset {
            ask.size >= bid.size
        } else {
            bid.offset < ask.offset
        };

        if drop_bid {
            b += 1;
        } else {
            a += 1;
        }
    }

    (b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(side: Side, price: Decimal, size: Decimal) -> PriceLevel {
        PriceLevel::new(side, price, size)
    }

    fn create_test_snapshot(sequence: u64) -> OrderbookSnapshot {
        OrderbookSnapshot {
            sequence,
            bids: vec![
                level(Side::Bid, dec!(50000), dec!(1.0)),
                level(Side::Bid, dec!(49999), dec!(2.0)),
            ],
            asks: vec![
                level(Side::Ask, dec!(50001), dec!(1.5)),
                level(Side::Ask, dec!(50002), dec!(2.5)),
            ],
        }
    }

    fn unit_tick() -> GroupingTick {
        GroupingTick::new(dec!(1)).unwrap()
    }

    #[test]
    fn test_best_bid_ask() {
        let mut book = BookAggregator::new(10);
        assert!(!book.has_orderbook());

        let outcome = book.ingest(Arc::new(create_test_snapshot(1)), &unit_tick());
        assert!(outcome.bids_accepted && outcome.asks_accepted);
        assert!(book.has_orderbook());
        assert_eq!(book.best_bid(), Some(dec!(50000)));
        assert_eq!(book.best_ask(), Some(dec!(50001)));
        assert_eq!(book.spread_metrics().mid_price, Some(dec!(50000.5)));
        assert_eq!(book.grouped(Side::Bid).len(), 2);
    }

    #[test]
    fn test_malformed_side_keeps_last_good() {
        let mut book = BookAggregator::new(10);
        book.ingest(Arc::new(create_test_snapshot(1)), &unit_tick());

        let mut bad = create_test_snapshot(2);
        bad.bids = vec![
            level(Side::Bid, dec!(49990), dec!(1)),
            level(Side::Bid, dec!(49995), dec!(1)),
        ];
        bad.asks = vec![level(Side::Ask, dec!(50010), dec!(4))];

        let outcome = book.ingest(Arc::new(bad), &unit_tick());
        assert!(!outcome.bids_accepted);
        assert!(outcome.asks_accepted);
        assert_eq!(book.best_bid(), Some(dec!(50000)));
        assert_eq!(book.best_ask(), Some(dec!(50010)));
        assert_eq!(book.last_sequence(), Some(2));
    }

    #[test]
    fn test_stale_snapshot_ignored() {
        let mut book = BookAggregator::new(10);
        book.ingest(Arc::new(create_test_snapshot(5)), &unit_tick());

        let mut older = create_test_snapshot(4);
        older.asks = vec![level(Side::Ask, dec!(60000), dec!(1))];
        let outcome = book.ingest(Arc::new(older), &unit_tick());

        assert!(outcome.stale);
        assert_eq!(book.best_ask(), Some(dec!(50001)));
    }

    #[test]
    fn test_fully_malformed_first_snapshot_leaves_no_book() {
        let mut book = BookAggregator::new(10);
        let bad = OrderbookSnapshot {
            sequence: 1,
            bids: vec![level(Side::Bid, dec!(1), dec!(-1))],
            asks: vec![level(Side::Ask, dec!(-1), dec!(1))],
        };
        let outcome = book.ingest(Arc::new(bad), &unit_tick());

        assert!(!outcome.changed());
        assert!(!book.has_orderbook());
        assert_eq!(book.last_sequence(), None);
    }

    #[test]
    fn test_uncross_drops_older_offset() {
        let bids = vec![
            level(Side::Bid, dec!(101), dec!(1)).with_offset(5),
            level(Side::Bid, dec!(99), dec!(1)).with_offset(6),
        ];
        let asks = vec![
            level(Side::Ask, dec!(100), dec!(1)).with_offset(7),
            level(Side::Ask, dec!(102), dec!(1)).with_offset(7),
        ];
        assert_eq!(uncross(&bids, &asks), (1, 0));
    }

    #[test]
    fn test_uncross_equal_offsets_keeps_larger() {
        let bids = vec![level(Side::Bid, dec!(100), dec!(3))];
        let asks = vec![
            level(Side::Ask, dec!(100), dec!(1)),
            level(Side::Ask, dec!(101), dec!(1)),
        ];
        assert_eq!(uncross(&bids, &asks), (0, 1));

        let mut book = BookAggregator::new(10);
        book.ingest(
            Arc::new(OrderbookSnapshot {
                sequence: 1,
                bids,
                asks,
            }),
            &unit_tick(),
        );
        assert_eq!(book.best_ask(), Some(dec!(101)));
        assert_eq!(book.grouped(Side::Ask).len(), 1);
    }

    #[test]
    fn test_regroup_on_tick_change() {
        let mut book = BookAggregator::new(10);
        book.ingest(Arc::new(create_test_snapshot(1)), &unit_tick());
        assert_eq!(book.grouped(Side::Ask).len(), 2);

        book.regroup(&GroupingTick::new(dec!(10)).unwrap());
        assert_eq!(book.grouped(Side::Ask).len(), 1);
        assert_eq!(book.grouped(Side::Ask)[0].price, dec!(50010));
        assert_eq!(book.grouped(Side::Bid)[0].price, dec!(50000));
        assert_eq!(book.grouped(Side::Bid)[1].price, dec!(49990));
    }

    #[test]
    fn test_unrepresentable_side_keeps_last_good() {
        let mut book = BookAggregator::new(10);
        let cent = GroupingTick::new(dec!(0.01)).unwrap();
        book.ingest(Arc::new(create_test_snapshot(1)), &cent);

        let mut huge = create_test_snapshot(2);
        huge.bids = vec![level(Side::Bid, Decimal::MAX, dec!(1))];
        huge.asks = vec![
            level(Side::Ask, dec!(100000000000000000000), dec!(10000000000)),
        ];
        let outcome = book.ingest(Arc::new(huge), &cent);

        assert!(!outcome.changed());
        assert_eq!(book.best_bid(), Some(dec!(50000)));
        assert_eq!(book.best_ask(), Some(dec!(50001)));
        assert_eq!(book.grouped(Side::Bid)[0].price, dec!(50000));
    }

    #[test]
    fn test_regroup_overflow_keeps_previous_rows() {
        let mut book = BookAggregator::new(10);
        let snapshot = OrderbookSnapshot {
            sequence: 1,
            bids: vec![level(Side::Bid, dec!(5), dec!(1))],
            asks: vec![level(Side::Ask, Decimal::MAX, dec!(1))],
        };
        let outcome = book.ingest(Arc::new(snapshot), &unit_tick());
        assert!(outcome.bids_accepted && outcome.asks_accepted);

        // the ask bucket rounds up past the representable range at tick 10
        book.regroup(&GroupingTick::new(dec!(10)).unwrap());
        assert_eq!(book.grouped(Side::Ask)[0].price, Decimal::MAX);
        assert_eq!(book.grouped(Side::Bid)[0].price, dec!(0));
    }
}
