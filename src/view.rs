//! Order book view
//!
//! Owns the per-market pipeline: snapshot in, grouped and sliced rows out,
//! one canvas per side painted at most once per animation frame. Scroll and
//! pointer events come in from the host and never touch aggregation state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{OrderbookError, Result};
use crate::interaction::{LimitPriceSink, RowInteractionMapper, TradeInputTarget};
use crate::orderbook::{
    slice_rows, BookAggregator, GroupedLevel, GroupingLadder, GroupingTick, HistogramRange,
    HistogramScale, Layout, OrderbookSnapshot, Side, SpreadMetrics,
};
use crate::publisher::Subscription;
use crate::render::{
    CanvasGeometry, DisplayUnit, DrawTarget, FrameScheduler, HistogramSide, LabelFormat,
    RenderStyle, SideCanvas, SideFrame,
};
use crate::scroll::{ScrollCenterController, SpreadVisibility, SpreadVisibilityTracker, ViewportState};

/// Depth view for one market at a time
pub struct OrderbookView<T: DrawTarget> {
    market_id: String,
    layout: Layout,
    max_rows: usize,
    size_decimals: u32,
    display_unit: DisplayUnit,
    histogram_scale: HistogramScale,
    style: RenderStyle,
    canvas_width: f64,
    device_pixel_ratio: f64,

    ladder: GroupingLadder,
    book: BookAggregator,
    bid_rows: Vec<Option<GroupedLevel>>,
    ask_rows: Vec<Option<GroupedLevel>>,
    histogram: HistogramRange,

    bid_canvas: SideCanvas<T>,
    ask_canvas: SideCanvas<T>,
    scheduler: FrameScheduler,

    viewport: ViewportState,
    center: ScrollCenterController,
    spread: SpreadVisibilityTracker,

    interaction: RowInteractionMapper,
    active_input: TradeInputTarget,
    subscription: Option<Subscription>,
}

impl<T: DrawTarget> OrderbookView<T> {
    pub fn new(config: &Config, bid_target: T, ask_target: T) -> Result<Self> {
        config.validate()?;
        let ladder = GroupingLadder::new(config.tick_size, &config.grouping_multipliers)?;
        let style = RenderStyle {
            row_height: config.row_height,
            histogram_side: config.histogram_side,
            padding_right: config.row_padding_right,
            ..RenderStyle::default()
        };

        let highlight = Duration::from_millis(config.removal_highlight_ms);

        let mut view = Self {
            market_id: config.market_id.clone(),
            layout: config.layout,
            max_rows: config.max_rows_per_side,
            size_decimals: config.size_decimals,
            display_unit: config.display_unit,
            histogram_scale: config.histogram_scale,
            style,
            canvas_width: config.canvas_width,
            device_pixel_ratio: config.device_pixel_ratio,
            interaction: RowInteractionMapper::new(ladder.market_tick()),
            ladder,
            book: BookAggregator::new(config.max_rows_per_side),
            bid_rows: Vec::new(),
            ask_rows: Vec::new(),
            histogram: HistogramRange::default(),
            bid_canvas: SideCanvas::new(Side::Bid, bid_target).with_removal_highlight(highlight),
            ask_canvas: SideCanvas::new(Side::Ask, ask_target).with_removal_highlight(highlight),
            scheduler: FrameScheduler::new(),
            viewport: ViewportState::new(config.row_height, config.container_height),
            center: ScrollCenterController::new(config.layout),
            spread: SpreadVisibilityTracker::new(config.layout, config.hysteresis_rows),
            active_input: TradeInputTarget::None,
            subscription: None,
        };
        view.refresh_rows();
        view.scheduler.invalidate();
        Ok(view)
    }

    /// Start pulling snapshots from `subscription`, replacing any previous one
    pub fn attach(&mut self, subscription: Subscription) {
        self.subscription = Some(subscription);
    }

    /// Release the feed subscription
    pub fn detach(&mut self) {
        if self.subscription.take().is_some() {
            debug!(market = %self.market_id, "Released snapshot subscription");
        }
    }

    /// Switch to another market
    ///
    /// Everything tied to the old market goes: its subscription, the pending
    /// frame, the book, the grouping choice and the scroll state.
    pub fn set_market(&mut self, market_id: impl Into<String>, tick_size: Decimal) -> Result<()> {
        let mut ladder = self.ladder.clone();
        ladder.reset_for_market(tick_size)?;

        self.detach();
        self.scheduler.cancel();
        self.market_id = market_id.into();
        self.ladder = ladder;
        self.interaction = RowInteractionMapper::new(self.ladder.market_tick());
        self.book.reset();
        self.viewport = self.viewport.with_scroll_top(0.0);
        self.center.reset();
        self.spread.reset();
        self.bid_canvas.forget();
        self.ask_canvas.forget();
        self.refresh_rows();

        info!(market = %self.market_id, tick_size = %tick_size, "Order book market changed");
        self.scheduler.invalidate();
        Ok(())
    }

    /// Feed one snapshot in directly
    ///
    /// Returns true when the host should request an animation frame.
    pub fn on_snapshot(&mut self, snapshot: Arc<OrderbookSnapshot>) -> bool {
        let tick = self.ladder.current();
        let outcome = self.book.ingest(snapshot, &tick);
        if !outcome.changed() {
            return false;
        }
        self.refresh_rows();
        self.scheduler.invalidate()
    }

    /// Pull the newest snapshot from the subscription, if any arrived
    pub fn pump_feed(&mut self) -> bool {
        let latest = self.subscription.as_mut().and_then(Subscription::latest);
        match latest {
            Some(snapshot) => self.on_snapshot(snapshot),
            None => false,
        }
    }

    /// Coarser grouping; false at the top of the ladder
    pub fn increase_grouping(&mut self) -> bool {
        if !self.ladder.increase() {
            return false;
        }
        self.regroup();
        true
    }

    /// Finer grouping; false at the market tick
    pub fn decrease_grouping(&mut self) -> bool {
        if !self.ladder.decrease() {
            return false;
        }
        self.regroup();
        true
    }

    pub fn set_max_rows(&mut self, max_rows: usize) -> Result<()> {
        if max_rows == 0 {
            return Err(OrderbookError::ConfigError(
                "max_rows_per_side must be greater than zero".to_string(),
            ));
        }
        self.max_rows = max_rows;
        self.book.set_max_rows(max_rows, &self.ladder.current());
        self.refresh_rows();
        self.spread.on_scroll(&self.viewport, self.max_rows);
        self.scheduler.invalidate();
        Ok(())
    }

    pub fn set_display_unit(&mut self, display_unit: DisplayUnit) {
        if self.display_unit != display_unit {
            self.display_unit = display_unit;
            self.scheduler.invalidate();
        }
    }

    pub fn set_active_input(&mut self, target: TradeInputTarget) {
        self.active_input = target;
    }

    /// Container or canvas size or pixel ratio changed
    pub fn on_resize(&mut self, canvas_width: f64, container_height: f64, device_pixel_ratio: f64) {
        self.canvas_width = canvas_width.max(0.0);
        self.device_pixel_ratio = device_pixel_ratio;
        self.viewport = ViewportState {
            container_height: container_height.max(0.0),
            ..self.viewport
        };
        self.spread.on_scroll(&self.viewport, self.max_rows);
        self.scheduler.invalidate();
    }

    pub fn on_scroll(&mut self, scroll_top: f64) -> SpreadVisibility {
        self.viewport = self.viewport.with_scroll_top(scroll_top);
        self.spread.on_scroll(&self.viewport, self.max_rows)
    }

    /// Scroll offset the host should apply to center the spread row, once
    pub fn take_scroll_command(&mut self) -> Option<f64> {
        let offset = self.center.poll(&self.market_id, self.max_rows, &self.viewport)?;
        self.on_scroll(offset);
        Some(offset)
    }

    /// Animation frame callback
    ///
    /// Pulls the newest snapshot and repaints whatever changed. Returns true
    /// if either canvas was painted.
    pub fn on_animation_frame(&mut self) -> bool {
        self.on_animation_frame_at(Instant::now())
    }

    pub fn on_animation_frame_at(&mut self, now: Instant) -> bool {
        self.pump_feed();
        if !self.scheduler.take_frame() {
            let bids = self.bid_canvas.flush(now);
            let asks = self.ask_canvas.flush(now);
            return bids || asks;
        }

        let bid_frame = self.side_frame(Side::Bid);
        let ask_frame = self.side_frame(Side::Ask);
        let bids = self.bid_canvas.paint(bid_frame, now);
        let asks = self.ask_canvas.paint(ask_frame, now);
        bids || asks
    }

    /// Earliest time a held-back update is due, so the host can schedule a frame
    pub fn highlight_until(&self) -> Option<Instant> {
        match (self.bid_canvas.highlight_until(), self.ask_canvas.highlight_until()) {
            (Some(bid), Some(ask)) => Some(bid.min(ask)),
            (bid, ask) => bid.or(ask),
        }
    }

    /// Send the clicked row's price to the trade form
    pub fn click(&self, side: Side, index: usize, sink: &mut dyn LimitPriceSink) -> bool {
        self.interaction
            .click(side, self.rows(side), index, self.active_input, sink)
    }

    pub fn hover(&self, side: Side, index: usize) -> Option<String> {
        self.interaction.hover(self.rows(side), index)
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    pub fn grouping(&self) -> GroupingTick {
        self.ladder.current()
    }

    pub fn ladder(&self) -> &GroupingLadder {
        &self.ladder
    }

    pub fn has_orderbook(&self) -> bool {
        self.book.has_orderbook()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn frame_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Display rows for a side, exactly `max_rows` long
    pub fn rows(&self, side: Side) -> &[Option<GroupedLevel>] {
        match side {
            Side::Bid => &self.bid_rows,
            Side::Ask => &self.ask_rows,
        }
    }

    pub fn histogram(&self) -> HistogramRange {
        self.histogram
    }

    pub fn spread_metrics(&self) -> SpreadMetrics {
        self.book.spread_metrics()
    }

    /// Mid price as shown in the spread row under the current grouping
    pub fn display_mid_price(&self) -> Option<Decimal> {
        let best = |side| self.book.grouped(side).first().map(|row| row.price);
        SpreadMetrics::grouped_mid_price(best(Side::Bid), best(Side::Ask), &self.ladder.current())
    }

    pub fn spread_visibility(&self) -> SpreadVisibility {
        self.spread.state()
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    pub fn canvas(&self, side: Side) -> &T {
        match side {
            Side::Bid => self.bid_canvas.target(),
            Side::Ask => self.ask_canvas.target(),
        }
    }

    fn regroup(&mut self) {
        let tick = self.ladder.current();
        self.book.regroup(&tick);
        self.refresh_rows();
        info!(market = %self.market_id, tick_size = %tick.tick_size, "Grouping changed");
        self.scheduler.invalidate();
    }

    fn refresh_rows(&mut self) {
        self.bid_rows = slice_rows(self.book.grouped(Side::Bid), Side::Bid, self.max_rows, self.layout);
        self.ask_rows = slice_rows(self.book.grouped(Side::Ask), Side::Ask, self.max_rows, self.layout);
        self.histogram = HistogramRange::from_rows(&self.bid_rows, &self.ask_rows);
    }

    fn side_frame(&self, side: Side) -> SideFrame {
        let mut style = self.style;
        // side by side, bid bars grow from the left edge toward the spread
        if self.layout == Layout::Horizontal && side == Side::Bid {
            style.histogram_side = HistogramSide::Left;
        }

        SideFrame {
            rows: self.rows(side).to_vec(),
            histogram_max: self.histogram.scale_for(side, self.histogram_scale),
            geometry: CanvasGeometry::new(
                self.canvas_width,
                self.max_rows as f64 * self.style.row_height,
                self.device_pixel_ratio,
            ),
            style,
            labels: LabelFormat {
                price_decimals: self.ladder.current().decimals,
                size_decimals: self.size_decimals,
                display_unit: self.display_unit,
            },
            loading: !self.book.has_orderbook(),
        }
    }
}

impl<T: DrawTarget> Drop for OrderbookView<T> {
    fn drop(&mut self) {
        self.scheduler.cancel();
        self.detach();
    }
}
