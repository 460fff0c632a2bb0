//! Order book depth view
//!
//! This crate turns full order book snapshots into grouped, fixed-height
//! depth rows and paints them as per-side histogram canvases, with spread
//! pinning, scroll centering and click-to-fill of limit prices.

pub mod config;
pub mod error;
pub mod interaction;
pub mod orderbook;
pub mod parser;
pub mod publisher;
pub mod render;
pub mod scroll;
pub mod telemetry;
pub mod view;

pub use config::Config;
pub use error::{OrderbookError, Result};
pub use interaction::{LimitPriceSink, RowInteractionMapper, TradeInputTarget};
pub use orderbook::{
    BookAggregator, GroupedLevel, GroupingLadder, GroupingTick, HistogramRange, HistogramScale,
    Layout, OrderbookSnapshot, PriceLevel, Side, SpreadMetrics,
};
pub use parser::parse_snapshot;
pub use publisher::{SnapshotFeed, Subscription};
pub use render::{AsciiCanvas, DisplayUnit, DrawCommand, DrawTarget, HistogramSide};
pub use scroll::{SpreadVisibility, ViewportState};
pub use view::OrderbookView;
