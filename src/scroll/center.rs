//! Initial centering of the spread row

use tracing::debug;

use super::ViewportState;
use crate::orderbook::Layout;

#[derive(Debug, Clone, PartialEq)]
struct CenterKey {
    market_id: String,
    row_height: f64,
    max_rows: usize,
}

/// Scrolls the spread row to the middle of the viewport once per market
///
/// The offset is handed out a single time per (market, row height, row
/// budget); the user is free to scroll afterwards.
#[derive(Debug, Clone)]
pub struct ScrollCenterController {
    layout: Layout,
    applied: Option<CenterKey>,
}

impl ScrollCenterController {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            applied: None,
        }
    }

    /// Scroll offset that puts the spread row's center at the viewport center
    pub fn center_offset(max_rows: usize, viewport: &ViewportState) -> f64 {
        let spread_center = viewport.spread_offset(max_rows) + viewport.row_height / 2.0;
        let offset = spread_center - viewport.container_height / 2.0;
        offset.clamp(0.0, viewport.max_scroll_top(max_rows))
    }

    /// Returns the offset to apply, or `None` if centering already happened
    ///
    /// Waits while the container has not been laid out yet.
    pub fn poll(&mut self, market_id: &str, max_rows: usize, viewport: &ViewportState) -> Option<f64> {
        if self.layout == Layout::Horizontal || viewport.container_height <= 0.0 {
            return None;
        }

        let key = CenterKey {
            market_id: market_id.to_string(),
            row_height: viewport.row_height,
            max_rows,
        };
        if self.applied.as_ref() == Some(&key) {
            return None;
        }

        let offset = Self::center_offset(max_rows, viewport);
        debug!(market = market_id, offset, "Centering order book");
        self.applied = Some(key);
        Some(offset)
    }

    /// Forget the last centering so the next poll recenters
    pub fn reset(&mut self) {
        self.applied = None;
    }
}
