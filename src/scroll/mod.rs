//! Scroll handling for the vertical layout
//!
//! The scroll container holds the ask rows, the spread row and the bid rows,
//! in that order. Everything here works on plain numbers so it can be driven
//! without a real DOM.

mod center;
mod spread;

pub use center::ScrollCenterController;
pub use spread::{next_visibility, SpreadInput, SpreadVisibility, SpreadVisibilityTracker};

use serde::{Deserialize, Serialize};

/// Scroll container metrics, replaced wholesale on every scroll or resize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub scroll_top: f64,
    pub row_height: f64,
    pub container_height: f64,
}

impl ViewportState {
    pub fn new(row_height: f64, container_height: f64) -> Self {
        Self {
            scroll_top: 0.0,
            row_height,
            container_height,
        }
    }

    pub fn with_scroll_top(self, scroll_top: f64) -> Self {
        Self { scroll_top, ..self }
    }

    /// Offset of the spread row from the top of the scroll content
    pub fn spread_offset(&self, max_rows: usize) -> f64 {
        max_rows as f64 * self.row_height
    }

    /// Height of asks, spread row and bids together
    pub fn content_height(&self, max_rows: usize) -> f64 {
        (2 * max_rows + 1) as f64 * self.row_height
    }

    /// Largest valid `scroll_top`
    pub fn max_scroll_top(&self, max_rows: usize) -> f64 {
        (self.content_height(max_rows) - self.container_height).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_geometry() {
        let viewport = ViewportState::new(20.0, 300.0);
        assert_eq!(viewport.spread_offset(10), 200.0);
        assert_eq!(viewport.content_height(10), 420.0);
        assert_eq!(viewport.max_scroll_top(10), 120.0);
        assert_eq!(ViewportState::new(20.0, 1000.0).max_scroll_top(10), 0.0);
    }
}
