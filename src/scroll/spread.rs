//! Spread row pinning

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ViewportState;
use crate::orderbook::Layout;

/// Where the spread row is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadVisibility {
    /// The in-flow spread row is on screen, no duplicate is drawn
    #[default]
    Centered,
    /// Scrolled above the viewport, a sticky copy sits at the top
    PinnedTop,
    /// Scrolled below the viewport, a sticky copy sits at the bottom
    PinnedBottom,
}

/// Everything the reducer looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadInput {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub spread_offset: f64,
    pub spread_height: f64,
    /// Distance past a boundary required before the state flips
    pub margin: f64,
}

/// Next spread visibility given the previous one
pub fn next_visibility(prev: SpreadVisibility, input: &SpreadInput) -> SpreadVisibility {
    let margin = input.margin.max(0.0);
    let view_top = input.scroll_top;
    let view_bottom = input.scroll_top + input.viewport_height;
    let spread_top = input.spread_offset;
    let spread_bottom = input.spread_offset + input.spread_height;

    if spread_bottom + margin <= view_top {
        return SpreadVisibility::PinnedTop;
    }
    if spread_top - margin >= view_bottom {
        return SpreadVisibility::PinnedBottom;
    }

    match prev {
        SpreadVisibility::Centered => SpreadVisibility::Centered,
        SpreadVisibility::PinnedTop if spread_bottom >= view_top + margin => {
            SpreadVisibility::Centered
        }
        SpreadVisibility::PinnedBottom if spread_top + margin <= view_bottom => {
            SpreadVisibility::Centered
        }
        pinned => pinned,
    }
}

/// Scroll-driven holder of the current [`SpreadVisibility`]
#[derive(Debug, Clone)]
pub struct SpreadVisibilityTracker {
    layout: Layout,
    hysteresis_rows: f64,
    state: SpreadVisibility,
}

impl SpreadVisibilityTracker {
    pub fn new(layout: Layout, hysteresis_rows: f64) -> Self {
        Self {
            layout,
            hysteresis_rows,
            state: SpreadVisibility::Centered,
        }
    }

    pub fn state(&self) -> SpreadVisibility {
        self.state
    }

    /// Recompute after a scroll or resize
    pub fn on_scroll(&mut self, viewport: &ViewportState, max_rows: usize) -> SpreadVisibility {
        if self.layout == Layout::Horizontal {
            return self.state;
        }

        let input = SpreadInput {
            scroll_top: viewport.scroll_top,
            viewport_height: viewport.container_height,
            spread_offset: viewport.spread_offset(max_rows),
            spread_height: viewport.row_height,
            margin: self.hysteresis_rows * viewport.row_height,
        };
        let next = next_visibility(self.state, &input);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, scroll_top = viewport.scroll_top, "Spread row visibility changed");
            self.state = next;
        }
        self.state
    }

    pub fn reset(&mut self) {
        self.state = SpreadVisibility::Centered;
    }
}
