//! Animation-frame coalescing
//!
//! Upstream changes only mark the view dirty. The host asks for an animation
//! frame when [`FrameScheduler::invalidate`] says so, and paints happen when
//! that frame fires, so any number of updates inside one frame cost one paint.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::{
    draw_loading, draw_side_with_removals, CanvasGeometry, DrawCommand, DrawTarget, LabelFormat,
    RenderStyle,
};
use crate::orderbook::{GroupedLevel, Side};
use crate::telemetry;

/// Dirty flag plus the pending-frame handle
#[derive(Debug, Default, Clone)]
pub struct FrameScheduler {
    dirty: bool,
    frame_pending: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the view dirty
    ///
    /// Returns true when the caller must request a new animation frame, i.e.
    /// none is pending yet.
    pub fn invalidate(&mut self) -> bool {
        self.dirty = true;
        if self.frame_pending {
            return false;
        }
        self.frame_pending = true;
        true
    }

    /// Called when the animation frame fires; true if a paint is due
    pub fn take_frame(&mut self) -> bool {
        self.frame_pending = false;
        std::mem::take(&mut self.dirty)
    }

    /// Drop any pending frame, e.g. on teardown or market change
    pub fn cancel(&mut self) {
        if self.frame_pending {
            debug!("Cancelled pending animation frame");
        }
        self.frame_pending = false;
        self.dirty = false;
    }

    pub fn is_pending(&self) -> bool {
        self.frame_pending
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Everything one side's paint depends on
///
/// Two equal frames produce identical pixels, which is how repaints are
/// limited to real data, size or pixel ratio changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SideFrame {
    pub rows: Vec<Option<GroupedLevel>>,
    pub histogram_max: Decimal,
    pub geometry: CanvasGeometry,
    pub style: RenderStyle,
    pub labels: LabelFormat,
    pub loading: bool,
}

impl SideFrame {
    pub fn commands(&self, side: Side) -> Vec<DrawCommand> {
        self.commands_with_removals(side, &[])
    }

    /// Commands with the rows priced in `removed` highlighted
    pub fn commands_with_removals(&self, side: Side, removed: &[Decimal]) -> Vec<DrawCommand> {
        if self.loading {
            return draw_loading(&self.geometry);
        }
        draw_side_with_removals(
            &self.rows,
            side,
            self.histogram_max,
            &self.geometry,
            &self.style,
            &self.labels,
            removed,
        )
    }

    fn prices(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.rows.iter().flatten().map(|row| row.price)
    }

    /// Prices shown in `self` that `next` no longer has
    ///
    /// Empty when either frame is loading or the canvas size changed.
    pub fn removed_in(&self, next: &SideFrame) -> Vec<Decimal> {
        if self.loading || next.loading || self.geometry != next.geometry {
            return Vec::new();
        }
        self.prices()
            .filter(|price| !next.prices().any(|p| p == *price))
            .collect()
    }
}

/// How long removed rows stay highlighted before the new rows are drawn
pub const DEFAULT_REMOVAL_HIGHLIGHT: Duration = Duration::from_millis(100);

/// One side's canvas and the only writer to it
///
/// When an update drops rows, the previous rows are drawn once more with the
/// removed sizes highlighted, and the update itself is held back until
/// `removal_highlight` has passed. A newer frame arriving in the meantime
/// replaces the held one.
#[derive(Debug)]
pub struct SideCanvas<T> {
    side: Side,
    target: T,
    /// Newest accepted frame
    last: Option<SideFrame>,
    /// Set while `last` is held back behind a removal highlight
    due: Option<Instant>,
    removal_highlight: Duration,
    paints: u64,
}

impl<T: DrawTarget> SideCanvas<T> {
    pub fn new(side: Side, target: T) -> Self {
        Self {
            side,
            target,
            last: None,
            due: None,
            removal_highlight: DEFAULT_REMOVAL_HIGHLIGHT,
            paints: 0,
        }
    }

    /// Zero turns the removal highlight off
    pub fn with_removal_highlight(mut self, duration: Duration) -> Self {
        self.removal_highlight = duration;
        self
    }

    /// Paint `frame` unless it matches what is already on the canvas
    ///
    /// A frame held back earlier is drawn here once its highlight is over.
    pub fn paint(&mut self, frame: SideFrame, now: Instant) -> bool {
        if self.last.as_ref() == Some(&frame) {
            return self.flush(now);
        }

        let highlight = match &self.last {
            Some(last) if !self.removal_highlight.is_zero() => {
                let removed = last.removed_in(&frame);
                (!removed.is_empty())
                    .then(|| (removed.len(), last.commands_with_removals(self.side, &removed)))
            }
            _ => None,
        };
        if let Some((removed, commands)) = highlight {
            self.draw(&commands, false);
            trace!(side = ?self.side, removed, "Highlighting removed rows");
            self.due = Some(now + self.removal_highlight);
            self.last = Some(frame);
            return true;
        }

        let resized = self.last.as_ref().map(|last| last.geometry) != Some(frame.geometry);
        if resized {
            self.target.resize(&frame.geometry);
        }
        let commands = frame.commands(self.side);
        self.draw(&commands, resized);
        self.due = None;
        self.last = Some(frame);
        true
    }

    /// Draw the held-back frame if its highlight is over
    pub fn flush(&mut self, now: Instant) -> bool {
        match (self.due, &self.last) {
            (Some(due), Some(last)) if now >= due => {
                let commands = last.commands(self.side);
                self.draw(&commands, false);
                self.due = None;
                true
            }
            _ => false,
        }
    }

    /// When the held-back frame is due, if there is one
    pub fn highlight_until(&self) -> Option<Instant> {
        self.due
    }

    fn draw(&mut self, commands: &[DrawCommand], resized: bool) {
        self.target.draw(commands);
        self.paints += 1;
        telemetry::frame_painted(self.side);
        debug!(side = ?self.side, commands = commands.len(), resized, "Painted order book side");
    }

    /// Force the next paint even if nothing changed
    pub fn forget(&mut self) {
        self.last = None;
        self.due = None;
    }

    pub fn paints(&self) -> u64 {
        self.paints
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Color, DisplayUnit, Palette, RecordingTarget};
    use rust_decimal_macros::dec;

    fn frame(width: f64, ratio: f64, loading: bool) -> SideFrame {
        SideFrame {
            rows: vec![None, None],
            histogram_max: dec!(1),
            geometry: CanvasGeometry::new(width, 40.0, ratio),
            style: RenderStyle::default(),
            labels: LabelFormat {
                price_decimals: 2,
                size_decimals: 2,
                display_unit: DisplayUnit::Asset,
            },
            loading,
        }
    }

    #[test]
    fn test_invalidate_coalesces_into_one_frame() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.invalidate());
        assert!(!scheduler.invalidate());
        assert!(!scheduler.invalidate());
        assert!(scheduler.is_pending());

        assert!(scheduler.take_frame());
        assert!(!scheduler.take_frame());
        assert!(scheduler.invalidate());
    }

    #[test]
    fn test_cancel_drops_pending_paint() {
        let mut scheduler = FrameScheduler::new();
        scheduler.invalidate();
        scheduler.cancel();
        assert!(!scheduler.is_pending());
        assert!(!scheduler.take_frame());
    }

    #[test]
    fn test_canvas_repaints_only_on_change() {
        let mut canvas = SideCanvas::new(Side::Bid, RecordingTarget::new());

        let now = Instant::now();
        assert!(canvas.paint(frame(300.0, 1.0, true), now));
        assert!(!canvas.paint(frame(300.0, 1.0, true), now));
        assert!(canvas.paint(frame(300.0, 1.0, false), now));
        assert!(canvas.paint(frame(300.0, 2.0, false), now));
        assert!(canvas.paint(frame(320.0, 2.0, false), now));

        assert_eq!(canvas.paints(), 4);
        assert_eq!(canvas.target().frames.len(), 4);
        // first paint plus the ratio change and the width change
        assert_eq!(canvas.target().resizes.len(), 3);
        assert!(matches!(
            canvas.target().frames[0][1],
            DrawCommand::Loading { .. }
        ));

        canvas.forget();
        assert!(canvas.paint(frame(320.0, 2.0, false), now));
    }

    fn level(price: Decimal, size: Decimal) -> Option<GroupedLevel> {
        Some(GroupedLevel {
            price,
            size,
            size_cost: price * size,
            cumulative_size: size,
            cumulative_cost: price * size,
        })
    }

    fn with_rows(rows: Vec<Option<GroupedLevel>>) -> SideFrame {
        SideFrame {
            rows,
            ..frame(300.0, 1.0, false)
        }
    }

    fn size_colors(commands: &[DrawCommand]) -> Vec<Color> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { color, .. } => Some(*color),
                _ => None,
            })
            .skip(1)
            .step_by(3)
            .collect()
    }

    #[test]
    fn test_removed_rows_highlight_before_update() {
        let palette = Palette::default();
        let mut canvas = SideCanvas::new(Side::Ask, RecordingTarget::new())
            .with_removal_highlight(Duration::from_millis(100));
        let start = Instant::now();

        let before = with_rows(vec![level(dec!(100.13), dec!(1)), level(dec!(100.14), dec!(2))]);
        let after = with_rows(vec![level(dec!(100.14), dec!(3)), None]);
        assert!(canvas.paint(before, start));

        // the old rows come back with the vanished size highlighted
        assert!(canvas.paint(after.clone(), start));
        let highlighted = canvas.target().last_frame().unwrap();
        assert_eq!(size_colors(highlighted), vec![palette.ask_removed, palette.text]);
        assert_eq!(canvas.highlight_until(), Some(start + Duration::from_millis(100)));

        // nothing new until the highlight is over
        assert!(!canvas.paint(after.clone(), start + Duration::from_millis(50)));
        assert!(canvas.paint(after.clone(), start + Duration::from_millis(100)));
        assert_eq!(canvas.target().last_frame().unwrap(), after.commands(Side::Ask).as_slice());
        assert_eq!(canvas.highlight_until(), None);
        assert_eq!(canvas.paints(), 3);
    }

    #[test]
    fn test_first_data_and_size_updates_paint_at_once() {
        let mut canvas = SideCanvas::new(Side::Bid, RecordingTarget::new());
        let now = Instant::now();

        assert!(canvas.paint(frame(300.0, 1.0, true), now));
        let first = with_rows(vec![level(dec!(100.12), dec!(1)), None]);
        assert!(canvas.paint(first, now));
        // same price, new size: an update, not a removal
        let resized = with_rows(vec![level(dec!(100.12), dec!(4)), None]);
        assert!(canvas.paint(resized.clone(), now));

        assert_eq!(canvas.highlight_until(), None);
        assert_eq!(canvas.target().last_frame().unwrap(), resized.commands(Side::Bid).as_slice());
    }

    #[test]
    fn test_newer_frame_replaces_held_one() {
        let mut canvas = SideCanvas::new(Side::Bid, RecordingTarget::new());
        let start = Instant::now();

        canvas.paint(with_rows(vec![level(dec!(3), dec!(1)), level(dec!(2), dec!(1))]), start);
        canvas.paint(with_rows(vec![level(dec!(3), dec!(1)), None]), start);
        let latest = with_rows(vec![level(dec!(3), dec!(2)), None]);
        assert!(canvas.paint(latest.clone(), start + Duration::from_millis(10)));

        assert_eq!(canvas.highlight_until(), None);
        assert_eq!(canvas.target().last_frame().unwrap(), latest.commands(Side::Bid).as_slice());
        assert!(!canvas.flush(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_duration_disables_highlight() {
        let mut canvas =
            SideCanvas::new(Side::Bid, RecordingTarget::new()).with_removal_highlight(Duration::ZERO);
        let now = Instant::now();

        canvas.paint(with_rows(vec![level(dec!(3), dec!(1)), None]), now);
        let empty = with_rows(vec![None, None]);
        assert!(canvas.paint(empty.clone(), now));
        assert_eq!(canvas.target().last_frame().unwrap(), empty.commands(Side::Bid).as_slice());
    }
}
