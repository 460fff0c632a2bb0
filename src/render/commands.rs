//! Draw command generation

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CanvasGeometry, Color, DrawCommand, Fill, LabelFormat, Rect, TextAlign};
use crate::orderbook::{GroupedLevel, Side};

/// Edge of the canvas the depth bars grow from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistogramSide {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub bid_accent: Color,
    pub ask_accent: Color,
    pub bid_removed: Color,
    pub ask_removed: Color,
    pub text: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            bid_accent: Color::rgba(63, 185, 80, 0x73),
            ask_accent: Color::rgba(231, 76, 60, 0x73),
            bid_removed: Color::rgba(63, 185, 80, 255),
            ask_removed: Color::rgba(231, 76, 60, 255),
            text: Color::rgba(230, 230, 235, 255),
        }
    }
}

impl Palette {
    pub fn accent(&self, side: Side) -> Color {
        match side {
            Side::Bid => self.bid_accent,
            Side::Ask => self.ask_accent,
        }
    }

    /// Size label color of a row that just left the book
    pub fn removed(&self, side: Side) -> Color {
        match side {
            Side::Bid => self.bid_removed,
            Side::Ask => self.ask_removed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderStyle {
    pub row_height: f64,
    pub histogram_side: HistogramSide,
    /// Gap between a label's right edge and its column boundary
    pub padding_right: f64,
    /// How far past the canvas the bar gradient reaches before turning transparent
    pub gradient_multiplier: f64,
    pub palette: Palette,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            row_height: 20.0,
            histogram_side: HistogramSide::Right,
            padding_right: 8.0,
            gradient_multiplier: 1.3,
            palette: Palette::default(),
        }
    }
}

/// Right edge of label column `col` (0 = price, 1 = size, 2 = total)
fn column_x(width: f64, col: usize) -> f64 {
    ((col + 1) as f64 * width / 3.0).floor()
}

fn bar_width(value: Decimal, histogram_max: Decimal, max_width: f64) -> f64 {
    if histogram_max <= Decimal::ZERO || value <= Decimal::ZERO || max_width <= 0.0 {
        return 0.0;
    }
    let ratio = value
        .checked_div(histogram_max)
        .and_then(|ratio| ratio.to_f64())
        .unwrap_or(0.0);
    (ratio * max_width).clamp(0.0, max_width)
}

#[allow(clippy::too_many_arguments)]
fn draw_row(
    commands: &mut Vec<DrawCommand>,
    idx: usize,
    row: &GroupedLevel,
    side: Side,
    histogram_max: Decimal,
    geometry: &CanvasGeometry,
    style: &RenderStyle,
    labels: &LabelFormat,
    removed: bool,
) {
    let width = geometry.width;
    let top = idx as f64 * style.row_height;

    let bar = bar_width(row.cumulative_size, histogram_max, width - 2.0).floor();
    if bar > 0.0 {
        let overshoot = width * style.gradient_multiplier;
        let (x, x1, x2) = match style.histogram_side {
            HistogramSide::Left => (0.0, bar, width - overshoot),
            HistogramSide::Right => ((width - bar).floor(), width - bar, overshoot),
        };
        commands.push(DrawCommand::Bar {
            rect: Rect {
                x,
                // 1px inset so neighbouring bars never touch
                y: top + 1.0,
                width: bar,
                height: (style.row_height - 2.0).max(0.0),
            },
            fill: Fill::LinearGradient {
                x1: x1.floor(),
                x2: x2.floor(),
                from: style.palette.accent(side),
                to: Color::TRANSPARENT,
            },
            anchor: style.histogram_side,
        });
    }

    let y = top + style.row_height / 2.0;
    let texts = [labels.price(row), labels.size(row), labels.total(row)];
    for (col, text) in texts.into_iter().enumerate() {
        let color = if removed && col == 1 {
            style.palette.removed(side)
        } else {
            style.palette.text
        };
        commands.push(DrawCommand::Text {
            text,
            x: column_x(width, col) - style.padding_right,
            y,
            color,
            align: TextAlign::Right,
        });
    }
}

/// Commands painting one side's rows, top to bottom in slice order
///
/// Placeholder rows draw nothing. Bar width is depth over `histogram_max`,
/// capped at the canvas width.
pub fn draw_side(
    rows: &[Option<GroupedLevel>],
    side: Side,
    histogram_max: Decimal,
    geometry: &CanvasGeometry,
    style: &RenderStyle,
    labels: &LabelFormat,
) -> Vec<DrawCommand> {
    draw_side_with_removals(rows, side, histogram_max, geometry, style, labels, &[])
}

/// Like [`draw_side`], with the size label of every row priced in `removed`
/// painted in the side's removal color
#[allow(clippy::too_many_arguments)]
pub fn draw_side_with_removals(
    rows: &[Option<GroupedLevel>],
    side: Side,
    histogram_max: Decimal,
    geometry: &CanvasGeometry,
    style: &RenderStyle,
    labels: &LabelFormat,
    removed: &[Decimal],
) -> Vec<DrawCommand> {
    let mut commands = Vec::with_capacity(1 + rows.len() * 4);
    commands.push(DrawCommand::Clear {
        width: geometry.width,
        height: geometry.height,
    });

    for (idx, row) in rows.iter().enumerate() {
        if let Some(row) = row {
            let gone = removed.contains(&row.price);
            draw_row(&mut commands, idx, row, side, histogram_max, geometry, style, labels, gone);
        }
    }

    commands
}

/// Commands shown before any valid snapshot
pub fn draw_loading(geometry: &CanvasGeometry) -> Vec<DrawCommand> {
    vec![
        DrawCommand::Clear {
            width: geometry.width,
            height: geometry.height,
        },
        DrawCommand::Loading {
            width: geometry.width,
            height: geometry.height,
        },
    ]
}
