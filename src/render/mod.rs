//! Canvas rendering
//!
//! Painting is split in two: [`draw_side`] turns rows into a list of
//! [`DrawCommand`]s with no side effects, and a [`DrawTarget`] executes them
//! against whatever backend is in use.

mod ascii;
mod commands;
mod format;
mod scheduler;

pub use ascii::AsciiCanvas;
pub use commands::{
    draw_loading, draw_side, draw_side_with_removals, HistogramSide, Palette, RenderStyle,
};
pub use format::{group_thousands, DisplayUnit, LabelFormat};
pub use scheduler::{FrameScheduler, SideCanvas, SideFrame, DEFAULT_REMOVAL_HIGHLIGHT};

use serde::{Deserialize, Serialize};

/// RGBA color, alpha 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            f64::from(self.a) / 255.0
        )
    }
}

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    Solid(Color),
    /// Horizontal gradient from `from` at `x1` to `to` at `x2`
    LinearGradient {
        x1: f64,
        x2: f64,
        from: Color,
        to: Color,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Right,
}

/// One drawing operation, in CSS pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Clear {
        width: f64,
        height: f64,
    },
    /// Depth bar; the corners away from `anchor` are rounded
    Bar {
        rect: Rect,
        fill: Fill,
        anchor: HistogramSide,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        color: Color,
        align: TextAlign,
    },
    /// Shown until the first valid snapshot arrives
    Loading {
        width: f64,
        height: f64,
    },
}

/// Size of one side's canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    /// CSS pixels
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl CanvasGeometry {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Backing buffer size in device pixels
    pub fn buffer_size(&self) -> (u32, u32) {
        let ratio = if self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        (
            (self.width * ratio).round().max(0.0) as u32,
            (self.height * ratio).round().max(0.0) as u32,
        )
    }
}

/// Rendering backend for one side's canvas
///
/// Implementations scale by the device pixel ratio given to `resize`;
/// commands always arrive in CSS pixels.
pub trait DrawTarget {
    fn resize(&mut self, geometry: &CanvasGeometry);

    fn draw(&mut self, commands: &[DrawCommand]);
}

/// Keeps every frame it is given, for tests and debugging
#[derive(Debug, Default, Clone)]
pub struct RecordingTarget {
    pub frames: Vec<Vec<DrawCommand>>,
    pub resizes: Vec<CanvasGeometry>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&[DrawCommand]> {
        self.frames.last().map(Vec::as_slice)
    }
}

impl DrawTarget for RecordingTarget {
    fn resize(&mut self, geometry: &CanvasGeometry) {
        self.resizes.push(*geometry);
    }

    fn draw(&mut self, commands: &[DrawCommand]) {
        self.frames.push(commands.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_scales_by_ratio() {
        assert_eq!(CanvasGeometry::new(300.0, 200.0, 2.0).buffer_size(), (600, 400));
        assert_eq!(CanvasGeometry::new(300.0, 200.0, 0.0).buffer_size(), (300, 200));
    }

    #[test]
    fn test_css_color() {
        assert_eq!(Color::rgba(255, 0, 0, 255).to_css(), "rgba(255, 0, 0, 1.000)");
        assert_eq!(Color::TRANSPARENT.to_css(), "rgba(0, 0, 0, 0.000)");
    }
}
