//! Character-cell backend used by the replay driver

use super::{CanvasGeometry, DrawCommand, DrawTarget, HistogramSide, TextAlign};

/// Rasterizes draw commands into a grid of characters
///
/// One cell is `cell_width` CSS pixels wide and one row tall.
#[derive(Debug, Clone)]
pub struct AsciiCanvas {
    cell_width: f64,
    row_height: f64,
    cols: usize,
    grid: Vec<Vec<char>>,
}

impl AsciiCanvas {
    pub fn new(cell_width: f64, row_height: f64) -> Self {
        Self {
            cell_width,
            row_height,
            cols: 0,
            grid: Vec::new(),
        }
    }

    fn col(&self, x: f64) -> usize {
        ((x / self.cell_width).floor().max(0.0) as usize).min(self.cols)
    }

    fn line(&self, y: f64) -> Option<usize> {
        let line = (y / self.row_height).floor();
        if line < 0.0 {
            return None;
        }
        let line = line as usize;
        (line < self.grid.len()).then_some(line)
    }

    fn put_str(&mut self, line: usize, start: usize, text: &str) {
        let row = &mut self.grid[line];
        for (i, ch) in text.chars().enumerate() {
            if let Some(cell) = row.get_mut(start + i) {
                *cell = ch;
            }
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect()
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}

impl DrawTarget for AsciiCanvas {
    fn resize(&mut self, geometry: &CanvasGeometry) {
        self.cols = (geometry.width / self.cell_width).floor().max(0.0) as usize;
        let lines = (geometry.height / self.row_height).floor().max(0.0) as usize;
        self.grid = vec![vec![' '; self.cols]; lines];
    }

    fn draw(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            match command {
                DrawCommand::Clear { .. } => {
                    for row in &mut self.grid {
                        row.iter_mut().for_each(|c| *c = ' ');
                    }
                }
                DrawCommand::Bar { rect, anchor, .. } => {
                    let Some(line) = self.line(rect.y) else { continue };
                    let (from, to) = (self.col(rect.x), self.col(rect.x + rect.width));
                    let shade = match anchor {
                        HistogramSide::Left => '▒',
                        HistogramSide::Right => '░',
                    };
                    for cell in &mut self.grid[line][from..to] {
                        *cell = shade;
                    }
                }
                DrawCommand::Text { text, x, y, align, .. } => {
                    let Some(line) = self.line(*y) else { continue };
                    let len = text.chars().count();
                    let start = match align {
                        TextAlign::Left => self.col(*x),
                        TextAlign::Right => self.col(*x).saturating_sub(len),
                    };
                    self.put_str(line, start, text);
                }
                DrawCommand::Loading { .. } => {
                    if !self.grid.is_empty() {
                        let line = self.grid.len() / 2;
                        self.put_str(line, 0, "loading...");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Color, Fill, Rect};

    #[test]
    fn test_rasterizes_bars_and_text() {
        let mut canvas = AsciiCanvas::new(10.0, 20.0);
        canvas.resize(&CanvasGeometry::new(100.0, 40.0, 1.0));
        canvas.draw(&[
            DrawCommand::Clear {
                width: 100.0,
                height: 40.0,
            },
            DrawCommand::Bar {
                rect: Rect {
                    x: 60.0,
                    y: 21.0,
                    width: 40.0,
                    height: 18.0,
                },
                fill: Fill::Solid(Color::TRANSPARENT),
                anchor: HistogramSide::Right,
            },
            DrawCommand::Text {
                text: "42".to_string(),
                x: 30.0,
                y: 10.0,
                color: Color::TRANSPARENT,
                align: TextAlign::Right,
            },
        ]);

        assert_eq!(canvas.lines(), vec![" 42".to_string(), "      ░░░░".to_string()]);
    }

    #[test]
    fn test_loading_message() {
        let mut canvas = AsciiCanvas::new(10.0, 20.0);
        canvas.resize(&CanvasGeometry::new(200.0, 60.0, 1.0));
        canvas.draw(&[DrawCommand::Loading {
            width: 200.0,
            height: 60.0,
        }]);
        assert!(canvas.render().contains("loading..."));
    }
}
