//! Drawing surfaces
//!
//! The widget only needs to fill and outline rectangles on something with a
//! size. [`TerminalSurface`] is a grid of terminal cells where one surface unit
//! is one cell; a cell belongs to a rectangle when its centre lies inside it,
//! which is the same rule the hit-testing uses.

use crate::geometry::KeyRect;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

/// Minimal drawing capability needed to render the keyboard
pub trait Surface {
    /// Current size as (width, height)
    fn size(&self) -> (f32, f32);

    /// Change the size; the content is cleared
    fn resize(&mut self, width: f32, height: f32);

    /// Clear the whole surface
    fn clear(&mut self);

    /// Fill a rectangle with a solid colour
    fn fill_rect(&mut self, rect: KeyRect, color: Color);

    /// Outline a rectangle
    fn stroke_rect(&mut self, rect: KeyRect, color: Color);
}

/// One character cell of a [`TerminalSurface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCell {
    pub symbol: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for SurfaceCell {
    fn default() -> Self {
        Self { symbol: ' ', fg: Color::Reset, bg: Color::Reset }
    }
}

/// Terminal cell grid the keyboard is drawn onto
#[derive(Debug, Clone, Default)]
pub struct TerminalSurface {
    width: u16,
    height: u16,
    cells: Vec<SurfaceCell>,
}

impl TerminalSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![SurfaceCell::default(); width as usize * height as usize],
        }
    }

    /// Cell at column `x`, row `y`
    pub fn cell(&self, x: u16, y: u16) -> Option<&SurfaceCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize)
    }

    /// Column/row ranges of the cells whose centre lies inside `rect`
    fn covered(&self, rect: KeyRect) -> (std::ops::Range<u16>, std::ops::Range<u16>) {
        let span = |start: f32, end: f32, limit: u16| {
            // Cell c has its centre at c + 0.5
            let first = (start - 0.5).floor() + 1.0;
            let last = (end - 0.5).ceil();
            let first = first.clamp(0.0, limit as f32) as u16;
            let last = last.clamp(0.0, limit as f32) as u16;
            first..last.max(first)
        };
        (span(rect.x, rect.right(), self.width), span(rect.y, rect.bottom(), self.height))
    }

    fn cell_mut(&mut self, x: u16, y: u16) -> Option<&mut SurfaceCell> {
        let index = y as usize * self.width as usize + x as usize;
        self.cells.get_mut(index)
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    fn resize(&mut self, width: f32, height: f32) {
        *self = Self::new(width.max(0.0).round() as u16, height.max(0.0).round() as u16);
    }

    fn clear(&mut self) {
        self.cells.fill(SurfaceCell::default());
    }

    fn fill_rect(&mut self, rect: KeyRect, color: Color) {
        let (columns, rows) = self.covered(rect);
        for y in rows {
            for x in columns.clone() {
                if let Some(cell) = self.cell_mut(x, y) {
                    *cell = SurfaceCell { symbol: ' ', fg: color, bg: color };
                }
            }
        }
    }

    // Cells are too coarse for a four-sided outline; the left column is marked
    fn stroke_rect(&mut self, rect: KeyRect, color: Color) {
        let (columns, rows) = self.covered(rect);
        if columns.is_empty() {
            return;
        }
        for y in rows {
            if let Some(cell) = self.cell_mut(columns.start, y) {
                cell.symbol = '▏';
                cell.fg = color;
            }
        }
    }
}

impl Widget for &TerminalSurface {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = self.width.min(area.width);
        let height = self.height.min(area.height);
        for y in 0..height {
            for x in 0..width {
                let Some(src) = self.cell(x, y) else { continue };
                if let Some(dst) = buf.cell_mut((area.x + x, area.y + y)) {
                    dst.set_char(src.symbol).set_fg(src.fg).set_bg(src.bg);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A single recorded drawing call
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum DrawOp {
        Clear,
        Fill(KeyRect, Color),
        Stroke(KeyRect, Color),
    }

    /// Surface that records drawing calls instead of drawing
    #[derive(Debug, Clone)]
    pub struct RecordingSurface {
        pub width: f32,
        pub height: f32,
        pub ops: Vec<DrawOp>,
    }

    impl RecordingSurface {
        pub fn new(width: f32, height: f32) -> Self {
            Self { width, height, ops: Vec::new() }
        }

        /// Operations since the last clear
        pub fn last_frame(&self) -> &[DrawOp] {
            let start = self.ops.iter().rposition(|op| *op == DrawOp::Clear).map_or(0, |i| i + 1);
            &self.ops[start..]
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> (f32, f32) {
            (self.width, self.height)
        }

        fn resize(&mut self, width: f32, height: f32) {
            self.width = width;
            self.height = height;
        }

        fn clear(&mut self) {
            self.ops.push(DrawOp::Clear);
        }

        fn fill_rect(&mut self, rect: KeyRect, color: Color) {
            self.ops.push(DrawOp::Fill(rect, color));
        }

        fn stroke_rect(&mut self, rect: KeyRect, color: Color) {
            self.ops.push(DrawOp::Stroke(rect, color));
        }
    }
}
