//! Grid geometry: cell sizes, the scrollable extent and the visible window.

use std::ops::Range;

use serde::Serialize;

/// Cell sizes, in whatever unit the renderer draws in (pixels, terminal cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridMetrics {
    pub row_height: u32,
    /// Width of the leading frame-number column
    pub leading_width: u32,
    /// Width of each call column
    pub column_width: u32,
    /// Horizontal inset of cell text
    pub text_margin: u32,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            row_height: 30,
            leading_width: 80,
            column_width: 100,
            text_margin: 5,
        }
    }
}

impl GridMetrics {
    /// One text line per row, ten character cells per column
    pub fn terminal() -> Self {
        Self {
            row_height: 1,
            leading_width: 10,
            column_width: 10,
            text_margin: 1,
        }
    }

    /// Left edge of a column in content coordinates
    pub fn column_left(&self, column: Column) -> u64 {
        match column {
            Column::Frame => 0,
            Column::Call(i) => self.leading_width as u64 + i as u64 * self.column_width as u64,
        }
    }

    pub fn column_width_of(&self, column: Column) -> u32 {
        match column {
            Column::Frame => self.leading_width,
            Column::Call(_) => self.column_width,
        }
    }

    /// Rows that intersect the vertical window `[top, top + height)`
    pub fn visible_rows(&self, top: u64, height: u32, row_count: usize) -> Range<usize> {
        if self.row_height == 0 || height == 0 {
            return 0..0;
        }
        let row_height = self.row_height as u64;
        let first = top / row_height;
        let last = top.saturating_add(height as u64).div_ceil(row_height);
        clamp_range(first, last, row_count)
    }

    /// Call columns that intersect the horizontal window `[left, left + width)`
    pub fn visible_call_columns(&self, left: u64, width: u32, column_count: usize) -> Range<usize> {
        if self.column_width == 0 || width == 0 {
            return 0..0;
        }
        let right = left.saturating_add(width as u64);
        let leading = self.leading_width as u64;
        if right <= leading {
            return 0..0;
        }
        let column_width = self.column_width as u64;
        let first = left.saturating_sub(leading) / column_width;
        let last = (right - leading).div_ceil(column_width);
        clamp_range(first, last, column_count)
    }

    /// Whether the frame column intersects `[left, left + width)`
    pub fn frame_column_visible(&self, left: u64, width: u32) -> bool {
        width > 0 && left < self.leading_width as u64
    }
}

fn clamp_range(first: u64, last: u64, len: usize) -> Range<usize> {
    let len = len as u64;
    let first = first.min(len) as usize;
    let last = last.min(len) as usize;
    first..last.max(first)
}

/// Scrollable content size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Extent {
    pub width: u64,
    pub height: u64,
}

/// The visible window onto the grid content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Content coordinate of the viewport's left edge
    pub scroll_x: u64,
    /// Content coordinate of the viewport's top edge
    pub scroll_y: u64,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn scrolled(mut self, scroll_x: u64, scroll_y: u64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Column {
    /// Leading frame-number column
    Frame,
    /// Call slot by index within the row
    Call(usize),
}

/// One materialized cell, positioned relative to the viewport's top-left.
///
/// Cells partly scrolled off the top or left have negative coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    /// Logical row, 0 being the newest frame
    pub row: usize,
    pub column: Column,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    /// `None` for a call slot past the end of its row
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics() {
        let metrics = GridMetrics::default();
        assert_eq!(metrics.row_height, 30);
        assert_eq!(metrics.leading_width, 80);
        assert_eq!(metrics.column_width, 100);
        assert_eq!(metrics.text_margin, 5);
    }

    #[test]
    fn test_visible_rows_partial_edges() {
        let metrics = GridMetrics::default();
        // 45..105 touches rows 1, 2 and 3
        assert_eq!(metrics.visible_rows(45, 60, 100), 1..4);
        assert_eq!(metrics.visible_rows(0, 60, 100), 0..2);
    }

    #[test]
    fn test_visible_rows_clamped_to_history() {
        let metrics = GridMetrics::default();
        assert_eq!(metrics.visible_rows(0, 600, 3), 0..3);
        assert_eq!(metrics.visible_rows(10_000, 600, 3), 3..3);
        assert_eq!(metrics.visible_rows(u64::MAX, 600, 3), 3..3);
    }

    #[test]
    fn test_visible_call_columns() {
        let metrics = GridMetrics::default();
        // Window 0..250 covers the frame column and calls 0 and 1
        assert_eq!(metrics.visible_call_columns(0, 250, 10), 0..2);
        // Window 150..400 covers calls 0..=3 (80 + 3 * 100 = 380)
        assert_eq!(metrics.visible_call_columns(150, 250, 10), 0..4);
        // Window 380..480 covers only call 3
        assert_eq!(metrics.visible_call_columns(380, 100, 10), 3..4);
        assert_eq!(metrics.visible_call_columns(0, 60, 10), 0..0);
        assert_eq!(metrics.visible_call_columns(u64::MAX, 250, 10), 10..10);
    }

    #[test]
    fn test_frame_column_visibility() {
        let metrics = GridMetrics::default();
        assert!(metrics.frame_column_visible(0, 10));
        assert!(metrics.frame_column_visible(79, 10));
        assert!(!metrics.frame_column_visible(80, 10));
    }

    #[test]
    fn test_zero_sized_viewport() {
        let metrics = GridMetrics::default();
        assert_eq!(metrics.visible_rows(0, 0, 10), 0..0);
        assert_eq!(metrics.visible_call_columns(0, 0, 10), 0..0);
    }
}
