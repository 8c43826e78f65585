use serde::Serialize;
use tracing::debug;

use crate::grid::{Column, Extent, GridCell, GridMetrics, Viewport};
use crate::history::CallHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DrawState {
    #[default]
    Enabled,
    Disabled,
}

/// Virtualized view over a [`CallHistory`].
///
/// Holds no cells of its own; `render` builds only the cells that intersect
/// the viewport, so cost scales with the window rather than the history.
#[derive(Debug, Clone)]
pub struct GridView {
    metrics: GridMetrics,
    draw_state: DrawState,
    extent: Extent,
    max_columns: usize,
    redraw_requested: bool,
}

impl GridView {
    pub fn new(metrics: GridMetrics, enabled: bool) -> Self {
        Self {
            metrics,
            draw_state: if enabled {
                DrawState::Enabled
            } else {
                DrawState::Disabled
            },
            extent: Extent::default(),
            max_columns: 0,
            redraw_requested: false,
        }
    }

    pub fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    pub fn draw_state(&self) -> DrawState {
        self.draw_state
    }

    pub fn is_draw_enabled(&self) -> bool {
        self.draw_state == DrawState::Enabled
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn max_columns(&self) -> usize {
        self.max_columns
    }

    /// Only `Disabled -> Enabled` requests a redraw.
    pub fn set_draw_enabled(&mut self, enabled: bool) {
        match (self.draw_state, enabled) {
            (DrawState::Disabled, true) => {
                self.draw_state = DrawState::Enabled;
                self.redraw_requested = true;
            }
            (DrawState::Enabled, false) => {
                self.draw_state = DrawState::Disabled;
            }
            _ => {}
        }
    }

    /// Append a frame's calls and grow the scrollable extent.
    ///
    /// Returns whether a row was added. The width only changes when the
    /// widest row grows.
    pub fn grow(&mut self, history: &mut CallHistory, frame: u64, calls: Vec<u32>) -> bool {
        if !history.append(frame, calls) {
            return false;
        }

        self.extent.height = history.len() as u64 * self.metrics.row_height as u64;
        if history.max_columns() > self.max_columns {
            self.max_columns = history.max_columns();
            self.extent.width = self.metrics.leading_width as u64
                + self.max_columns as u64 * self.metrics.column_width as u64;
            debug!("Grid widened to {} call columns", self.max_columns);
        }

        if self.is_draw_enabled() {
            self.redraw_requested = true;
        }
        true
    }

    /// Note a scroll position change.
    pub fn on_scroll(&mut self) {
        if self.is_draw_enabled() {
            self.redraw_requested = true;
        }
    }

    /// Consume a pending redraw request
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Forget every row; used when the session restarts.
    pub fn reset(&mut self) {
        self.extent = Extent::default();
        self.max_columns = 0;
        if self.is_draw_enabled() {
            self.redraw_requested = true;
        }
    }

    /// Keep the viewport inside the content
    pub fn clamp_scroll(&self, viewport: Viewport) -> Viewport {
        let max_x = self.extent.width.saturating_sub(viewport.width as u64);
        let max_y = self.extent.height.saturating_sub(viewport.height as u64);
        viewport.scrolled(viewport.scroll_x.min(max_x), viewport.scroll_y.min(max_y))
    }

    /// Cells intersecting the viewport, row by row, frame column first.
    ///
    /// Nothing is produced while drawing is disabled.
    pub fn render(&self, history: &CallHistory, viewport: Viewport) -> Vec<GridCell> {
        if !self.is_draw_enabled() {
            return Vec::new();
        }

        let metrics = &self.metrics;
        let rows = metrics.visible_rows(viewport.scroll_y, viewport.height, history.len());
        let columns =
            metrics.visible_call_columns(viewport.scroll_x, viewport.width, self.max_columns);
        let show_frame = metrics.frame_column_visible(viewport.scroll_x, viewport.width);

        let mut cells = Vec::with_capacity(rows.len() * (columns.len() + 1));
        for index in rows {
            let Some(row) = history.row(index) else {
                break;
            };
            let y = index as i64 * metrics.row_height as i64 - viewport.scroll_y as i64;

            let cell = |column: Column, text: Option<String>| GridCell {
                row: index,
                column,
                x: metrics.column_left(column) as i64 - viewport.scroll_x as i64,
                y,
                width: metrics.column_width_of(column),
                height: metrics.row_height,
                text,
            };

            if show_frame {
                cells.push(cell(Column::Frame, Some(row.frame.to_string())));
            }
            for column in columns.clone() {
                let text = row.calls.get(column).map(|caller| format!("{:08X}", caller));
                cells.push(cell(Column::Call(column), text));
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(rows: &[usize]) -> (GridView, CallHistory) {
        let mut grid = GridView::new(GridMetrics::default(), true);
        let mut history = CallHistory::new();
        for (i, &count) in rows.iter().enumerate() {
            let calls = (1..=count as u32).map(|c| 0x8000_0000 | c).collect();
            assert!(grid.grow(&mut history, i as u64 + 1, calls));
        }
        (grid, history)
    }

    #[test]
    fn test_extent_tracks_rows_and_widest_row() {
        let (grid, _) = grid_with(&[2, 5, 1]);

        assert_eq!(grid.max_columns(), 5);
        assert_eq!(grid.extent(), Extent { width: 80 + 5 * 100, height: 90 });
    }

    #[test]
    fn test_blank_cells_past_row_length() {
        let (grid, history) = grid_with(&[2, 5, 1]);
        let cells = grid.render(&history, Viewport::new(1000, 1000));

        // 3 rows x (frame + 5 call columns)
        assert_eq!(cells.len(), 18);

        // Row 0 is frame 3 with a single call
        let newest: Vec<_> = cells.iter().filter(|c| c.row == 0).collect();
        assert_eq!(newest[0].column, Column::Frame);
        assert_eq!(newest[0].text.as_deref(), Some("3"));
        assert_eq!(newest[1].text.as_deref(), Some("80000001"));
        assert!(newest[2..].iter().all(|c| c.text.is_none()));

        let widest: Vec<_> = cells.iter().filter(|c| c.row == 1).collect();
        assert!(widest[1..].iter().all(|c| c.text.is_some()));
        assert_eq!(widest[5].text.as_deref(), Some("80000005"));
    }

    #[test]
    fn test_render_only_visible_window() {
        let counts = vec![10; 1000];
        let (grid, history) = grid_with(&counts);

        // Two rows and the frame column plus calls 0 and 1
        let cells = grid.render(&history, Viewport::new(250, 60).scrolled(0, 300));
        assert_eq!(cells.len(), 2 * 3);
        assert_eq!(cells[0].row, 10);
        assert_eq!(cells[0].y, 0);
        assert_eq!(cells[3].row, 11);
        assert_eq!(cells[3].y, 30);
    }

    #[test]
    fn test_render_scrolled_right_hides_frame_column() {
        let (grid, history) = grid_with(&[10]);
        let cells = grid.render(&history, Viewport::new(100, 30).scrolled(380, 0));

        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].column, Column::Call(3));
        assert_eq!(cells[0].x, 0);
        assert_eq!(cells[0].text.as_deref(), Some("80000004"));
    }

    #[test]
    fn test_render_partial_cells_have_negative_offsets() {
        let (grid, history) = grid_with(&[1, 1, 1]);
        let cells = grid.render(&history, Viewport::new(40, 30).scrolled(40, 15));

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].column, Column::Frame);
        assert_eq!((cells[0].x, cells[0].y), (-40, -15));
        assert_eq!((cells[1].x, cells[1].y), (-40, 15));
    }

    #[test]
    fn test_render_out_of_range_scroll_is_empty() {
        let (grid, history) = grid_with(&[3, 3]);
        assert!(grid
            .render(&history, Viewport::new(100, 100).scrolled(0, 10_000))
            .is_empty());
        assert!(grid
            .render(&history, Viewport::new(100, 100).scrolled(u64::MAX / 2, 0))
            .is_empty());
        assert!(grid
            .render(&history, Viewport::new(100, 100).scrolled(0, u64::MAX))
            .is_empty());
        assert!(grid
            .render(&history, Viewport::new(100, 100).scrolled(u64::MAX, 0))
            .is_empty());
        assert!(grid
            .render(&history, Viewport::new(u32::MAX, u32::MAX).scrolled(u64::MAX, u64::MAX))
            .is_empty());
    }

    #[test]
    fn test_render_empty_history() {
        let grid = GridView::new(GridMetrics::default(), true);
        assert!(grid.render(&CallHistory::new(), Viewport::new(500, 500)).is_empty());
    }

    #[test]
    fn test_disabled_renders_nothing() {
        let (mut grid, history) = grid_with(&[2]);
        grid.set_draw_enabled(false);
        assert!(grid.render(&history, Viewport::new(500, 500)).is_empty());
    }

    #[test]
    fn test_enable_transition_requests_redraw() {
        let mut grid = GridView::new(GridMetrics::default(), false);
        assert!(!grid.take_redraw());

        grid.set_draw_enabled(true);
        assert!(grid.take_redraw());
        assert!(!grid.take_redraw());

        // Enabled -> Enabled is a no-op
        grid.set_draw_enabled(true);
        assert!(!grid.take_redraw());

        grid.set_draw_enabled(false);
        assert!(!grid.take_redraw());
        assert_eq!(grid.draw_state(), DrawState::Disabled);
    }

    #[test]
    fn test_grow_while_disabled_never_requests_redraw() {
        let mut grid = GridView::new(GridMetrics::default(), false);
        let mut history = CallHistory::new();

        for frame in 1..=20 {
            grid.grow(&mut history, frame, vec![1; frame as usize]);
            grid.on_scroll();
            assert!(!grid.take_redraw());
        }
        // Extent still tracks growth while hidden
        assert_eq!(grid.extent().height, 20 * 30);
        assert_eq!(grid.max_columns(), 20);
    }

    #[test]
    fn test_grow_and_scroll_while_enabled_request_redraw() {
        let (mut grid, mut history) = grid_with(&[]);
        grid.grow(&mut history, 1, vec![1]);
        assert!(grid.take_redraw());

        grid.on_scroll();
        assert!(grid.take_redraw());
    }

    #[test]
    fn test_rejected_row_leaves_extent() {
        let (mut grid, mut history) = grid_with(&[2]);
        grid.take_redraw();

        assert!(!grid.grow(&mut history, 5, vec![]));
        assert!(!grid.take_redraw());
        assert_eq!(grid.extent().height, 30);
    }

    #[test]
    fn test_width_only_grows() {
        let (mut grid, mut history) = grid_with(&[4]);
        let width = grid.extent().width;

        grid.grow(&mut history, 10, vec![1]);
        assert_eq!(grid.extent().width, width);
    }

    #[test]
    fn test_clamp_scroll() {
        let (grid, _) = grid_with(&[5, 5, 5, 5]);
        let viewport = grid.clamp_scroll(Viewport::new(200, 60).scrolled(10_000, 10_000));

        assert_eq!(viewport.scroll_x, 580 - 200);
        assert_eq!(viewport.scroll_y, 120 - 60);

        let small = grid.clamp_scroll(Viewport::new(2000, 2000).scrolled(50, 50));
        assert_eq!((small.scroll_x, small.scroll_y), (0, 0));
    }

    #[test]
    fn test_reset_clears_extent() {
        let (mut grid, _) = grid_with(&[3, 3]);
        grid.take_redraw();
        grid.reset();

        assert_eq!(grid.extent(), Extent::default());
        assert_eq!(grid.max_columns(), 0);
        assert!(grid.take_redraw());
    }
}
