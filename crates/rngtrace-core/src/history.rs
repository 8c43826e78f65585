//! Per-frame call history.
//!
//! An append-only arena of rows, one per frame that had at least one RNG
//! call. Rows are addressed newest-first so the grid can index straight into
//! it without walking older rows.

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameCalls {
    pub frame: u64,
    /// Caller addresses in call order
    pub calls: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct CallHistory {
    rows: Vec<FrameCalls>,
    max_columns: usize,
}

impl CallHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame's calls.
    ///
    /// Empty call lists and frames that do not advance past the last row are
    /// dropped; returns whether a row was added.
    pub fn append(&mut self, frame: u64, calls: Vec<u32>) -> bool {
        if calls.is_empty() {
            return false;
        }
        if let Some(last) = self.rows.last()
            && frame <= last.frame
        {
            warn!(
                "Dropping calls for frame {} (last recorded frame is {})",
                frame, last.frame
            );
            return false;
        }

        self.max_columns = self.max_columns.max(calls.len());
        self.rows.push(FrameCalls { frame, calls });
        true
    }

    /// Row by logical index, 0 being the most recently appended
    pub fn row(&self, index: usize) -> Option<&FrameCalls> {
        let len = self.rows.len();
        if index >= len {
            return None;
        }
        self.rows.get(len - 1 - index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of calls in the given row, 0 past the end
    pub fn column_count(&self, index: usize) -> usize {
        self.row(index).map_or(0, |row| row.calls.len())
    }

    /// Widest row seen so far
    pub fn max_columns(&self) -> usize {
        self.max_columns
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.max_columns = 0;
    }
}
