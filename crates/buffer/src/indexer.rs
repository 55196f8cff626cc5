//! Incremental translation between flat indices and (line, column).
//!
//! Every query starts from the nearest of three anchors: the buffer start,
//! the buffer end, or the cached result of the previous query, and walks
//! line lengths from there. Sequential access (typing, cursor motion,
//! streaming analysis) therefore pays O(1) amortized instead of rescanning
//! the document.

use std::cell::Cell;

use crate::line::ContentLine;
use crate::types::CharPosition;

/// Position cache for index ⇄ (line, column) queries.
///
/// The cache holds the single most recent result in a `Cell`, so queries
/// take `&self`; the buffer that owns the indexer is the only mutator and
/// is not `Sync`, which confines the interior mutability to the owner
/// thread. On every structural edit the owning buffer calls
/// [`after_insert`]/[`after_delete`] so the cached position either shifts
/// with the text or is dropped when the edit straddles it.
///
/// All methods take the line store by reference; the indexer itself never
/// owns text. Callers are responsible for passing validated coordinates.
///
/// [`after_insert`]: PositionIndexer::after_insert
/// [`after_delete`]: PositionIndexer::after_delete
#[derive(Debug, Default)]
pub struct PositionIndexer {
    cache: Cell<Option<CharPosition>>,
}

impl PositionIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached position from the previous query, if still valid.
    pub fn cached_position(&self) -> Option<CharPosition> {
        self.cache.get()
    }

    /// Resolves a flat `index` (valid: `0..=text_length`) to a position.
    pub(crate) fn position_of_index(
        &self,
        lines: &[ContentLine],
        text_length: usize,
        index: usize,
    ) -> CharPosition {
        let end = end_anchor(lines, text_length);
        let mut anchor = CharPosition::zero();
        if let Some(cached) = self.cache.get() {
            if cached.index.abs_diff(index) < anchor.index.abs_diff(index) {
                anchor = cached;
            }
        }
        if end.index.abs_diff(index) < anchor.index.abs_diff(index) {
            anchor = end;
        }

        let found = if anchor.index <= index {
            walk_index_forward(lines, anchor, index)
        } else {
            walk_index_backward(lines, anchor, index)
        };
        self.cache.set(Some(found));
        found
    }

    /// Resolves a (line, column) pair (column valid: `0..=line length`) to
    /// a full position.
    pub(crate) fn position_of(
        &self,
        lines: &[ContentLine],
        text_length: usize,
        line: usize,
        column: usize,
    ) -> CharPosition {
        let end = end_anchor(lines, text_length);
        let mut anchor = CharPosition::zero();
        if let Some(cached) = self.cache.get() {
            if cached.line.abs_diff(line) < anchor.line.abs_diff(line) {
                anchor = cached;
            }
        }
        if end.line.abs_diff(line) < anchor.line.abs_diff(line) {
            anchor = end;
        }

        // Move the anchor to the start of its own line, then walk whole
        // lines until the target line is reached.
        let mut index = anchor.index - anchor.column;
        if anchor.line <= line {
            for l in anchor.line..line {
                index += lines[l].len() + 1;
            }
        } else {
            for l in line..anchor.line {
                index -= lines[l].len() + 1;
            }
        }

        let found = CharPosition::new(index + column, line, column);
        self.cache.set(Some(found));
        found
    }

    /// Adjusts the cache after text was inserted from `start` to `end`.
    ///
    /// The cached position shifts right/down when the insertion happened at
    /// or before it, and is untouched when the insertion is after it.
    pub(crate) fn after_insert(
        &self,
        start: CharPosition,
        end: CharPosition,
        inserted_units: usize,
    ) {
        let Some(mut pos) = self.cache.get() else {
            return;
        };
        if pos.line == start.line && pos.column >= start.column {
            pos.index += inserted_units;
            pos.line += end.line - start.line;
            pos.column = end.column + (pos.column - start.column);
            self.cache.set(Some(pos));
        } else if pos.line > start.line {
            pos.index += inserted_units;
            pos.line += end.line - start.line;
            self.cache.set(Some(pos));
        }
    }

    /// Adjusts the cache after the range `start..end` was deleted.
    ///
    /// A cached position inside the removed region is invalidated; one past
    /// it shifts left/up by the removed amount.
    pub(crate) fn after_delete(
        &self,
        start: CharPosition,
        end: CharPosition,
        removed_units: usize,
    ) {
        let Some(mut pos) = self.cache.get() else {
            return;
        };
        let straddled = (pos.line == start.line && pos.column >= start.column)
            || (pos.line > start.line && pos.line <= end.line);
        if straddled {
            self.cache.set(None);
        } else if pos.line > end.line {
            pos.index -= removed_units;
            pos.line -= end.line - start.line;
            self.cache.set(Some(pos));
        }
    }
}

/// The position just past the last character of the buffer.
fn end_anchor(lines: &[ContentLine], text_length: usize) -> CharPosition {
    let last = lines.len() - 1;
    CharPosition::new(text_length, last, lines[last].len())
}

fn walk_index_forward(lines: &[ContentLine], start: CharPosition, index: usize) -> CharPosition {
    let mut line = start.line;
    // Jump to the end of the anchor line, then step whole lines.
    let mut column = lines[line].len();
    let mut at = start.index + (column - start.column);
    while at < index {
        line += 1;
        column = lines[line].len();
        at += column + 1;
    }
    if at > index {
        column -= at - index;
    }
    CharPosition::new(index, line, column)
}

fn walk_index_backward(lines: &[ContentLine], start: CharPosition, index: usize) -> CharPosition {
    let mut line = start.line as isize;
    let mut column = start.column as isize;
    let mut at = start.index as isize;
    let target = index as isize;
    while at > target {
        at -= column + 1;
        line -= 1;
        if line >= 0 {
            column = lines[line as usize].len() as isize;
        } else {
            // Overshot the buffer start; the forward walk handles the rest.
            return walk_index_forward(lines, CharPosition::zero(), index);
        }
    }
    let overshoot = target - at;
    if overshoot > 0 {
        line += 1;
        column = overshoot - 1;
    }
    CharPosition::new(index, line as usize, column as usize)
}
