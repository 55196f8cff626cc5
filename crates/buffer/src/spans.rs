//! Per-line style spans that survive edits without full re-analysis.
//!
//! Analyzers publish one ordered span list per line; every structural edit
//! shifts, trims, or discards the affected spans so consumers always read
//! positionally valid styling, while stale content simply reverts to the
//! plain style until the analyzer catches up.

use serde::{Deserialize, Serialize};

use crate::types::CharPosition;

/// Identifier for a rendering style, resolved by the consumer's theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleId(pub u32);

impl StyleId {
    /// Style of text no analyzer has classified yet.
    pub const PLAIN: StyleId = StyleId(0);
}

/// A styling run starting at `column` and extending to the next span on
/// the line (or the end of the line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// UTF-16 unit column where this run begins.
    pub column: usize,
    pub style: StyleId,
    /// Underline color, when the analyzer wants one (diagnostics etc.).
    pub underline: Option<StyleId>,
}

impl Span {
    pub fn new(column: usize, style: StyleId) -> Self {
        Self {
            column,
            style,
            underline: None,
        }
    }

    /// A plain-styled span at `column`.
    pub fn plain(column: usize) -> Self {
        Self::new(column, StyleId::PLAIN)
    }
}

/// What an unanalyzed line reads as: one plain span covering everything.
const DEFAULT_ROW: &[Span] = &[Span {
    column: 0,
    style: StyleId::PLAIN,
    underline: None,
}];

/// Ordered-by-line collection of line-local ordered-by-column span lists.
///
/// The store keeps exactly one row per buffer line (the owning buffer
/// splices rows in lock-step with line edits). Rows the analyzer has not
/// written yet read as a single plain span, so a consumer never sees "no
/// style". Within a row, spans are sorted by non-decreasing column and the
/// first span sits at column 0.
#[derive(Debug, Clone, Default)]
pub struct StyleSpanStore {
    rows: Vec<Vec<Span>>,
}

impl StyleSpanStore {
    pub(crate) fn new(line_count: usize) -> Self {
        Self {
            rows: vec![Vec::new(); line_count],
        }
    }

    /// Number of rows; always equals the owning buffer's line count.
    pub fn line_count(&self) -> usize {
        self.rows.len()
    }

    /// The spans of `line`. An unanalyzed line reads as one plain span.
    ///
    /// # Panics
    ///
    /// Panics if `line` is out of bounds; go through
    /// [`TextBuffer::line_spans`](crate::TextBuffer::line_spans) for a
    /// checked read.
    pub fn line_spans(&self, line: usize) -> &[Span] {
        let row = &self.rows[line];
        if row.is_empty() {
            DEFAULT_ROW
        } else {
            row
        }
    }

    /// Replaces the spans of `line`, normalizing the row invariants:
    /// spans are sorted by column and the row starts at column 0.
    ///
    /// # Panics
    ///
    /// Panics if `line` is out of bounds; go through
    /// [`TextBuffer::set_line_spans`](crate::TextBuffer::set_line_spans)
    /// for a checked write.
    pub fn set_line_spans(&mut self, line: usize, mut spans: Vec<Span>) {
        spans.sort_by_key(|span| span.column);
        if spans.first().map_or(true, |span| span.column != 0) {
            spans.insert(0, Span::plain(0));
        }
        self.rows[line] = spans;
    }

    /// Shifts spans for an insertion spanning `start..end`.
    pub(crate) fn adjust_on_insert(&mut self, start: CharPosition, end: CharPosition) {
        if start.line == end.line {
            let row = &mut self.rows[start.line];
            if row.is_empty() {
                return;
            }
            let delta = end.column - start.column;
            if let Some(first) = row.iter().position(|span| span.column >= start.column) {
                for span in &mut row[first..] {
                    span.column += delta;
                }
                if first == 0 {
                    row.insert(0, Span::plain(0));
                }
            }
        } else {
            // Content after the insertion point moved to a new line and
            // must be re-supplied by analysis; the new lines start out
            // unanalyzed.
            self.rows[start.line].retain(|span| span.column <= start.column);
            let at = start.line + 1;
            let new_rows = end.line - start.line;
            self.rows
                .splice(at..at, std::iter::repeat_with(Vec::new).take(new_rows));
        }
    }

    /// Drops and shifts spans for a deletion of `start..end`.
    pub(crate) fn adjust_on_delete(&mut self, start: CharPosition, end: CharPosition) {
        if start.line == end.line {
            self.adjust_single_line_delete(start.line, start.column, end.column);
        } else {
            self.adjust_multi_line_delete(start, end);
        }
    }

    fn adjust_single_line_delete(&mut self, line: usize, start_col: usize, end_col: usize) {
        let row = &mut self.rows[line];
        if row.is_empty() {
            return;
        }
        let delta = end_col - start_col;
        let Some(first) = row.iter().position(|span| span.column >= start_col) else {
            return;
        };
        // Spans strictly inside the removed range disappear with it.
        let after = row[first..]
            .iter()
            .position(|span| span.column >= end_col)
            .map(|offset| first + offset)
            .unwrap_or(row.len());
        row.drain(first..after);
        for span in &mut row[first..] {
            span.column -= delta;
        }
        ensure_line_start(row);
        collapse_empty_runs(row);
    }

    fn adjust_multi_line_delete(&mut self, start: CharPosition, end: CharPosition) {
        // Rows strictly between the endpoints vanish with their lines; the
        // end row's survivors migrate onto the start row.
        let mut removed: Vec<Vec<Span>> = self.rows.drain(start.line + 1..=end.line).collect();
        let end_row = removed.pop().unwrap_or_default();

        let row = &mut self.rows[start.line];
        // Trim the start row back to the join column, keeping its first
        // span as the seam style.
        while row.len() > 1 && row.last().is_some_and(|span| span.column >= start.column) {
            row.pop();
        }

        if !end_row.is_empty() {
            let shift = start.column as isize - end.column as isize;
            let mut migrated: Vec<Span> = end_row
                .into_iter()
                .map(|span| Span {
                    column: (span.column as isize + shift).max(0) as usize,
                    ..span
                })
                .collect();
            // Spans that covered the deleted prefix collapse onto the seam.
            while migrated.len() > 1
                && migrated[0].column <= start.column
                && migrated[1].column <= start.column
            {
                migrated.remove(0);
            }
            if let Some(first) = migrated.first_mut() {
                if first.column < start.column {
                    first.column = start.column;
                }
            }
            row.extend(migrated);
        }

        ensure_line_start(row);
        collapse_empty_runs(row);
    }
}

/// Guarantees the row invariant that styling starts at column 0.
fn ensure_line_start(row: &mut Vec<Span>) {
    if row.first().map_or(false, |span| span.column != 0) {
        row.insert(0, Span::plain(0));
    }
}

/// Removes zero-width runs, keeping the later span at each column.
fn collapse_empty_runs(row: &mut Vec<Span>) {
    let mut i = 0;
    while i + 1 < row.len() {
        if row[i].column >= row[i + 1].column {
            row.remove(i);
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(index: usize, line: usize, column: usize) -> CharPosition {
        CharPosition::new(index, line, column)
    }

    fn span(column: usize, style: u32) -> Span {
        Span::new(column, StyleId(style))
    }

    fn columns(spans: &[Span]) -> Vec<usize> {
        spans.iter().map(|s| s.column).collect()
    }

    #[test]
    fn unanalyzed_line_reads_as_one_plain_span() {
        let store = StyleSpanStore::new(3);
        assert_eq!(store.line_spans(1), &[Span::plain(0)]);
    }

    #[test]
    fn write_normalizes_missing_line_start() {
        let mut store = StyleSpanStore::new(1);
        store.set_line_spans(0, vec![span(4, 7)]);
        assert_eq!(store.line_spans(0), &[Span::plain(0), span(4, 7)]);
    }

    #[test]
    fn write_sorts_by_column() {
        let mut store = StyleSpanStore::new(1);
        store.set_line_spans(0, vec![span(8, 2), span(0, 1), span(4, 3)]);
        assert_eq!(columns(store.line_spans(0)), vec![0, 4, 8]);
    }

    // ==================== Insert adjustment ====================

    #[test]
    fn single_line_insert_shifts_spans_at_or_after_column() {
        let mut store = StyleSpanStore::new(2);
        store.set_line_spans(0, vec![span(0, 1), span(4, 2), span(8, 3)]);
        store.set_line_spans(1, vec![span(0, 4), span(2, 5)]);

        // Insert 3 units at (0, 4).
        store.adjust_on_insert(pos(4, 0, 4), pos(7, 0, 7));
        assert_eq!(columns(store.line_spans(0)), vec![0, 7, 11]);
        // Other lines untouched.
        assert_eq!(columns(store.line_spans(1)), vec![0, 2]);
    }

    #[test]
    fn insert_at_line_start_restores_column_zero_span() {
        let mut store = StyleSpanStore::new(1);
        store.set_line_spans(0, vec![span(0, 9)]);
        store.adjust_on_insert(pos(0, 0, 0), pos(2, 0, 2));
        let spans = store.line_spans(0);
        assert_eq!(spans[0], Span::plain(0));
        assert_eq!(spans[1], span(2, 9));
    }

    #[test]
    fn insert_into_unanalyzed_line_stays_unanalyzed() {
        let mut store = StyleSpanStore::new(1);
        store.adjust_on_insert(pos(0, 0, 0), pos(5, 0, 5));
        assert_eq!(store.line_spans(0), &[Span::plain(0)]);
    }

    #[test]
    fn multi_line_insert_discards_moved_spans_and_adds_rows() {
        let mut store = StyleSpanStore::new(2);
        store.set_line_spans(0, vec![span(0, 1), span(3, 2), span(6, 3)]);
        store.set_line_spans(1, vec![span(0, 4)]);

        // Insert "xx\nyy" at (0, 4): one new line.
        store.adjust_on_insert(pos(4, 0, 4), pos(9, 1, 2));
        assert_eq!(store.line_count(), 3);
        // Spans after column 4 belonged to content that moved away.
        assert_eq!(columns(store.line_spans(0)), vec![0, 3]);
        // The new line awaits analysis.
        assert_eq!(store.line_spans(1), &[Span::plain(0)]);
        // The old line 1 is now line 2, untouched.
        assert_eq!(store.line_spans(2), &[span(0, 4)]);
    }

    // ==================== Delete adjustment ====================

    #[test]
    fn single_line_delete_drops_inner_spans_and_shifts() {
        let mut store = StyleSpanStore::new(1);
        store.set_line_spans(0, vec![span(0, 1), span(4, 2), span(8, 3), span(12, 4)]);

        // Delete (0,2)..(0,10): spans at 4 and 8 are inside the range.
        store.adjust_on_delete(pos(2, 0, 2), pos(10, 0, 10));
        let spans = store.line_spans(0);
        assert_eq!(columns(spans), vec![0, 4]);
        assert_eq!(spans[1].style, StyleId(4));
    }

    #[test]
    fn delete_at_line_start_keeps_column_zero() {
        let mut store = StyleSpanStore::new(1);
        store.set_line_spans(0, vec![span(0, 1), span(2, 2), span(5, 3)]);

        // Delete (0,0)..(0,3): the spans at 0 and 2 die with their text and
        // a plain span re-covers the line start; the one at 5 shifts to 2.
        store.adjust_on_delete(pos(0, 0, 0), pos(3, 0, 3));
        let spans = store.line_spans(0);
        assert_eq!(columns(spans), vec![0, 2]);
        assert_eq!(spans[0].style, StyleId::PLAIN);
        assert_eq!(spans[1].style, StyleId(3));
    }

    #[test]
    fn deleting_a_whole_line_removes_exactly_its_spans() {
        let mut store = StyleSpanStore::new(3);
        store.set_line_spans(0, vec![span(0, 1)]);
        store.set_line_spans(1, vec![span(0, 2), span(3, 22)]);
        store.set_line_spans(2, vec![span(0, 3)]);

        // Delete line 1 entirely: (1,0)..(2,0).
        store.adjust_on_delete(pos(10, 1, 0), pos(14, 2, 0));
        assert_eq!(store.line_count(), 2);
        assert_eq!(store.line_spans(0), &[span(0, 1)]);
        // Line 2's spans are now line 1's.
        assert_eq!(store.line_spans(1), &[span(0, 3)]);
    }

    #[test]
    fn multi_line_delete_merges_surviving_end_spans() {
        let mut store = StyleSpanStore::new(3);
        store.set_line_spans(0, vec![span(0, 1), span(2, 11), span(6, 12)]);
        store.set_line_spans(1, vec![span(0, 2)]);
        store.set_line_spans(2, vec![span(0, 3), span(4, 31), span(7, 32)]);

        // Delete (0,3)..(2,5): line 1 vanishes, line 2's suffix joins line 0.
        store.adjust_on_delete(pos(3, 0, 3), pos(14, 2, 5));
        assert_eq!(store.line_count(), 1);
        let spans = store.line_spans(0);
        // Start row keeps [0, 2]; the span at 7 shifts by 3-5 to 5.
        assert_eq!(columns(spans), vec![0, 2, 3, 5]);
        assert_eq!(spans[2].style, StyleId(31));
        assert_eq!(spans[3].style, StyleId(32));
    }

    #[test]
    fn delete_collapses_duplicate_columns_keeping_the_later_span() {
        let mut store = StyleSpanStore::new(1);
        store.set_line_spans(0, vec![span(0, 1), span(2, 2), span(4, 3)]);

        // Delete (0,2)..(0,4): the span at 4 lands exactly on column 2.
        store.adjust_on_delete(pos(2, 0, 2), pos(4, 0, 4));
        let spans = store.line_spans(0);
        assert_eq!(columns(spans), vec![0, 2]);
        assert_eq!(spans[1].style, StyleId(3));
    }

    #[test]
    fn delete_on_unanalyzed_lines_is_a_no_op() {
        let mut store = StyleSpanStore::new(2);
        store.adjust_on_delete(pos(2, 0, 2), pos(7, 1, 1));
        assert_eq!(store.line_count(), 1);
        assert_eq!(store.line_spans(0), &[Span::plain(0)]);
    }
}
