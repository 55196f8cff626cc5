//! The buffer facade: line storage plus every derived structure.
//!
//! All mutation funnels through [`TextBuffer::insert`],
//! [`TextBuffer::delete`], and [`TextBuffer::replace`]. Each call validates
//! its coordinates before touching anything, splices the line store, then
//! adjusts the position indexer and span store, records (or merges) an
//! undo action, bumps the generation counter, and finally emits one change
//! event to every subscriber.

use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::{BoundsError, BufferResult};
use crate::indexer::PositionIndexer;
use crate::line::{utf16_len, ContentLine};
use crate::spans::{Span, StyleSpanStore};
use crate::types::{BufferSnapshot, ChangeEvent, CharPosition};
use crate::undo::{DeleteEdit, EditAction, InsertEdit, UndoEngine};

/// The mutable, line-oriented store of document text.
///
/// Invariants:
/// - there is always at least one line; the empty document is exactly one
///   empty line
/// - lines never contain a terminator; the flat index space counts one
///   UTF-16 unit per implicit `\n` separator
/// - the indexer cache, span rows, and undo history are adjusted inside
///   every mutating call, never lazily
///
/// The buffer is `Send` but deliberately not `Sync`: there is a single
/// logical writer, and concurrent readers work from [`BufferSnapshot`]s
/// and [`ChangeEvent`]s instead of sharing the live structure.
#[derive(Debug)]
pub struct TextBuffer {
    lines: Vec<ContentLine>,
    /// Total UTF-16 units: line lengths plus one per separator.
    text_length: usize,
    indexer: PositionIndexer,
    undo: UndoEngine,
    styles: StyleSpanStore,
    generation: u64,
    subscribers: Vec<Sender<ChangeEvent>>,
    /// Cleared while undo/redo replays edits so they are not re-recorded.
    recording: bool,
}

impl TextBuffer {
    /// Creates an empty buffer: one empty line.
    pub fn new() -> Self {
        Self {
            lines: vec![ContentLine::new()],
            text_length: 0,
            indexer: PositionIndexer::new(),
            undo: UndoEngine::new(),
            styles: StyleSpanStore::new(1),
            generation: 0,
            subscribers: Vec::new(),
            recording: true,
        }
    }

    /// Creates a buffer initialized with `content`.
    ///
    /// The initial load is not undoable.
    ///
    /// Note: `FromStr` would force a `Result`, but building a buffer from a
    /// string cannot fail.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        let mut buffer = Self::new();
        if !content.is_empty() {
            buffer.undo.set_enabled(false);
            buffer
                .insert(0, 0, content)
                .expect("insertion at the buffer start is always in bounds");
            buffer.undo.set_enabled(true);
        }
        buffer
    }

    // ==================== Queries ====================

    /// Number of lines; at least 1.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total length in UTF-16 code units, separators included.
    pub fn text_length(&self) -> usize {
        self.text_length
    }

    pub fn is_empty(&self) -> bool {
        self.text_length == 0
    }

    /// Length of `line` in UTF-16 code units, excluding the separator.
    pub fn column_count(&self, line: usize) -> BufferResult<usize> {
        self.check_line(line)?;
        Ok(self.lines[line].len())
    }

    /// The UTF-16 code unit at (`line`, `column`).
    pub fn char_at(&self, line: usize, column: usize) -> BufferResult<u16> {
        self.check_line_column(line, column, false)?;
        Ok(self.lines[line].units()[column])
    }

    /// The text of `line`, without its separator.
    pub fn line_string(&self, line: usize) -> BufferResult<String> {
        self.check_line(line)?;
        Ok(self.lines[line].to_string())
    }

    /// The text between two flat indices, separators rendered as `\n`.
    pub fn sub_sequence(&self, start: usize, end: usize) -> BufferResult<String> {
        if start > end {
            return Err(BoundsError::InvertedIndexRange { start, end });
        }
        self.check_index(end)?;
        let start_pos = self.char_position(start)?;
        let end_pos = self.char_position(end)?;
        Ok(self.region_string(start_pos, end_pos))
    }

    // ==================== Position mapping ====================

    /// Resolves a flat index to a full position.
    pub fn char_position(&self, index: usize) -> BufferResult<CharPosition> {
        self.check_index(index)?;
        Ok(self
            .indexer
            .position_of_index(&self.lines, self.text_length, index))
    }

    /// Resolves (`line`, `column`) to a full position, index included.
    pub fn position_at(&self, line: usize, column: usize) -> BufferResult<CharPosition> {
        self.check_line_column(line, column, true)?;
        Ok(self
            .indexer
            .position_of(&self.lines, self.text_length, line, column))
    }

    /// The flat index of (`line`, `column`).
    pub fn char_index(&self, line: usize, column: usize) -> BufferResult<usize> {
        Ok(self.position_at(line, column)?.index)
    }

    /// Read access to the position indexer (cache inspection only; the
    /// cache itself is maintained by the buffer's mutation path).
    pub fn indexer(&self) -> &PositionIndexer {
        &self.indexer
    }

    // ==================== Mutation ====================

    /// Inserts `text` at (`line`, `column`) and returns the end position.
    ///
    /// Text before the first line break is spliced into the existing line;
    /// each break starts a new line; the original line's suffix ends up
    /// after the inserted tail. Line breaks are normalized to `\n`.
    pub fn insert(&mut self, line: usize, column: usize, text: &str) -> BufferResult<CharPosition> {
        self.check_line_column(line, column, true)?;
        let text = normalize_terminators(text);
        if text.is_empty() {
            return self.position_at(line, column);
        }
        let start = self.position_at(line, column)?;
        let inserted = text.into_owned();

        let end = self.splice_in(start, &inserted);
        self.finish_edit(start, start, end, String::new(), inserted);
        Ok(end)
    }

    /// Deletes the region between two positions and returns the removed
    /// text (exactly what an undo must re-insert).
    ///
    /// Equal positions are a no-op. Otherwise the start line's prefix and
    /// the end line's suffix are joined into one line and everything
    /// between them is removed.
    pub fn delete(
        &mut self,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> BufferResult<String> {
        self.check_delete_range(start_line, start_column, end_line, end_column)?;
        if (start_line, start_column) == (end_line, end_column) {
            return Ok(String::new());
        }
        let start = self.position_at(start_line, start_column)?;
        let end = self.position_at(end_line, end_column)?;

        let removed = self.splice_out(start, end);
        self.finish_edit(start, end, start, removed.clone(), String::new());
        Ok(removed)
    }

    /// Replaces the region between two positions with `text`, as one
    /// logical edit: one undo step, one change event. Returns the end of
    /// the inserted text.
    pub fn replace(
        &mut self,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
        text: &str,
    ) -> BufferResult<CharPosition> {
        self.check_delete_range(start_line, start_column, end_line, end_column)?;
        let text = normalize_terminators(text);
        let start = self.position_at(start_line, start_column)?;
        let old_end = self.position_at(end_line, end_column)?;
        if start == old_end && text.is_empty() {
            return Ok(start);
        }
        let inserted = text.into_owned();

        let removed = if start == old_end {
            String::new()
        } else {
            let removed = self.splice_out(start, old_end);
            self.indexer.after_delete(start, old_end, utf16_len(&removed));
            self.styles.adjust_on_delete(start, old_end);
            removed
        };
        let new_end = if inserted.is_empty() {
            start
        } else {
            let end = self.splice_in(start, &inserted);
            self.indexer.after_insert(start, end, utf16_len(&inserted));
            self.styles.adjust_on_insert(start, end);
            end
        };

        if self.recording {
            self.undo.record(EditAction::Replace {
                delete: DeleteEdit {
                    start,
                    end: old_end,
                    text: removed.clone(),
                },
                insert: InsertEdit {
                    start,
                    end: new_end,
                    text: inserted.clone(),
                },
            });
        }
        self.generation += 1;
        self.emit(start, old_end, new_end, removed, inserted);
        Ok(new_end)
    }

    // ==================== Undo / redo ====================

    /// Reverts the most recent undo step. Returns `false` when there is
    /// nothing to undo (or a batch is still open).
    pub fn undo(&mut self) -> bool {
        if self.undo.is_in_batch() {
            return false;
        }
        let Some(action) = self.undo.pop_for_undo() else {
            return false;
        };
        self.recording = false;
        action.undo(self);
        self.recording = true;
        self.undo.push_undone(action);
        true
    }

    /// Re-applies the most recently undone step. Returns `false` when the
    /// redo stack is empty (or a batch is still open).
    pub fn redo(&mut self) -> bool {
        if self.undo.is_in_batch() {
            return false;
        }
        let Some(action) = self.undo.pop_for_redo() else {
            return false;
        };
        self.recording = false;
        action.redo(self);
        self.recording = true;
        self.undo.push_redone(action);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_in_batch() && self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.undo.is_in_batch() && self.undo.can_redo()
    }

    /// Enters a batch-edit layer: everything recorded until the matching
    /// [`end_batch_edit`](TextBuffer::end_batch_edit) undoes and redoes
    /// atomically. Layers nest. Returns whether a batch is now open.
    pub fn begin_batch_edit(&mut self) -> bool {
        self.undo.begin_batch();
        self.undo.is_in_batch()
    }

    /// Leaves a batch-edit layer. Returns whether a batch is still open.
    pub fn end_batch_edit(&mut self) -> bool {
        self.undo.end_batch();
        self.undo.is_in_batch()
    }

    pub fn is_in_batch_edit(&self) -> bool {
        self.undo.is_in_batch()
    }

    pub fn undo_engine(&self) -> &UndoEngine {
        &self.undo
    }

    /// Replaces the undo engine, e.g. to restore a saved history.
    pub fn set_undo_engine(&mut self, engine: UndoEngine) {
        self.undo = engine;
    }

    pub fn set_undo_enabled(&mut self, enabled: bool) {
        self.undo.set_enabled(enabled);
    }

    pub fn set_max_undo_stack_size(&mut self, max_size: usize) {
        self.undo.set_max_stack_size(max_size);
    }

    // ==================== Style spans ====================

    /// The style spans of `line`; an unanalyzed line reads as one plain
    /// span.
    pub fn line_spans(&self, line: usize) -> BufferResult<&[Span]> {
        self.check_line(line)?;
        Ok(self.styles.line_spans(line))
    }

    /// Publishes analyzer output for `line`, replacing its spans.
    pub fn set_line_spans(&mut self, line: usize, spans: Vec<Span>) -> BufferResult<()> {
        self.check_line(line)?;
        self.styles.set_line_spans(line, spans);
        Ok(())
    }

    pub fn span_store(&self) -> &StyleSpanStore {
        &self.styles
    }

    // ==================== Analysis support ====================

    /// The edit generation: bumped by every structural edit, undo and redo
    /// included. Background analysis compares this against the generation
    /// of the snapshot it read to detect staleness.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Takes an immutable snapshot of the full text for background work.
    /// This is O(document size).
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot::new(
            Arc::from(self.to_string()),
            self.generation,
            self.lines.len(),
        )
    }

    /// Registers a change-event subscriber. Every structural edit sends
    /// one [`ChangeEvent`]; a dropped receiver unsubscribes itself.
    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    // ==================== Internals ====================

    /// Splices `text` (normalized, non-empty) into the line store at
    /// `start` and returns the end position. Updates `text_length` only.
    fn splice_in(&mut self, start: CharPosition, text: &str) -> CharPosition {
        let units = utf16_len(text);
        let line = start.line;
        let column = start.column;

        let mut segments = text.split('\n');
        let first = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();

        let (end_line, end_column) = if rest.is_empty() {
            self.lines[line].insert_text(column, first);
            (line, column + utf16_len(first))
        } else {
            let tail = self.lines[line].split_off(column);
            self.lines[line].insert_text(column, first);
            let mut new_lines: Vec<ContentLine> =
                rest.iter().map(|segment| ContentLine::from(*segment)).collect();
            let last = new_lines
                .last_mut()
                .expect("rest is non-empty in the multi-line branch");
            let end_column = last.len();
            last.extend_from_units(&tail);
            let end_line = line + new_lines.len();
            self.lines.splice(line + 1..line + 1, new_lines);
            (end_line, end_column)
        };

        self.text_length += units;
        CharPosition::new(start.index + units, end_line, end_column)
    }

    /// Removes the region `start..end` (non-empty) from the line store and
    /// returns the removed text. Updates `text_length` only.
    fn splice_out(&mut self, start: CharPosition, end: CharPosition) -> String {
        let removed = if start.line == end.line {
            self.lines[start.line].remove_range(start.column, end.column)
        } else {
            let mut removed = String::new();
            let start_tail = self.lines[start.line].split_off(start.column);
            let mut tail_line = ContentLine::new();
            tail_line.extend_from_units(&start_tail);
            tail_line.append_to(&mut removed);
            removed.push('\n');
            for line in self.lines.drain(start.line + 1..end.line) {
                line.append_to(&mut removed);
                removed.push('\n');
            }
            // After the drain, the old end line sits right after the start.
            let mut end_line = self.lines.remove(start.line + 1);
            let kept_tail = end_line.split_off(end.column);
            end_line.append_to(&mut removed);
            self.lines[start.line].extend_from_units(&kept_tail);
            removed
        };
        self.text_length -= utf16_len(&removed);
        removed
    }

    /// Common tail of insert/delete: derived-state adjustment, undo
    /// recording, generation bump, event emission.
    fn finish_edit(
        &mut self,
        start: CharPosition,
        old_end: CharPosition,
        new_end: CharPosition,
        removed: String,
        inserted: String,
    ) {
        if removed.is_empty() {
            let units = utf16_len(&inserted);
            self.indexer.after_insert(start, new_end, units);
            self.styles.adjust_on_insert(start, new_end);
            if self.recording {
                self.undo.record(EditAction::Insert(InsertEdit {
                    start,
                    end: new_end,
                    text: inserted.clone(),
                }));
            }
        } else {
            let units = utf16_len(&removed);
            self.indexer.after_delete(start, old_end, units);
            self.styles.adjust_on_delete(start, old_end);
            if self.recording {
                self.undo.record(EditAction::Delete(DeleteEdit {
                    start,
                    end: old_end,
                    text: removed.clone(),
                }));
            }
        }
        self.generation += 1;
        self.emit(start, old_end, new_end, removed, inserted);
    }

    fn emit(
        &mut self,
        start: CharPosition,
        old_end: CharPosition,
        new_end: CharPosition,
        removed: String,
        inserted: String,
    ) {
        if self.subscribers.is_empty() {
            return;
        }
        let event = ChangeEvent {
            generation: self.generation,
            start,
            old_end,
            new_end,
            removed,
            inserted,
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn region_string(&self, start: CharPosition, end: CharPosition) -> String {
        if start.line == end.line {
            return self.lines[start.line].substring(start.column, end.column);
        }
        let mut out = self.lines[start.line].substring(start.column, self.lines[start.line].len());
        out.push('\n');
        for line in &self.lines[start.line + 1..end.line] {
            line.append_to(&mut out);
            out.push('\n');
        }
        out.push_str(&self.lines[end.line].substring(0, end.column));
        out
    }

    // ==================== Validation ====================

    fn check_line(&self, line: usize) -> BufferResult<()> {
        if line >= self.lines.len() {
            return Err(BoundsError::Line {
                line,
                line_count: self.lines.len(),
            });
        }
        Ok(())
    }

    fn check_line_column(&self, line: usize, column: usize, allow_equal: bool) -> BufferResult<()> {
        self.check_line(line)?;
        let column_count = self.lines[line].len();
        if column > column_count || (!allow_equal && column == column_count) {
            return Err(BoundsError::Column {
                line,
                column,
                column_count,
            });
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> BufferResult<()> {
        if index > self.text_length {
            return Err(BoundsError::Index {
                index,
                length: self.text_length,
            });
        }
        Ok(())
    }

    fn check_delete_range(
        &self,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> BufferResult<()> {
        self.check_line_column(start_line, start_column, true)?;
        self.check_line_column(end_line, end_column, true)?;
        if (end_line, end_column) < (start_line, start_column) {
            return Err(BoundsError::InvertedRange {
                start_line,
                start_column,
                end_line,
                end_column,
            });
        }
        Ok(())
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Normalizes `\r\n` and lone `\r` line breaks to `\n`.
fn normalize_terminators(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}
