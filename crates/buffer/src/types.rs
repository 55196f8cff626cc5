//! Core value types shared across the buffer engine.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A location in the buffer as an (index, line, column) triple.
///
/// `line` and `column` are 0-indexed; `column` is a UTF-16 code unit offset
/// within the line, so a supplementary-plane character occupies two columns.
/// `index` is the number of UTF-16 code units preceding the position when
/// the buffer is flattened with one separator unit per line break.
///
/// Positions order by `(line, column)`; `index` is strictly monotonic in
/// that order, so the two views never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharPosition {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl CharPosition {
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
        }
    }

    /// The position of the buffer start.
    pub fn zero() -> Self {
        Self::default()
    }
}

impl PartialOrd for CharPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CharPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        // Line first, then column. The index tiebreak never fires for
        // positions taken from the same buffer state but keeps the ordering
        // consistent with equality.
        (self.line, self.column, self.index).cmp(&(other.line, other.column, other.index))
    }
}

/// Notification payload for one structural edit.
///
/// Exactly one event is emitted per logical edit, after the line store and
/// every derived structure (indexer, span store, undo history) have been
/// brought up to date:
///
/// - insertion: `old_end == start`, `removed` is empty
/// - deletion: `new_end == start`, `inserted` is empty
/// - replacement: both texts are populated
///
/// Events are also emitted while undo/redo replays edits; only undo
/// *recording* is suppressed during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Buffer generation after this edit was applied.
    pub generation: u64,
    /// Where the edit begins.
    pub start: CharPosition,
    /// End of the affected range before the edit.
    pub old_end: CharPosition,
    /// End of the affected range after the edit.
    pub new_end: CharPosition,
    /// The exact text removed (line breaks normalized to `\n`).
    pub removed: String,
    /// The exact text inserted (line breaks normalized to `\n`).
    pub inserted: String,
}

/// An immutable view of the buffer text for background analysis.
///
/// Snapshots are cheap to clone and safe to ship across threads. A worker
/// that produced spans from a snapshot must compare [`generation`] against
/// the live buffer before publishing; a mismatch means the text has moved
/// on and the result is stale.
///
/// [`generation`]: BufferSnapshot::generation
#[derive(Debug, Clone)]
pub struct BufferSnapshot {
    text: Arc<str>,
    generation: u64,
    line_count: usize,
}

impl BufferSnapshot {
    pub(crate) fn new(text: Arc<str>, generation: u64, line_count: usize) -> Self {
        Self {
            text,
            generation,
            line_count,
        }
    }

    /// The full buffer text, lines joined with `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The buffer generation this snapshot was taken at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of lines in the snapshot.
    pub fn line_count(&self) -> usize {
        self.line_count
    }
}
