//! vellum-buffer: the line-oriented text buffer engine for vellum.
//!
//! This crate is the mutable, in-memory store of document text plus the
//! derived structures an editor core needs:
//!
//! - [`TextBuffer`]: line storage with validated insert/delete/replace
//! - [`PositionIndexer`]: incremental index ⇄ (line, column) translation
//!   with a sequential-access cache
//! - [`EditAction`]/[`UndoEngine`]: recorded, coalescing, bounded
//!   undo/redo with atomic batch grouping
//! - [`StyleSpanStore`]: per-line style spans that are shifted and trimmed
//!   across edits instead of re-derived
//!
//! All coordinates are UTF-16 code units: a column is a unit offset within
//! a line, and a flat index counts units from the buffer start with one
//! unit per implicit `\n` separator. Supplementary-plane characters
//! therefore occupy two columns, matching the span and edit-action
//! coordinate space exactly.
//!
//! # Example
//!
//! ```
//! use vellum_buffer::TextBuffer;
//!
//! let mut buffer = TextBuffer::new();
//! buffer.insert(0, 0, "ab\ncd").unwrap();
//! assert_eq!(buffer.line_count(), 2);
//!
//! let removed = buffer.delete(0, 1, 1, 1).unwrap();
//! assert_eq!(removed, "b\nc");
//! assert_eq!(buffer.to_string(), "ad");
//!
//! buffer.undo();
//! assert_eq!(buffer.to_string(), "ab\ncd");
//! buffer.undo();
//! assert_eq!(buffer.to_string(), "");
//! ```
//!
//! # Concurrency
//!
//! The buffer has a single logical writer and is not `Sync`. Concurrent
//! consumers (background analyzers, renderers on other threads) work from
//! immutable [`BufferSnapshot`]s and the [`ChangeEvent`] stream returned
//! by [`TextBuffer::subscribe`], and publish derived results back on the
//! owner thread after checking [`TextBuffer::generation`] for staleness.

mod error;
mod indexer;
mod line;
mod spans;
mod text_buffer;
mod types;
mod undo;

pub use error::{BoundsError, BufferResult};
pub use indexer::PositionIndexer;
pub use line::ContentLine;
pub use spans::{Span, StyleId, StyleSpanStore};
pub use text_buffer::TextBuffer;
pub use types::{BufferSnapshot, ChangeEvent, CharPosition};
pub use undo::{
    DeleteEdit, EditAction, InsertEdit, UndoEngine, DEFAULT_MAX_UNDO_STACK_SIZE,
    DEFAULT_MERGE_CEILING,
};
