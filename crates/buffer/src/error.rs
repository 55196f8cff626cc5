//! Bounds-error taxonomy for the buffer's public API.

use thiserror::Error;

/// A caller-supplied coordinate fell outside the buffer.
///
/// Every variant names the offending coordinate and the bound it violated.
/// Checks run before any mutation, so a failed call always leaves the
/// buffer exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoundsError {
    #[error("line {line} out of bounds (line count {line_count})")]
    Line { line: usize, line_count: usize },

    #[error("column {column} out of bounds on line {line} (column count {column_count})")]
    Column {
        line: usize,
        column: usize,
        column_count: usize,
    },

    #[error("index {index} out of bounds (length {length})")]
    Index { index: usize, length: usize },

    #[error(
        "range start ({start_line}, {start_column}) is after range end ({end_line}, {end_column})"
    )]
    InvertedRange {
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    },

    #[error("index range start {start} is after end {end}")]
    InvertedIndexRange { start: usize, end: usize },
}

pub type BufferResult<T> = Result<T, BoundsError>;
