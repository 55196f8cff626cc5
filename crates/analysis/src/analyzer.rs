//! The contract between the buffer core and external syntax analyzers.

use vellum_buffer::Span;

use crate::cancel::CancelFlag;

/// One span row per line of the analyzed snapshot.
pub type LineSpans = Vec<Vec<Span>>;

/// A syntax analyzer driven by the [`AnalysisDriver`](crate::AnalysisDriver).
///
/// `analyze` runs on the driver's worker thread against an immutable text
/// snapshot (lines joined with `\n`). Implementations must poll `cancel`
/// at least once per line and return `None` promptly when it trips; the
/// driver then restarts the pass with the newest queued snapshot.
///
/// Returning `Some` does not guarantee publication: the owner thread
/// discards results whose source generation no longer matches the live
/// buffer.
pub trait Analyzer: Send {
    fn analyze(&mut self, text: &str, cancel: &CancelFlag) -> Option<LineSpans>;
}
