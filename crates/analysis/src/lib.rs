//! vellum-analysis: background analysis runtime for the vellum buffer.
//!
//! The buffer core keeps per-line style spans positionally valid across
//! edits; producing those spans is an analyzer's job, and this crate is
//! the plumbing between the two:
//!
//! - [`Analyzer`]: the trait a syntax analyzer implements, with
//!   cooperative cancellation via [`CancelFlag`]
//! - [`AnalysisDriver`]: a worker thread fed immutable buffer snapshots,
//!   latest-wins scheduling, and generation-validated publication back
//!   into the buffer's span store
//! - [`classify`]: the shared identifier-character tables tokenizers use
//! - [`KeywordAnalyzer`]: a small reference analyzer exercising the whole
//!   loop
//!
//! # The staleness protocol
//!
//! Every snapshot carries the buffer generation it was taken at. The
//! worker analyzes a snapshot while edits may continue on the owner
//! thread; when the owner later drains results, any whose generation no
//! longer matches the live buffer is discarded — a slow pass never
//! clobbers spans for text that has since changed. Cancellation makes the
//! common case cheap: queuing a newer snapshot trips the running pass's
//! [`CancelFlag`] so the worker abandons doomed work between lines.
//!
//! # Example
//!
//! ```
//! use vellum_analysis::{AnalysisDriver, KeywordAnalyzer};
//! use vellum_buffer::{StyleId, TextBuffer};
//!
//! let mut buffer = TextBuffer::from_str("let x = 1");
//! let driver = AnalysisDriver::spawn(KeywordAnalyzer::new(["let"], StyleId(1)));
//!
//! driver.request(buffer.snapshot());
//! // ... later, on the owner thread:
//! while !driver.apply_latest(&mut buffer) {
//!     std::thread::yield_now();
//! }
//! assert_eq!(buffer.line_spans(0).unwrap()[0].style, StyleId(1));
//! ```

mod analyzer;
mod cancel;
pub mod classify;
mod driver;
mod keyword;

pub use analyzer::{Analyzer, LineSpans};
pub use cancel::CancelFlag;
pub use driver::{AnalysisDriver, AnalysisResult};
pub use keyword::KeywordAnalyzer;
