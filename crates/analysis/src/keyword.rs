//! A minimal keyword-highlighting analyzer.
//!
//! This is the reference implementation of the [`Analyzer`] contract: it
//! tokenizes each line with the shared identifier tables, styles
//! configured keywords, and checks cancellation between lines. Real
//! grammar engines plug into the same seam.

use std::collections::HashSet;

use vellum_buffer::{Span, StyleId};

use crate::analyzer::{Analyzer, LineSpans};
use crate::cancel::CancelFlag;
use crate::classify::{is_identifier_part, is_identifier_start};

/// Styles whole-word occurrences of a fixed keyword set; everything else
/// reads as plain text.
#[derive(Debug, Clone)]
pub struct KeywordAnalyzer {
    keywords: HashSet<String>,
    keyword_style: StyleId,
}

impl KeywordAnalyzer {
    pub fn new<I, S>(keywords: I, keyword_style: StyleId) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            keyword_style,
        }
    }

    /// Produces the span row for a single line. Columns are UTF-16 units,
    /// matching the buffer's coordinate space.
    fn scan_line(&self, line: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut column = 0usize;
        let mut chars = line.chars().peekable();

        while let Some(&ch) = chars.peek() {
            if is_identifier_start(ch) {
                let word_start = column;
                let mut word = String::new();
                while let Some(&part) = chars.peek() {
                    if !is_identifier_part(part) {
                        break;
                    }
                    word.push(part);
                    column += part.len_utf16();
                    chars.next();
                }
                if self.keywords.contains(&word) {
                    spans.push(Span::new(word_start, self.keyword_style));
                    spans.push(Span::plain(column));
                }
            } else {
                column += ch.len_utf16();
                chars.next();
            }
        }

        // A keyword ending the line leaves a zero-width plain trailer.
        if spans.len() > 1 && spans.last().is_some_and(|span| span.column >= column) {
            spans.pop();
        }
        if spans.first().map_or(true, |span| span.column != 0) {
            spans.insert(0, Span::plain(0));
        }
        spans
    }
}

impl Analyzer for KeywordAnalyzer {
    fn analyze(&mut self, text: &str, cancel: &CancelFlag) -> Option<LineSpans> {
        let mut rows = Vec::new();
        for line in text.split('\n') {
            if cancel.is_cancelled() {
                return None;
            }
            rows.push(self.scan_line(line));
        }
        Some(rows)
    }
}
