//! Randomized editing sequences checked against a plain-string oracle.
//!
//! The buffer must agree with independent `String` surgery on final text,
//! line count, and per-line lengths; unwinding the whole history must
//! restore the initial state; and the index ⇄ position mapping must stay
//! a bijection throughout. Generated text is ASCII so byte offsets,
//! character offsets, and UTF-16 units coincide in the oracle.

use proptest::prelude::*;
use vellum_buffer::TextBuffer;

#[derive(Debug, Clone)]
enum Op {
    Insert { at: usize, text: String },
    Delete { at: usize, len: usize },
    Replace { at: usize, len: usize, text: String },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => ("[a-z \\n]{0,8}", any::<usize>()).prop_map(|(text, at)| Op::Insert { at, text }),
        2 => (any::<usize>(), 0..9usize).prop_map(|(at, len)| Op::Delete { at, len }),
        1 => ("[a-z \\n]{0,5}", any::<usize>(), 0..6usize)
            .prop_map(|(text, at, len)| Op::Replace { at, len, text }),
    ]
}

/// Maps a flat byte offset in the oracle to (line, column).
fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count();
    let column = offset - before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, column)
}

/// Applies `op` to both the buffer and the oracle string.
fn apply(buffer: &mut TextBuffer, oracle: &mut String, op: &Op) {
    match op {
        Op::Insert { at, text } => {
            let offset = at % (oracle.len() + 1);
            let (line, column) = line_col(oracle, offset);
            buffer.insert(line, column, text).unwrap();
            oracle.insert_str(offset, text);
        }
        Op::Delete { at, len } => {
            let start = at % (oracle.len() + 1);
            let end = (start + len).min(oracle.len());
            let (start_line, start_column) = line_col(oracle, start);
            let (end_line, end_column) = line_col(oracle, end);
            let removed = buffer
                .delete(start_line, start_column, end_line, end_column)
                .unwrap();
            assert_eq!(removed, oracle[start..end]);
            oracle.replace_range(start..end, "");
        }
        Op::Replace { at, len, text } => {
            let start = at % (oracle.len() + 1);
            let end = (start + len).min(oracle.len());
            let (start_line, start_column) = line_col(oracle, start);
            let (end_line, end_column) = line_col(oracle, end);
            buffer
                .replace(start_line, start_column, end_line, end_column, text)
                .unwrap();
            oracle.replace_range(start..end, text);
        }
    }
}

fn assert_matches_oracle(buffer: &TextBuffer, oracle: &str) {
    assert_eq!(buffer.to_string(), oracle);
    let lines: Vec<&str> = oracle.split('\n').collect();
    assert_eq!(buffer.line_count(), lines.len());
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(buffer.line_string(i).unwrap(), *line);
        assert_eq!(buffer.column_count(i).unwrap(), line.len());
    }
    assert_eq!(buffer.text_length(), oracle.len());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_edits_match_the_string_oracle(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut buffer = TextBuffer::new();
        let mut oracle = String::new();
        for op in &ops {
            apply(&mut buffer, &mut oracle, op);
        }
        assert_matches_oracle(&buffer, &oracle);
    }

    #[test]
    fn full_undo_unwind_restores_the_initial_state(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut buffer = TextBuffer::new();
        let mut oracle = String::new();
        for op in &ops {
            apply(&mut buffer, &mut oracle, op);
        }
        let edited = buffer.to_string();

        // However the edits coalesced, unwinding everything recorded must
        // land back on the empty initial buffer.
        while buffer.undo() {}
        assert_eq!(buffer.to_string(), "");
        assert_eq!(buffer.line_count(), 1);

        // And replaying the whole redo stack must reproduce the edits.
        while buffer.redo() {}
        assert_eq!(buffer.to_string(), edited);
    }

    #[test]
    fn index_and_position_stay_bijective(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut buffer = TextBuffer::new();
        let mut oracle = String::new();
        for op in &ops {
            apply(&mut buffer, &mut oracle, op);
        }
        for index in 0..=buffer.text_length() {
            let pos = buffer.char_position(index).unwrap();
            let back = buffer.position_at(pos.line, pos.column).unwrap();
            assert_eq!(back.index, index);
            assert_eq!((back.line, back.column), (pos.line, pos.column));
        }
    }

    #[test]
    fn sub_sequence_matches_oracle_slices(
        ops in prop::collection::vec(op_strategy(), 1..30),
        cut_a in any::<usize>(),
        cut_b in any::<usize>(),
    ) {
        let mut buffer = TextBuffer::new();
        let mut oracle = String::new();
        for op in &ops {
            apply(&mut buffer, &mut oracle, op);
        }
        let a = cut_a % (oracle.len() + 1);
        let b = cut_b % (oracle.len() + 1);
        let (start, end) = (a.min(b), a.max(b));
        assert_eq!(buffer.sub_sequence(start, end).unwrap(), oracle[start..end]);
    }
}
