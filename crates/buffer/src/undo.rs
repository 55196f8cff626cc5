//! Recorded, reversible edit actions and the undo/redo engine.
//!
//! Every structural edit records an [`EditAction`]. Adjacent small edits of
//! the same kind coalesce into one action so that a burst of typing (or a
//! run of backspaces) undoes as a single step, bounded by a merge ceiling
//! so no single step grows without limit.

use serde::{Deserialize, Serialize};

use crate::line::utf16_len;
use crate::text_buffer::TextBuffer;
use crate::types::CharPosition;

/// Default maximum combined size, in UTF-16 units, below which two
/// adjacent same-kind edits coalesce into one undo step.
pub const DEFAULT_MERGE_CEILING: usize = 10_000;

/// Default bound on the number of recorded undo steps.
pub const DEFAULT_MAX_UNDO_STACK_SIZE: usize = 500;

/// A recorded insertion: `text` was inserted at `start`, ending at `end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertEdit {
    pub start: CharPosition,
    pub end: CharPosition,
    pub text: String,
}

/// A recorded deletion: the range `start..end` held `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEdit {
    pub start: CharPosition,
    pub end: CharPosition,
    pub text: String,
}

/// A reversible description of one structural edit.
///
/// Once recorded, applying `undo` restores the buffer to exactly the state
/// that preceded the action, and `redo` re-applies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditAction {
    Insert(InsertEdit),
    Delete(DeleteEdit),
    /// A deletion and insertion performed as one logical edit. Redo applies
    /// the deletion first; undo reverses the insertion first.
    Replace {
        delete: DeleteEdit,
        insert: InsertEdit,
    },
    /// Batched actions that undo and redo atomically: redo runs them in
    /// order, undo in reverse order.
    Multi(Vec<EditAction>),
}

impl EditAction {
    pub(crate) fn undo(&self, buffer: &mut TextBuffer) {
        match self {
            EditAction::Insert(insert) => undo_insert(insert, buffer),
            EditAction::Delete(delete) => undo_delete(delete, buffer),
            EditAction::Replace { delete, insert } => {
                undo_insert(insert, buffer);
                undo_delete(delete, buffer);
            }
            EditAction::Multi(actions) => {
                for action in actions.iter().rev() {
                    action.undo(buffer);
                }
            }
        }
    }

    pub(crate) fn redo(&self, buffer: &mut TextBuffer) {
        match self {
            EditAction::Insert(insert) => redo_insert(insert, buffer),
            EditAction::Delete(delete) => redo_delete(delete, buffer),
            EditAction::Replace { delete, insert } => {
                redo_delete(delete, buffer);
                redo_insert(insert, buffer);
            }
            EditAction::Multi(actions) => {
                for action in actions {
                    action.redo(buffer);
                }
            }
        }
    }

    /// Whether `next` can coalesce into this action.
    ///
    /// - Insert + Insert: `next` starts exactly where this action ended.
    /// - Delete + Delete: `next` ends where this action starts (backspacing)
    ///   or starts at the same collapse point (forward deletion).
    /// - `Replace` and `Multi` never merge; they are atomic by construction.
    ///
    /// In every case the combined text must stay under `ceiling` UTF-16
    /// units; at or above it, the engine starts a new undo step instead.
    pub fn can_merge(&self, next: &EditAction, ceiling: usize) -> bool {
        match (self, next) {
            (EditAction::Insert(a), EditAction::Insert(b)) => {
                b.start == a.end && utf16_len(&a.text) + utf16_len(&b.text) < ceiling
            }
            (EditAction::Delete(a), EditAction::Delete(b)) => {
                (b.end == a.start || b.start == a.start)
                    && utf16_len(&a.text) + utf16_len(&b.text) < ceiling
            }
            _ => false,
        }
    }

    /// Coalesces `next` into this action.
    ///
    /// # Panics
    ///
    /// Panics if [`can_merge`](EditAction::can_merge) is false for the pair;
    /// merging non-adjacent or non-mergeable actions is a programmer error.
    pub fn merge(&mut self, next: EditAction, ceiling: usize) {
        assert!(
            self.can_merge(&next, ceiling),
            "attempted to merge non-mergeable edit actions"
        );
        match (self, next) {
            (EditAction::Insert(a), EditAction::Insert(b)) => {
                a.end = b.end;
                a.text.push_str(&b.text);
            }
            (EditAction::Delete(a), EditAction::Delete(b)) => {
                if b.end == a.start {
                    // Backspacing: the newer deletion sits just before us.
                    a.start = b.start;
                    let mut text = b.text;
                    text.push_str(&a.text);
                    a.text = text;
                } else {
                    // Forward deletion at the collapse point.
                    a.text.push_str(&b.text);
                    a.end = advance(a.start, &a.text);
                }
            }
            _ => unreachable!("can_merge admits only insert/insert and delete/delete"),
        }
    }
}

/// The position reached by walking `text` forward from `start`.
fn advance(start: CharPosition, text: &str) -> CharPosition {
    let mut line = start.line;
    let mut column = start.column;
    for ch in text.chars() {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += ch.len_utf16();
        }
    }
    CharPosition::new(start.index + utf16_len(text), line, column)
}

fn undo_insert(insert: &InsertEdit, buffer: &mut TextBuffer) {
    buffer
        .delete(
            insert.start.line,
            insert.start.column,
            insert.end.line,
            insert.end.column,
        )
        .expect("recorded insertion no longer matches the buffer");
}

fn redo_insert(insert: &InsertEdit, buffer: &mut TextBuffer) {
    buffer
        .insert(insert.start.line, insert.start.column, &insert.text)
        .expect("recorded insertion no longer matches the buffer");
}

fn undo_delete(delete: &DeleteEdit, buffer: &mut TextBuffer) {
    buffer
        .insert(delete.start.line, delete.start.column, &delete.text)
        .expect("recorded deletion no longer matches the buffer");
}

fn redo_delete(delete: &DeleteEdit, buffer: &mut TextBuffer) {
    buffer
        .delete(
            delete.start.line,
            delete.start.column,
            delete.end.line,
            delete.end.column,
        )
        .expect("recorded deletion no longer matches the buffer");
}

/// Two bounded stacks of [`EditAction`] with merge-on-record and batch
/// grouping.
///
/// Recording a new edit always clears the redo stack; history past an undo
/// point is invalidated by the next edit. When the undo stack outgrows its
/// bound the oldest steps fall off the bottom.
///
/// The engine is serializable so an undo history can be saved with a
/// document and restored later via
/// [`TextBuffer::set_undo_engine`](crate::TextBuffer::set_undo_engine).
/// Batch state is transient and not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoEngine {
    undo_stack: Vec<EditAction>,
    redo_stack: Vec<EditAction>,
    max_stack_size: usize,
    merge_ceiling: usize,
    enabled: bool,
    #[serde(skip)]
    batch_depth: u32,
    #[serde(skip)]
    pending_batch: Option<Vec<EditAction>>,
}

impl UndoEngine {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_stack_size: DEFAULT_MAX_UNDO_STACK_SIZE,
            merge_ceiling: DEFAULT_MERGE_CEILING,
            enabled: true,
            batch_depth: 0,
            pending_batch: None,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.enabled && !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.enabled && !self.redo_stack.is_empty()
    }

    /// Number of steps currently available to undo.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of steps currently available to redo.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables recording. Disabling clears all history.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.undo_stack.clear();
            self.redo_stack.clear();
            self.pending_batch = None;
            self.batch_depth = 0;
        }
    }

    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    /// Sets the bound on recorded undo steps.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is zero; disable recording instead.
    pub fn set_max_stack_size(&mut self, max_size: usize) {
        assert!(max_size > 0, "max undo stack size must be positive");
        self.max_stack_size = max_size;
        self.trim();
    }

    pub fn merge_ceiling(&self) -> usize {
        self.merge_ceiling
    }

    /// Sets the combined-size bound for coalescing adjacent edits.
    pub fn set_merge_ceiling(&mut self, ceiling: usize) {
        self.merge_ceiling = ceiling;
    }

    pub fn is_in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Records a new action, merging into the top of the stack when the
    /// merge protocol allows it. Always invalidates the redo stack.
    pub(crate) fn record(&mut self, action: EditAction) {
        if !self.enabled {
            return;
        }
        self.redo_stack.clear();
        let ceiling = self.merge_ceiling;
        if let Some(batch) = self.pending_batch.as_mut() {
            push_merged(batch, action, ceiling);
            return;
        }
        push_merged(&mut self.undo_stack, action, ceiling);
        self.trim();
    }

    /// Enters a batch layer. Batches nest; only the outermost pair groups.
    pub(crate) fn begin_batch(&mut self) {
        self.batch_depth += 1;
        if self.batch_depth == 1 {
            self.pending_batch = Some(Vec::new());
        }
    }

    /// Leaves a batch layer. Closing the outermost layer pushes everything
    /// recorded inside it as one atomic [`EditAction::Multi`].
    pub(crate) fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        if let Some(actions) = self.pending_batch.take() {
            if !actions.is_empty() {
                self.undo_stack.push(EditAction::Multi(actions));
                self.trim();
            }
        }
    }

    pub(crate) fn pop_for_undo(&mut self) -> Option<EditAction> {
        if !self.enabled {
            return None;
        }
        self.undo_stack.pop()
    }

    pub(crate) fn push_undone(&mut self, action: EditAction) {
        self.redo_stack.push(action);
    }

    pub(crate) fn pop_for_redo(&mut self) -> Option<EditAction> {
        if !self.enabled {
            return None;
        }
        self.redo_stack.pop()
    }

    pub(crate) fn push_redone(&mut self, action: EditAction) {
        self.undo_stack.push(action);
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_stack_size {
            self.undo_stack.remove(0);
        }
    }
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn push_merged(stack: &mut Vec<EditAction>, action: EditAction, ceiling: usize) {
    if let Some(top) = stack.last_mut() {
        if top.can_merge(&action, ceiling) {
            top.merge(action, ceiling);
            return;
        }
    }
    stack.push(action);
}
