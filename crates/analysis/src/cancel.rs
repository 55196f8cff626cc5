//! Cooperative cancellation for analysis passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;

use vellum_buffer::BufferSnapshot;

/// Cancellation handle handed to an [`Analyzer`](crate::Analyzer) for the
/// duration of one pass.
///
/// [`should_continue`](CancelFlag::should_continue) turns false as soon as
/// a newer snapshot is queued behind the running pass or the driver is
/// shutting down. Analyzers poll it cooperatively, at least once per line;
/// whatever partial work exists when it trips would be stale anyway, so
/// the pass just returns `None` and the worker restarts with the newest
/// input.
#[derive(Debug, Clone)]
pub struct CancelFlag {
    newer_input: Receiver<BufferSnapshot>,
    shutdown: Arc<AtomicBool>,
}

impl CancelFlag {
    pub(crate) fn new(newer_input: Receiver<BufferSnapshot>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            newer_input,
            shutdown,
        }
    }

    /// Whether the running pass is still worth finishing.
    pub fn should_continue(&self) -> bool {
        self.newer_input.is_empty() && !self.shutdown.load(Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        !self.should_continue()
    }
}
