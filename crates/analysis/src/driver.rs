//! Worker-thread driver connecting a buffer to an [`Analyzer`].
//!
//! The owner thread queues [`BufferSnapshot`]s and periodically drains
//! completed results back into the buffer's span store. The worker always
//! analyzes the newest queued snapshot; anything older is skipped or
//! cancelled mid-pass. Results are validated against the live buffer's
//! generation before publication, so a slow pass can never overwrite
//! spans with data from a text state that no longer exists.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use vellum_buffer::{BufferSnapshot, TextBuffer};

use crate::analyzer::{Analyzer, LineSpans};
use crate::cancel::CancelFlag;

/// Spans produced by one completed pass, tagged with the generation of
/// the snapshot the pass read.
#[derive(Debug)]
pub struct AnalysisResult {
    pub generation: u64,
    pub spans: LineSpans,
}

/// Owner-side handle to a background analysis worker.
///
/// Dropping the driver (or calling [`shutdown`](AnalysisDriver::shutdown))
/// cancels any running pass and joins the worker thread.
#[derive(Debug)]
pub struct AnalysisDriver {
    request_tx: Option<Sender<BufferSnapshot>>,
    result_rx: Receiver<AnalysisResult>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl AnalysisDriver {
    /// Spawns the worker thread running `analyzer`.
    pub fn spawn(mut analyzer: impl Analyzer + 'static) -> Self {
        let (request_tx, request_rx) = unbounded::<BufferSnapshot>();
        let (result_tx, result_rx) = unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let cancel = CancelFlag::new(request_rx.clone(), shutdown.clone());

        let worker = thread::Builder::new()
            .name("vellum-analysis".into())
            .spawn(move || {
                debug!("analysis worker started");
                while let Ok(mut snapshot) = request_rx.recv() {
                    // Latest wins: skip straight to the newest queued input.
                    while let Ok(newer) = request_rx.try_recv() {
                        snapshot = newer;
                    }
                    match analyzer.analyze(snapshot.text(), &cancel) {
                        Some(spans) => {
                            let result = AnalysisResult {
                                generation: snapshot.generation(),
                                spans,
                            };
                            if result_tx.send(result).is_err() {
                                break;
                            }
                        }
                        None => {
                            debug!(
                                generation = snapshot.generation(),
                                "analysis pass cancelled"
                            );
                        }
                    }
                }
                debug!("analysis worker exiting");
            })
            .expect("failed to spawn analysis worker thread");

        Self {
            request_tx: Some(request_tx),
            result_rx,
            shutdown,
            worker: Some(worker),
        }
    }

    /// Queues `snapshot` for analysis. Never blocks; a newer snapshot
    /// supersedes anything still queued and cancels a pass in flight.
    pub fn request(&self, snapshot: BufferSnapshot) {
        if let Some(tx) = &self.request_tx {
            let _ = tx.send(snapshot);
        }
    }

    /// Takes the newest completed result without validating it, discarding
    /// older queued ones.
    pub fn poll(&self) -> Option<AnalysisResult> {
        let mut latest = None;
        while let Ok(result) = self.result_rx.try_recv() {
            latest = Some(result);
        }
        latest
    }

    /// Drains completed results and publishes the newest one whose
    /// generation still matches `buffer` into its span store. Stale
    /// results are discarded silently. Returns whether anything was
    /// published.
    ///
    /// Call this from the buffer's owner thread; it is the single point
    /// where analysis output crosses back into buffer state.
    pub fn apply_latest(&self, buffer: &mut TextBuffer) -> bool {
        let mut applied = false;
        while let Ok(result) = self.result_rx.try_recv() {
            if result.generation != buffer.generation() {
                debug!(
                    result_generation = result.generation,
                    buffer_generation = buffer.generation(),
                    "discarding stale analysis result"
                );
                continue;
            }
            let line_count = buffer.line_count();
            for (line, spans) in result.spans.into_iter().take(line_count).enumerate() {
                if buffer.set_line_spans(line, spans).is_err() {
                    break;
                }
            }
            applied = true;
        }
        applied
    }

    /// Stops the worker and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Dropping the sender disconnects the request channel, which wakes
        // the worker's recv().
        self.request_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for AnalysisDriver {
    fn drop(&mut self) {
        self.stop_worker();
    }
}
