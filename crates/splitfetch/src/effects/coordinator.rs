//! Bounded-concurrency dispatch of chunk workers.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::{StreamExt, stream::FuturesUnordered};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::http::HttpClient;
use super::worker::{ChunkOutcome, ChunkWorker};
use crate::data::{ChunkPlan, ChunkStatus, FileDownload, Progress};
use crate::error::{ChunkError, ChunkErrorKind, DownloadError};

/// How a coordinator run ended when no chunk failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every chunk is completed; the download is ready to assemble.
    Completed,
    /// Cancellation was requested. Completed chunks keep their stores,
    /// interrupted ones are back to `Pending`.
    Cancelled,
}

/// Runs the pending chunks of a [`FileDownload`] with at most
/// `config.parallel` workers in flight.
///
/// The first failure stops further dispatch. Workers already running are
/// allowed to finish so their results are recorded, and every failure of the
/// run is returned together in a [`DownloadError`].
pub struct DownloadCoordinator<C> {
    client: Arc<C>,
}

impl<C: HttpClient + 'static> DownloadCoordinator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn run(
        &self,
        download: &mut FileDownload,
        progress: &UnboundedSender<Progress>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DownloadError> {
        let parallel = download.config().parallel.max(1) as usize;
        let buffer_size = download.config().buffer_size;
        let resumable = download.meta().resumable;
        let url: Arc<str> = Arc::from(download.url());

        let mut queue: VecDeque<ChunkPlan> = download.pending().into();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut running = FuturesUnordered::new();
        let mut halted = false;
        let mut cancelled = cancel.is_cancelled();

        info!(url = %url, chunks = queue.len(), parallel, "dispatching chunks");

        loop {
            while !halted && !cancelled && running.len() < parallel {
                let Some(plan) = queue.pop_front() else {
                    break;
                };
                if let Some(chunk) = download.chunk_mut(plan.id) {
                    chunk.status = ChunkStatus::InFlight;
                    chunk.bytes_written = 0;
                }

                let worker = ChunkWorker::new(
                    Arc::clone(&self.client),
                    Arc::clone(&url),
                    plan,
                    resumable,
                    buffer_size,
                    download.store_path(plan.id),
                );
                let handle = tokio::spawn(worker.run(event_tx.clone(), cancel.child_token()));
                debug!(chunk_id = plan.id, range = %plan.range(), "dispatched chunk");
                running.push(async move { (plan, handle.await) });
            }

            if running.is_empty() {
                break;
            }

            tokio::select! {
                Some(event) = event_rx.recv() => observe(download, event, progress),
                Some((plan, joined)) = running.next() => {
                    let outcome = joined.unwrap_or_else(|e| {
                        ChunkOutcome::Failed(ChunkError::new(
                            plan.id,
                            plan.range(),
                            ChunkErrorKind::Aborted(e.to_string()),
                        ))
                    });
                    if settle(download, plan, outcome) && !halted {
                        halted = true;
                        warn!(
                            chunk_id = plan.id,
                            "chunk failed, no further chunks will be dispatched"
                        );
                    }
                }
                _ = cancel.cancelled(), if !cancelled => {
                    cancelled = true;
                    info!("cancellation requested, waiting for workers to stop");
                }
            }
        }

        drop(event_tx);
        while let Some(event) = event_rx.recv().await {
            observe(download, event, progress);
        }

        if cancelled {
            info!(
                completed = download.chunks().iter().filter(|c| c.is_completed()).count(),
                "download cancelled"
            );
            return Ok(RunOutcome::Cancelled);
        }

        let failures: Vec<ChunkError> = download
            .chunks()
            .iter()
            .filter(|c| c.status == ChunkStatus::Failed)
            .map(|c| {
                c.last_error.clone().unwrap_or_else(|| {
                    ChunkError::new(
                        c.plan.id,
                        c.plan.range(),
                        ChunkErrorKind::Aborted("failed without a recorded error".into()),
                    )
                })
            })
            .collect();
        if !failures.is_empty() {
            return Err(DownloadError { failures });
        }

        info!(bytes = download.bytes_written(), "all chunks completed");
        Ok(RunOutcome::Completed)
    }
}

/// Record a progress snapshot and forward it to the caller.
fn observe(download: &mut FileDownload, event: Progress, progress: &UnboundedSender<Progress>) {
    if let Some(chunk) = download.chunk_mut(event.chunk_id)
        && chunk.status == ChunkStatus::InFlight
    {
        chunk.bytes_written = event.bytes_written;
    }
    let _ = progress.send(event);
}

/// Apply a worker outcome to the chunk state. Returns `true` on failure.
fn settle(download: &mut FileDownload, plan: ChunkPlan, outcome: ChunkOutcome) -> bool {
    let Some(chunk) = download.chunk_mut(plan.id) else {
        return false;
    };
    match outcome {
        ChunkOutcome::Completed { bytes } => {
            chunk.status = ChunkStatus::Completed;
            chunk.bytes_written = bytes;
            chunk.last_error = None;
            false
        }
        ChunkOutcome::Failed(err) => {
            chunk.status = ChunkStatus::Failed;
            chunk.last_error = Some(err);
            true
        }
        ChunkOutcome::Cancelled => {
            chunk.status = ChunkStatus::Pending;
            chunk.bytes_written = 0;
            false
        }
    }
}
