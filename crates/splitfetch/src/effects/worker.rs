use std::path::PathBuf;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::http::HttpClient;
use super::store::remove_store;
use crate::data::{ChunkPlan, Progress, ProgressEvent};
use crate::error::{ChunkError, ChunkErrorKind};

/// How a single chunk fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    Completed { bytes: u64 },
    Failed(ChunkError),
    Cancelled,
}

enum Transfer {
    Done,
    Cancelled,
}

/// Fetches one [`ChunkPlan`] into its store file.
///
/// When the server honours the range (`206`) the body is the chunk itself.
/// When it answers `200` with the whole resource, the worker skips to
/// `offset_from` and keeps only the chunk's window.
///
/// Writes happen in `buffer_size` units and every write emits a
/// [`ProgressEvent::Advanced`]. Exactly one terminal event follows.
pub struct ChunkWorker<C> {
    client: Arc<C>,
    url: Arc<str>,
    plan: ChunkPlan,
    resumable: bool,
    buffer_size: usize,
    store: PathBuf,
}

impl<C: HttpClient> ChunkWorker<C> {
    pub fn new(
        client: Arc<C>,
        url: Arc<str>,
        plan: ChunkPlan,
        resumable: bool,
        buffer_size: usize,
        store: PathBuf,
    ) -> Self {
        Self {
            client,
            url,
            plan,
            resumable,
            buffer_size: buffer_size.max(1),
            store,
        }
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    /// Run the fetch to completion, failure or cancellation.
    ///
    /// A cancelled worker deletes its partial store before reporting.
    pub async fn run(
        self,
        events: UnboundedSender<Progress>,
        cancel: CancellationToken,
    ) -> ChunkOutcome {
        let id = self.plan.id;
        let span = self.plan.len();
        let mut written = 0u64;

        let (outcome, event) = match self.transfer(&events, &cancel, &mut written).await {
            Ok(Transfer::Done) => {
                debug!(chunk_id = id, bytes = written, "chunk completed");
                (ChunkOutcome::Completed { bytes: written }, ProgressEvent::Completed)
            }
            Ok(Transfer::Cancelled) => {
                debug!(chunk_id = id, "chunk cancelled");
                // best effort, a stale partial store is never reused
                let _ = remove_store(&self.store).await;
                written = 0;
                (ChunkOutcome::Cancelled, ProgressEvent::Cancelled)
            }
            Err(kind) => {
                let err = ChunkError::new(id, self.plan.range(), kind);
                warn!(chunk_id = id, error = %err, "chunk failed");
                (ChunkOutcome::Failed(err.clone()), ProgressEvent::Failed(err))
            }
        };

        let _ = events.send(Progress::new(id, written, span, event));
        outcome
    }

    async fn transfer(
        &self,
        events: &UnboundedSender<Progress>,
        cancel: &CancellationToken,
        written: &mut u64,
    ) -> Result<Transfer, ChunkErrorKind> {
        let span = self.plan.len();
        let mut file = File::create(&self.store).await.map_err(io_error)?;

        if span == 0 {
            file.flush().await.map_err(io_error)?;
            return Ok(Transfer::Done);
        }

        let range = self.resumable.then(|| self.plan.range());
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Transfer::Cancelled),
            response = self.client.fetch(&self.url, range) => {
                response.map_err(|e| ChunkErrorKind::Transport(e.to_string()))?
            }
        };

        if !(200..300).contains(&response.status) {
            return Err(ChunkErrorKind::Status(response.status));
        }

        let ranged = range.is_some() && response.is_partial();
        if ranged
            && let Some(returned) = response.content_range()
            && Some(returned) != range
        {
            return Err(ChunkErrorKind::RangeMismatch {
                requested: self.plan.range(),
                returned,
            });
        }

        let mut skip = if ranged { 0 } else { self.plan.offset_from };
        let mut body = response.body;
        let mut buffer = BytesMut::with_capacity(self.buffer_size);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Transfer::Cancelled),
                next = body.next() => next,
            };
            let Some(item) = next else {
                break;
            };
            let mut bytes = item.map_err(|e| ChunkErrorKind::Transport(e.to_string()))?;

            if skip > 0 {
                let n = skip.min(bytes.len() as u64) as usize;
                bytes.advance(n);
                skip -= n as u64;
            }

            let room = span - *written - buffer.len() as u64;
            if bytes.len() as u64 > room {
                if ranged {
                    return Err(ChunkErrorKind::Oversized { expected: span });
                }
                bytes.truncate(room as usize);
            }

            let mut data = &bytes[..];
            while !data.is_empty() {
                let take = (self.buffer_size - buffer.len()).min(data.len());
                buffer.extend_from_slice(&data[..take]);
                data = &data[take..];
                if buffer.len() == self.buffer_size {
                    self.write_buffer(&mut file, &mut buffer, written, events).await?;
                }
            }

            // window filled, the rest of a full-resource body is not ours
            if !ranged && *written + buffer.len() as u64 == span {
                break;
            }
        }

        if !buffer.is_empty() {
            self.write_buffer(&mut file, &mut buffer, written, events).await?;
        }
        file.flush().await.map_err(io_error)?;

        if *written != span {
            return Err(ChunkErrorKind::ShortBody {
                expected: span,
                received: *written,
            });
        }
        Ok(Transfer::Done)
    }

    async fn write_buffer(
        &self,
        file: &mut File,
        buffer: &mut BytesMut,
        written: &mut u64,
        events: &UnboundedSender<Progress>,
    ) -> Result<(), ChunkErrorKind> {
        file.write_all(&buffer[..]).await.map_err(io_error)?;
        *written += buffer.len() as u64;
        buffer.clear();

        let _ = events.send(Progress::new(
            self.plan.id,
            *written,
            self.plan.len(),
            ProgressEvent::Advanced,
        ));
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> ChunkErrorKind {
    ChunkErrorKind::Io(e.to_string())
}
