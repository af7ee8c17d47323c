use std::path::{Path, PathBuf};

use super::{ChunkPlan, ChunkState, ChunkStatus, Config, Meta};
use crate::core::plan_chunks;
use crate::error::PlanningError;

/// Aggregate root for one download request.
///
/// Holds the immutable inputs (URL, save path, config, probed metadata) and
/// the per-chunk state the coordinator updates as workers report back.
#[derive(Debug, Clone)]
pub struct FileDownload {
    url: String,
    save_as: PathBuf,
    config: Config,
    meta: Meta,
    chunks: Vec<ChunkState>,
}

impl FileDownload {
    /// Validate `config` against `meta` and plan the chunks.
    ///
    /// Splitting a resource whose server ignores range requests would make
    /// every worker download the whole body, so more than one chunk requires
    /// `meta.resumable`.
    pub fn new(
        url: impl Into<String>,
        save_as: impl Into<PathBuf>,
        config: Config,
        meta: Meta,
    ) -> Result<Self, PlanningError> {
        config.validate()?;
        if !meta.resumable && config.thread_count > 1 {
            return Err(PlanningError::RangesUnsupported {
                thread_count: config.thread_count,
            });
        }

        let chunks = plan_chunks(meta.size, config.thread_count)?
            .into_iter()
            .map(ChunkState::new)
            .collect();

        Ok(Self {
            url: url.into(),
            save_as: save_as.into(),
            config,
            meta,
            chunks,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn save_as(&self) -> &Path {
        &self.save_as
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn chunks(&self) -> &[ChunkState] {
        &self.chunks
    }

    pub fn chunk(&self, id: u32) -> Option<&ChunkState> {
        self.chunks.iter().find(|c| c.plan.id == id)
    }

    pub(crate) fn chunk_mut(&mut self, id: u32) -> Option<&mut ChunkState> {
        self.chunks.iter_mut().find(|c| c.plan.id == id)
    }

    /// Plans still waiting for a worker, in id order.
    pub fn pending(&self) -> Vec<ChunkPlan> {
        self.chunks
            .iter()
            .filter(|c| c.status == ChunkStatus::Pending)
            .map(|c| c.plan)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.chunks.iter().all(ChunkState::is_completed)
    }

    pub fn failed_chunks(&self) -> Vec<u32> {
        self.chunks
            .iter()
            .filter(|c| c.status == ChunkStatus::Failed)
            .map(|c| c.plan.id)
            .collect()
    }

    pub fn bytes_written(&self) -> u64 {
        self.chunks.iter().map(|c| c.bytes_written).sum()
    }

    /// Return failed chunks to `Pending` so the next run dispatches them again.
    ///
    /// Ids that are not failed are left alone. Returns how many were reset.
    pub fn reset_chunks(&mut self, ids: &[u32]) -> usize {
        let mut reset = 0;
        for chunk in self.chunks.iter_mut() {
            if chunk.status == ChunkStatus::Failed && ids.contains(&chunk.plan.id) {
                chunk.status = ChunkStatus::Pending;
                chunk.bytes_written = 0;
                chunk.last_error = None;
                reset += 1;
            }
        }
        reset
    }

    /// Deterministic location of a chunk's store: `<save_as>.chunk_<id>`.
    pub fn store_path(&self, id: u32) -> PathBuf {
        let mut name = self.save_as.clone().into_os_string();
        name.push(format!(".chunk_{id}"));
        PathBuf::from(name)
    }
}
