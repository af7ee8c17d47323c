use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::assembler::Assembler;
use super::coordinator::{DownloadCoordinator, RunOutcome};
use super::http::HttpClient;
use super::probe::probe_metadata;
use crate::data::{Config, FileDownload, Meta, Progress};
use crate::error::{MetadataError, Result};

/// Final result of [`Downloader::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed { path: PathBuf, bytes: u64 },
    Cancelled,
}

/// High-level entry point tying probe, planning, workers and assembly together.
///
/// # Example
///
/// ```ignore
/// use splitfetch::{CancellationToken, Config, Downloader, ReqwestClient};
///
/// let downloader = Downloader::new(ReqwestClient::new()?, Config::default());
/// let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
/// let outcome = downloader
///     .fetch("https://example.com/file.iso", "downloads/", &tx, &CancellationToken::new())
///     .await?;
/// ```
pub struct Downloader<C> {
    client: Arc<C>,
    config: Config,
}

impl<C: HttpClient + 'static> Downloader<C> {
    pub fn new(client: C, config: Config) -> Self {
        Self::with_shared_client(Arc::new(client), config)
    }

    pub fn with_shared_client(client: Arc<C>, config: Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn probe(&self, url: &str) -> std::result::Result<Meta, MetadataError> {
        probe_metadata(self.client.as_ref(), url).await
    }

    /// Probe `url` and plan the download.
    ///
    /// If `save_as` is an existing directory the resolved file name is
    /// appended. Stores left by an earlier run are reused when their length
    /// matches the plan.
    pub async fn prepare(&self, url: &str, save_as: impl AsRef<Path>) -> Result<FileDownload> {
        let meta = self.probe(url).await?;
        self.prepare_with_meta(url, save_as, meta).await
    }

    /// Plan the download from metadata obtained earlier, skipping the probe.
    pub async fn prepare_with_meta(
        &self,
        url: &str,
        save_as: impl AsRef<Path>,
        meta: Meta,
    ) -> Result<FileDownload> {
        let save_as = resolve_save_path(save_as.as_ref(), &meta).await;
        let mut download = FileDownload::new(url, save_as, self.config, meta)?;

        let reused = download.reuse_completed_stores().await?;
        if reused > 0 {
            info!(reused, "reusing chunk stores from an earlier run");
        }
        Ok(download)
    }

    /// Fetch the pending chunks and, once all are complete, assemble the file.
    ///
    /// A [`DownloadError`](crate::DownloadError) leaves the failed chunks
    /// marked so the caller can [`reset_chunks`](FileDownload::reset_chunks)
    /// and call `run` again.
    pub async fn run(
        &self,
        download: &mut FileDownload,
        progress: &UnboundedSender<Progress>,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        let coordinator = DownloadCoordinator::new(Arc::clone(&self.client));
        match coordinator.run(download, progress, cancel).await? {
            RunOutcome::Cancelled => Ok(DownloadOutcome::Cancelled),
            RunOutcome::Completed => {
                let bytes = Assembler::new().assemble(download).await?;
                Ok(DownloadOutcome::Completed {
                    path: download.save_as().to_path_buf(),
                    bytes,
                })
            }
        }
    }

    /// [`prepare`](Self::prepare) followed by a single [`run`](Self::run).
    pub async fn fetch(
        &self,
        url: &str,
        save_as: impl AsRef<Path>,
        progress: &UnboundedSender<Progress>,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        let mut download = self.prepare(url, save_as).await?;
        self.run(&mut download, progress, cancel).await
    }
}

async fn resolve_save_path(save_as: &Path, meta: &Meta) -> PathBuf {
    match tokio::fs::metadata(save_as).await {
        Ok(m) if m.is_dir() => save_as.join(&meta.name),
        _ => save_as.to_path_buf(),
    }
}
