use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::store::remove_store;
use crate::data::FileDownload;
use crate::error::AssemblyError;

/// Concatenates completed chunk stores into the final file.
///
/// Every store is checked against its plan before anything is written. The
/// output is staged next to the target as `<save_as>.part` and renamed into
/// place, so a failed assembly never leaves a truncated file at `save_as`.
/// Stores are deleted only after the rename succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler;

impl Assembler {
    pub fn new() -> Self {
        Self
    }

    /// Returns the number of bytes written to `save_as`.
    pub async fn assemble(&self, download: &FileDownload) -> Result<u64, AssemblyError> {
        self.verify(download).await?;

        let target = download.save_as();
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_at(parent))?;
        }

        let staging = staging_path(target);
        let total = match self.concatenate(download, &staging).await {
            Ok(total) => total,
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                return Err(e);
            }
        };

        let expected = download.meta().size;
        if total != expected {
            let _ = fs::remove_file(&staging).await;
            return Err(AssemblyError::TotalMismatch {
                expected,
                actual: total,
            });
        }

        fs::rename(&staging, target).await.map_err(io_at(target))?;

        for chunk in download.chunks() {
            if let Err(e) = remove_store(&download.store_path(chunk.plan.id)).await {
                warn!(chunk_id = chunk.plan.id, error = %e, "leaving chunk store behind");
            }
        }

        info!(path = %target.display(), bytes = total, "assembled download");
        Ok(total)
    }

    async fn verify(&self, download: &FileDownload) -> Result<(), AssemblyError> {
        for chunk in download.chunks() {
            let id = chunk.plan.id;
            if !chunk.is_completed() {
                return Err(AssemblyError::Incomplete { chunk_id: id });
            }

            let path = download.store_path(id);
            let actual = match fs::metadata(&path).await {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(AssemblyError::MissingStore { chunk_id: id, path });
                }
                Err(e) => return Err(AssemblyError::Io { path, source: e }),
            };

            let expected = chunk.plan.len();
            if actual != expected {
                return Err(AssemblyError::LengthMismatch {
                    chunk_id: id,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    async fn concatenate(
        &self,
        download: &FileDownload,
        staging: &Path,
    ) -> Result<u64, AssemblyError> {
        let mut output = File::create(staging).await.map_err(io_at(staging))?;
        let mut total = 0u64;

        for chunk in download.chunks() {
            let path = download.store_path(chunk.plan.id);
            let mut store = File::open(&path).await.map_err(io_at(&path))?;
            let copied = tokio::io::copy(&mut store, &mut output)
                .await
                .map_err(io_at(&path))?;

            if copied != chunk.plan.len() {
                return Err(AssemblyError::LengthMismatch {
                    chunk_id: chunk.plan.id,
                    expected: chunk.plan.len(),
                    actual: copied,
                });
            }
            debug!(chunk_id = chunk.plan.id, bytes = copied, "appended chunk store");
            total += copied;
        }

        output.flush().await.map_err(io_at(staging))?;
        output.sync_all().await.map_err(io_at(staging))?;
        Ok(total)
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> AssemblyError + '_ {
    move |source| AssemblyError::Io {
        path: path.to_path_buf(),
        source,
    }
}
