use std::io;
use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use crate::data::{ChunkStatus, FileDownload};

impl FileDownload {
    /// Mark pending chunks whose store already holds the full span as completed.
    ///
    /// Lets a download pick up after a crash or an interrupted run without
    /// refetching chunks that reached disk. Empty chunks are left pending;
    /// their worker only has to create the file. Returns how many were reused.
    pub async fn reuse_completed_stores(&mut self) -> io::Result<usize> {
        let mut reused = 0;
        for id in self.pending().into_iter().map(|p| p.id) {
            let path = self.store_path(id);
            let Some(chunk) = self.chunk_mut(id) else {
                continue;
            };
            let span = chunk.plan.len();
            if span == 0 {
                continue;
            }

            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() && meta.len() == span => {
                    chunk.status = ChunkStatus::Completed;
                    chunk.bytes_written = span;
                    reused += 1;
                    debug!(chunk_id = id, path = %path.display(), "reusing chunk store");
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(reused)
    }

    /// Delete every chunk store and return all chunks to `Pending`.
    pub async fn discard_stores(&mut self) -> io::Result<()> {
        let ids: Vec<u32> = self.chunks().iter().map(|c| c.plan.id).collect();
        for id in ids {
            remove_store(&self.store_path(id)).await?;
            if let Some(chunk) = self.chunk_mut(id) {
                chunk.status = ChunkStatus::Pending;
                chunk.bytes_written = 0;
                chunk.last_error = None;
            }
        }
        Ok(())
    }
}

/// Remove a store, treating an already missing file as success.
pub(crate) async fn remove_store(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove chunk store");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Config, Headers, Meta};
    use tempfile::TempDir;

    fn download(dir: &TempDir) -> FileDownload {
        let meta = Meta {
            size: 10,
            name: "data.bin".into(),
            resumable: true,
            headers: Headers::default(),
        };
        let config = Config::default().thread_count(2).parallel(2);
        let save_as = dir.path().join("data.bin");
        FileDownload::new("http://host/data.bin", save_as, config, meta).unwrap()
    }

    #[tokio::test]
    async fn reuses_only_full_length_stores() {
        let dir = TempDir::new().unwrap();
        let mut download = download(&dir);
        std::fs::write(download.store_path(1), b"01234").unwrap();
        std::fs::write(download.store_path(2), b"56").unwrap();

        assert_eq!(download.reuse_completed_stores().await.unwrap(), 1);
        assert!(download.chunk(1).unwrap().is_completed());
        assert_eq!(download.chunk(1).unwrap().bytes_written, 5);
        assert_eq!(download.chunk(2).unwrap().status, ChunkStatus::Pending);
    }

    #[tokio::test]
    async fn discard_removes_stores_and_resets() {
        let dir = TempDir::new().unwrap();
        let mut download = download(&dir);
        std::fs::write(download.store_path(1), b"01234").unwrap();
        download.reuse_completed_stores().await.unwrap();

        download.discard_stores().await.unwrap();
        assert!(!download.store_path(1).exists());
        assert_eq!(download.pending().len(), 2);
    }
}
