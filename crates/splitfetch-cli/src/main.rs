use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use splitfetch::{
    CancellationToken, DownloadOutcome, Downloader, Error, Meta, Progress, ReqwestClient,
    retry_delay,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinError;
use tracing::{info, warn};

use crate::cli::Args;
use crate::ui::ChunkBoard;

mod cache;
mod cli;
mod logging;
mod settings;
mod ui;

const RETRY_BASE: Duration = Duration::from_millis(500);

const CANCELLED: &str = "download cancelled, run again to resume from the completed chunks";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.verbose);

    let config = settings::load(&args)?;
    let client = ReqwestClient::new().context("failed to build HTTP client")?;
    let downloader = Downloader::new(client, config);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping workers");
            on_signal.cancel();
        }
    });

    let (meta, target) = resolve_meta(&downloader, &args.url, &args.output).await?;
    let mut download = downloader
        .prepare_with_meta(&args.url, &target, meta)
        .await
        .with_context(|| format!("failed to plan download of {}", args.url))?;

    let mut attempt = 0;
    loop {
        let (tx, rx) = mpsc::unbounded_channel();
        let board = tokio::spawn(render(ChunkBoard::new(&download), rx));
        let result = downloader.run(&mut download, &tx, &cancel).await;
        drop(tx);
        board_finished(board.await);

        match result {
            Ok(DownloadOutcome::Completed { path, bytes }) => {
                cache::remove(&target);
                info!(path = %path.display(), bytes, "download complete");
                return Ok(());
            }
            Ok(DownloadOutcome::Cancelled) => bail!(CANCELLED),
            Err(Error::Download(err)) if attempt < args.retries => {
                let delay = retry_delay(attempt, RETRY_BASE);
                attempt += 1;
                warn!(
                    attempt,
                    chunks = ?err.chunk_ids(),
                    ?delay,
                    "retrying failed chunks"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => bail!(CANCELLED),
                }
                download.reset_chunks(&err.chunk_ids());
            }
            Err(e) => return Err(e).with_context(|| format!("failed to download {}", args.url)),
        }
    }
}

/// Cached metadata when resuming into a known file, a fresh probe otherwise.
async fn resolve_meta(
    downloader: &Downloader<ReqwestClient>,
    url: &str,
    output: &Path,
) -> Result<(Meta, PathBuf)> {
    if !output.is_dir()
        && let Some(meta) = cache::load(output, url)
    {
        info!(size = meta.size, "resuming with cached metadata");
        return Ok((meta, output.to_path_buf()));
    }

    let meta = downloader
        .probe(url)
        .await
        .with_context(|| format!("failed to probe {url}"))?;

    let target = if output.is_dir() {
        output.join(&meta.name)
    } else {
        output.to_path_buf()
    };

    if output.is_dir()
        && let Some(cached) = cache::load(&target, url).filter(|c| c.size == meta.size)
    {
        info!(size = cached.size, "resuming with cached metadata");
        return Ok((cached, target));
    }

    if let Err(e) = cache::store(&target, url, &meta) {
        warn!(error = %e, "metadata cache not written, an interrupted run will probe again");
    }
    Ok((meta, target))
}

async fn render(mut board: ChunkBoard, mut rx: UnboundedReceiver<Progress>) {
    while let Some(progress) = rx.recv().await {
        board.observe(&progress);
    }
    board.close();
}

/// Whether the progress display task ended cleanly.
fn board_finished(joined: Result<(), JoinError>) -> bool {
    match joined {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "progress display stopped unexpectedly");
            false
        }
    }
}
