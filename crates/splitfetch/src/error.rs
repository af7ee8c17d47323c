//! Error types for splitfetch.
//!
//! Each stage owns its error type. [`Error`] is the umbrella returned by the
//! [`Downloader`](crate::Downloader) facade.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::ByteRange;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to obtain usable metadata for the resource. Always fatal.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("metadata request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} did not report a Content-Length")]
    MissingLength { url: String },

    #[error("{url} reported a non-numeric Content-Length {value:?}")]
    InvalidLength { url: String, value: String },
}

/// Invalid configuration or a resource that cannot be partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("thread count must be greater than 0")]
    ZeroThreads,

    #[error("buffer size must be greater than 0")]
    ZeroBuffer,

    #[error("parallel must be within [1, {thread_count}], got {parallel}")]
    InvalidParallel { parallel: u32, thread_count: u32 },

    #[error("resource is empty, nothing to plan")]
    EmptyResource,

    #[error("server does not accept range requests, cannot split into {thread_count} chunks")]
    RangesUnsupported { thread_count: u32 },
}

/// What went wrong while fetching a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkErrorKind {
    /// Connection, DNS, timeout or body stream failure.
    Transport(String),
    /// Server answered with a non-success status.
    Status(u16),
    /// Chunk store could not be created or written.
    Io(String),
    /// Stream ended before the span was filled.
    ShortBody { expected: u64, received: u64 },
    /// A partial-content body carried more bytes than requested.
    Oversized { expected: u64 },
    /// A partial-content response announced a different range than requested.
    RangeMismatch {
        requested: ByteRange,
        returned: ByteRange,
    },
    /// The worker task died without reporting.
    Aborted(String),
}

impl fmt::Display for ChunkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkErrorKind::Transport(msg) => write!(f, "transport error: {msg}"),
            ChunkErrorKind::Status(status) => write!(f, "server returned HTTP {status}"),
            ChunkErrorKind::Io(msg) => write!(f, "chunk store error: {msg}"),
            ChunkErrorKind::ShortBody { expected, received } => {
                write!(f, "body ended early: expected {expected} bytes, got {received}")
            }
            ChunkErrorKind::Oversized { expected } => {
                write!(f, "body exceeded the requested {expected} bytes")
            }
            ChunkErrorKind::RangeMismatch {
                requested,
                returned,
            } => write!(f, "server sent {returned} instead of {requested}"),
            ChunkErrorKind::Aborted(msg) => write!(f, "worker aborted: {msg}"),
        }
    }
}

/// Failure of one chunk. Recoverable by dispatching the same plan again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chunk {chunk_id} ({range}): {kind}")]
pub struct ChunkError {
    pub chunk_id: u32,
    pub range: ByteRange,
    pub kind: ChunkErrorKind,
}

impl ChunkError {
    pub fn new(chunk_id: u32, range: ByteRange, kind: ChunkErrorKind) -> Self {
        Self {
            chunk_id,
            range,
            kind,
        }
    }
}

/// Aggregate of every chunk that failed during one coordinator run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} chunk(s) failed: {}", failures.len(), summary(failures))]
pub struct DownloadError {
    pub failures: Vec<ChunkError>,
}

fn summary(failures: &[ChunkError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl DownloadError {
    /// Ids of the failed chunks, ascending.
    pub fn chunk_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.failures.iter().map(|f| f.chunk_id).collect();
        ids.sort_unstable();
        ids
    }
}

/// Post-condition violation while merging chunk stores. Never retried.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("chunk {chunk_id} is not completed")]
    Incomplete { chunk_id: u32 },

    #[error("chunk store for chunk {chunk_id} is missing: {}", path.display())]
    MissingStore { chunk_id: u32, path: PathBuf },

    #[error("chunk store for chunk {chunk_id} holds {actual} bytes, expected {expected}")]
    LengthMismatch {
        chunk_id: u32,
        expected: u64,
        actual: u64,
    },

    #[error("assembled {actual} bytes, expected {expected}")]
    TotalMismatch { expected: u64, actual: u64 },

    #[error("assembly I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
