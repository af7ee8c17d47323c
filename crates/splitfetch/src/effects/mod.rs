//! I/O operations for segmented fetching.
//!
//! Everything that touches the network or the filesystem lives here, behind
//! the [`HttpClient`] seam so tests can substitute an in-memory transport.

mod assembler;
mod coordinator;
mod downloader;
mod http;
mod probe;
mod store;
mod worker;

pub use assembler::Assembler;
pub use coordinator::{DownloadCoordinator, RunOutcome};
pub use downloader::{DownloadOutcome, Downloader};
pub use http::{BoxStream, FetchResponse, HttpClient, ProbeResponse};
pub use probe::{is_resumable, probe_metadata};
pub use worker::{ChunkOutcome, ChunkWorker};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
