//! Segmented HTTP downloading with concurrent range fetches and verified reassembly.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations (planning, filename resolution, backoff)
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Flow
//!
//! A [`Downloader`] probes the resource ([`probe_metadata`]), plans byte ranges
//! ([`plan_chunks`]), lets a [`DownloadCoordinator`] run one [`ChunkWorker`]
//! per range with bounded concurrency, and finally hands the chunk stores to
//! the [`Assembler`]. Every worker reports through a single [`Progress`]
//! stream.
//!
//! The transport is injected through [`HttpClient`]; no global client exists.
//! Retry policy is left to the caller: failed chunks can be reset with
//! [`FileDownload::reset_chunks`] and the download run again.

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use crate::core::{ByteRange, ResolvedName, plan_chunks, resolve_filename, retry_delay};
pub use data::{
    ChunkPlan, ChunkState, ChunkStatus, Config, FileDownload, Headers, Meta, Progress,
    ProgressEvent,
};
pub use effects::{
    Assembler, BoxStream, ChunkOutcome, ChunkWorker, DownloadCoordinator, DownloadOutcome,
    Downloader, FetchResponse, HttpClient, ProbeResponse, RunOutcome, probe_metadata,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{
    AssemblyError, ChunkError, ChunkErrorKind, DownloadError, Error, MetadataError,
    PlanningError, Result,
};

pub use tokio_util::sync::CancellationToken;
