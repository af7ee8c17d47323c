//! Immutable data types for segmented downloads.
//!
//! Configuration, probed metadata, chunk plans and progress events live here.
//! [`FileDownload`] is the aggregate that ties them together for one request.

mod config;
mod download;
mod headers;
mod meta;
mod plan;
mod progress;

pub use config::Config;
pub use download::FileDownload;
pub use headers::Headers;
pub use meta::Meta;
pub use plan::{ChunkPlan, ChunkState, ChunkStatus};
pub use progress::{Progress, ProgressEvent};
