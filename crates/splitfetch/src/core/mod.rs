//! Pure transformations for segmented fetching.
//!
//! Nothing in this module performs I/O.

mod filename;
mod planner;
mod range;
mod retry;

pub use filename::{ResolvedName, extension_for_content_type, resolve_filename};
pub use planner::plan_chunks;
pub use range::ByteRange;
pub use retry::retry_delay;
