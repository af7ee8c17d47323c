use crate::error::ChunkError;

/// What happened to a chunk at the moment a [`Progress`] was emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A buffer was written to the chunk store.
    Advanced,
    /// The whole span is on disk. Terminal.
    Completed,
    /// The worker stopped on an error. Terminal.
    Failed(ChunkError),
    /// The worker was cancelled and removed its partial store. Terminal.
    Cancelled,
}

/// Immutable snapshot of one chunk's fetch state.
///
/// Each chunk emits a non-decreasing sequence of `Advanced` events followed
/// by exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub chunk_id: u32,
    /// Share of the chunk span written so far, `0..=100`.
    pub percentage: u8,
    pub bytes_written: u64,
    pub event: ProgressEvent,
}

impl Progress {
    pub(crate) fn new(chunk_id: u32, bytes_written: u64, span: u64, event: ProgressEvent) -> Self {
        Self {
            chunk_id,
            percentage: percentage(bytes_written, span),
            bytes_written,
            event,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.event, ProgressEvent::Completed)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.event, ProgressEvent::Failed(_))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.event, ProgressEvent::Cancelled)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self.event, ProgressEvent::Advanced)
    }

    /// Human-readable description, non-empty only for failures.
    pub fn message(&self) -> String {
        match &self.event {
            ProgressEvent::Failed(err) => err.to_string(),
            _ => String::new(),
        }
    }
}

fn percentage(bytes_written: u64, span: u64) -> u8 {
    if span == 0 {
        return 100;
    }
    let pct = u128::from(bytes_written.min(span)) * 100 / u128::from(span);
    pct as u8
}
