use std::collections::HashMap;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use splitfetch::{FileDownload, Progress, ProgressEvent};

pub trait TrackerBuilder<T: Tracker<U>, U> {
    fn build(self, multi: &MultiProgress) -> T;
}

pub trait Tracker<Pos> {
    fn update(&self, pos: Pos) -> &Self;
    fn finish(self);
    fn abandon(self, msg: String);
}

const PB_STYLE: &str = "{spinner:.blue} {prefix:>10.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

pub struct ProgressTracker {
    pb: ProgressBar,
    finish: Option<String>,
}

impl Tracker<u64> for ProgressTracker {
    /// Progress events carry the absolute byte count, not a delta.
    fn update(&self, pos: u64) -> &Self {
        self.pb.set_position(pos);
        self
    }

    fn finish(self) {
        match self.finish {
            Some(msg) => self.pb.finish_with_message(msg),
            None => self.pb.finish(),
        }
    }

    fn abandon(self, msg: String) {
        self.pb.abandon_with_message(msg);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    len: Option<u64>,
    pos: u64,
    prefix: Option<String>,
    finish: Option<String>,
}

impl ProgressTrackerBuilder {
    pub fn with_len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub fn with_pos(mut self, pos: u64) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_finish(mut self, finish: &str) -> Self {
        self.finish = Some(finish.to_string());
        self
    }
}

impl TrackerBuilder<ProgressTracker, u64> for ProgressTrackerBuilder {
    fn build(self, multi: &MultiProgress) -> ProgressTracker {
        let pb = if let Some(len) = self.len {
            ProgressBar::new(len)
        } else {
            ProgressBar::new_spinner()
        };
        let pb = if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.with_style(style.clone())
        } else {
            pb
        };

        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }
        pb.set_position(self.pos);

        ProgressTracker {
            pb: multi.add(pb),
            finish: self.finish,
        }
    }
}

/// One bar per chunk, driven by the download's progress stream.
pub struct ChunkBoard {
    _multi: MultiProgress,
    bars: HashMap<u32, ProgressTracker>,
}

impl ChunkBoard {
    pub fn new(download: &FileDownload) -> Self {
        let multi = MultiProgress::new();
        let mut bars = HashMap::new();

        for chunk in download.chunks() {
            let tracker = ProgressTrackerBuilder::default()
                .with_len(chunk.plan.len())
                .with_pos(chunk.bytes_written)
                .with_prefix(&format!("chunk {}", chunk.plan.id))
                .with_finish("done")
                .build(&multi);

            if chunk.is_completed() {
                tracker.finish();
            } else {
                bars.insert(chunk.plan.id, tracker);
            }
        }

        Self {
            _multi: multi,
            bars,
        }
    }

    pub fn observe(&mut self, progress: &Progress) {
        match &progress.event {
            ProgressEvent::Advanced => {
                if let Some(tracker) = self.bars.get(&progress.chunk_id) {
                    tracker.update(progress.bytes_written);
                }
            }
            ProgressEvent::Completed => {
                if let Some(tracker) = self.bars.remove(&progress.chunk_id) {
                    tracker.update(progress.bytes_written);
                    tracker.finish();
                }
            }
            ProgressEvent::Failed(_) => {
                if let Some(tracker) = self.bars.remove(&progress.chunk_id) {
                    tracker.abandon(progress.message());
                }
            }
            ProgressEvent::Cancelled => {
                if let Some(tracker) = self.bars.remove(&progress.chunk_id) {
                    tracker.abandon("cancelled".to_string());
                }
            }
        }
    }

    /// Bars still open when the stream closed.
    pub fn close(self) {
        for (_, tracker) in self.bars {
            tracker.abandon("stopped".to_string());
        }
    }
}
