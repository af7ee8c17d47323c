use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

/// Tuning for one segmented download.
///
/// # Examples
///
/// ```
/// use splitfetch::Config;
///
/// let config = Config::default()
///     .thread_count(16)
///     .parallel(8)
///     .buffer_size(128 * 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of chunks the resource is split into.
    ///
    /// Default: 8
    pub thread_count: u32,

    /// Bytes per chunk-store write. Each write emits one progress event.
    ///
    /// Default: 64 KiB
    pub buffer_size: usize,

    /// Maximum number of chunk workers running at once.
    ///
    /// Must be within `[1, thread_count]`.
    ///
    /// Default: 4
    pub parallel: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_count: 8,
            buffer_size: 64 * 1024,
            parallel: 4,
        }
    }
}

impl Config {
    #[must_use]
    pub fn thread_count(mut self, thread_count: u32) -> Self {
        self.thread_count = thread_count;
        self
    }

    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn parallel(mut self, parallel: u32) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the invariants a download relies on.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.thread_count == 0 {
            return Err(PlanningError::ZeroThreads);
        }
        if self.buffer_size == 0 {
            return Err(PlanningError::ZeroBuffer);
        }
        if self.parallel == 0 || self.parallel > self.thread_count {
            return Err(PlanningError::InvalidParallel {
                parallel: self.parallel,
                thread_count: self.thread_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn parallel_must_not_exceed_threads() {
        let config = Config::default().thread_count(2).parallel(3);
        assert_eq!(
            config.validate(),
            Err(PlanningError::InvalidParallel {
                parallel: 3,
                thread_count: 2
            })
        );
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_eq!(
            Config::default().thread_count(0).validate(),
            Err(PlanningError::ZeroThreads)
        );
        assert_eq!(
            Config::default().buffer_size(0).validate(),
            Err(PlanningError::ZeroBuffer)
        );
        assert!(Config::default().parallel(0).validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{ "thread_count": 12 }"#).unwrap();
        assert_eq!(config.thread_count, 12);
        assert_eq!(config.parallel, 4);
        assert_eq!(config.buffer_size, 64 * 1024);
    }
}
