use std::time::Duration;

/// Delay before re-dispatching failed chunks, using exponential backoff.
///
/// The delay is `base * 2^attempt`, saturating instead of overflowing. The
/// engine never retries on its own; callers that re-run failed chunks use
/// this to space their attempts.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use splitfetch::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(100)), Duration::from_millis(100));
/// assert_eq!(retry_delay(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn retry_delay(attempt: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(attempt);
    base.saturating_mul(multiplier)
}
