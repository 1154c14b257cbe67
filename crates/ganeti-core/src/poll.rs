//! Polling until a remote resource settles.
//!
//! [`poll_until`] repeatedly fetches a value until a predicate accepts it or a deadline
//! passes. The first fetch always happens before any deadline check, so even a zero timeout
//! observes the resource once.

use crate::clock::Clock;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default time to wait for a job to finalize (in seconds)
pub const DEFAULT_POLL_TIMEOUT: u64 = 300;

/// Default interval between polls (in seconds)
pub const DEFAULT_POLL_INTERVAL: u64 = 5;

/// Timing parameters for [`poll_until`].
///
/// The interval is fixed unless a backoff multiplier above 1 is configured, in which case
/// the n-th sleep is `interval * multiplier^(n-1)`, capped at `max_interval` when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Give up once more than this much time has elapsed since the start
    pub timeout: Duration,

    /// Delay before the first refetch
    pub interval: Duration,

    /// Growth factor applied to the interval after each sleep
    pub backoff_multiplier: u32,

    /// Upper bound for a single sleep
    pub max_interval: Option<Duration>,
}

impl PollPolicy {
    /// Create a policy with the default timeout and a fixed interval.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT),
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL),
            backoff_multiplier: 1,
            max_interval: None,
        }
    }

    /// Set the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Cap a single sleep.
    #[must_use]
    pub const fn with_max_interval(mut self, max: Duration) -> Self {
        self.max_interval = Some(max);
        self
    }

    /// Delay before the given refetch (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = self.backoff_multiplier.max(1).saturating_pow(attempt - 1);
        let delay = self.interval.saturating_mul(factor);

        match self.max_interval {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The predicate accepted the value
    Ready(T),
    /// The deadline passed; carries the last value observed
    TimedOut {
        /// Most recent fetch result
        last: T,
        /// Time elapsed when the deadline check failed
        elapsed: Duration,
    },
}

/// Fetch until `is_done` accepts the value or `policy.timeout` is exceeded.
///
/// The start time is read, then the first fetch happens unconditionally. While the value is
/// not done: if more than `policy.timeout` has elapsed the poll ends with
/// [`PollOutcome::TimedOut`], otherwise the clock sleeps and the value is fetched again.
/// Fetch errors end the poll immediately.
///
/// # Errors
///
/// Returns the first error produced by `fetch`.
pub async fn poll_until<T, F, Fut, D>(
    clock: &dyn Clock,
    policy: &PollPolicy,
    mut fetch: F,
    is_done: D,
) -> Result<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    D: Fn(&T) -> bool,
{
    let start = clock.now();
    let mut current = fetch().await?;
    let mut attempt = 0;

    while !is_done(&current) {
        let elapsed = clock.now().saturating_sub(start);
        if elapsed > policy.timeout {
            return Ok(PollOutcome::TimedOut {
                last: current,
                elapsed,
            });
        }

        attempt += 1;
        let delay = policy.delay_for_attempt(attempt);
        debug!(attempt, ?elapsed, ?delay, "resource not settled, polling again");
        clock.sleep(delay).await;
        current = fetch().await?;
    }

    Ok(PollOutcome::Ready(current))
}
