//! Time sources for polling.
//!
//! [`Clock`] separates the poll loop from wall-clock time so waits can be driven
//! deterministically. [`SystemClock`] is the production implementation; [`ScriptedClock`]
//! replays a fixed sequence of readings and records requested sleeps.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time source with the ability to suspend the caller.
#[async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current reading, measured from an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by [`Instant`] and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the moment of construction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic clock that returns pre-programmed readings.
///
/// Each call to [`Clock::now`] consumes the next reading; once the script is exhausted the
/// last reading repeats. Sleeps return immediately and are recorded.
#[derive(Debug, Default)]
pub struct ScriptedClock {
    state: Mutex<ScriptState>,
}

#[derive(Debug, Default)]
struct ScriptState {
    readings: VecDeque<Duration>,
    last: Duration,
    sleeps: Vec<Duration>,
}

impl ScriptedClock {
    /// Create a clock from readings in seconds.
    #[must_use]
    pub fn from_secs(readings: &[f64]) -> Self {
        let readings: VecDeque<Duration> = readings
            .iter()
            .map(|secs| Duration::from_secs_f64(*secs))
            .collect();
        let last = readings.front().copied().unwrap_or_default();
        Self {
            state: Mutex::new(ScriptState {
                readings,
                last,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Sleeps requested so far, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Clock for ScriptedClock {
    fn now(&self) -> Duration {
        let mut state = self.lock();
        if let Some(next) = state.readings.pop_front() {
            state.last = next;
        }
        state.last
    }

    async fn sleep(&self, duration: Duration) {
        self.lock().sleeps.push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_clock_replays_then_repeats() {
        let clock = ScriptedClock::from_secs(&[1000.0, 1001.5]);
        assert_eq!(clock.now(), Duration::from_secs(1000));
        assert_eq!(clock.now(), Duration::from_millis(1_001_500));
        assert_eq!(clock.now(), Duration::from_millis(1_001_500));
    }

    #[test]
    fn empty_script_reads_zero() {
        let clock = ScriptedClock::default();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[tokio::test]
    async fn scripted_clock_records_sleeps() {
        let clock = ScriptedClock::from_secs(&[0.0]);
        clock.sleep(Duration::from_secs(5)).await;
        clock.sleep(Duration::from_secs(7)).await;
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(5), Duration::from_secs(7)]
        );
    }

    #[tokio::test]
    async fn system_clock_advances() {
        let clock = SystemClock::new();
        let before = clock.now();
        clock.sleep(Duration::from_millis(10)).await;
        assert!(clock.now() >= before + Duration::from_millis(10));
    }
}
