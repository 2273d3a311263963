//! Injectable scheduler for stage delays
//!
//! Stage delays only animate progress. Production code waits on the tokio
//! timer; tests use `InstantClock` so a full run completes without sleeping.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Source of stage delays and completion timestamps
#[async_trait]
pub trait StageClock: Send + Sync {
    /// Wait out one stage's processing delay
    async fn sleep(&self, duration: Duration);

    /// The current instant, used to stamp completed analyses
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock scheduler backed by `tokio::time`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl StageClock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

type SleepHook = Box<dyn Fn(usize) + Send + Sync>;

/// Scheduler that returns from every delay immediately.
///
/// Records each requested delay. An optional hook runs on every sleep with
/// the zero-based call number, which lets callers act "mid-stage".
#[derive(Default)]
pub struct InstantClock {
    requested: Mutex<Vec<Duration>>,
    calls: AtomicUsize,
    fixed_now: Option<DateTime<Utc>>,
    hook: Option<SleepHook>,
}

impl InstantClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `now` as a fixed instant
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Run `hook` on every sleep call
    pub fn with_hook(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Delays requested so far, in call order
    pub fn requested(&self) -> Vec<Duration> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn sleep_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for InstantClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstantClock")
            .field("calls", &self.sleep_count())
            .field("fixed_now", &self.fixed_now)
            .finish()
    }
}

#[async_trait]
impl StageClock for InstantClock {
    async fn sleep(&self, duration: Duration) {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(duration);
        }
        if let Some(hook) = &self.hook {
            hook(call);
        }
        tokio::task::yield_now().await;
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_instant_clock_records_delays() {
        let clock = InstantClock::new();
        clock.sleep(Duration::from_millis(1500)).await;
        clock.sleep(Duration::from_millis(20)).await;

        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(
            clock.requested(),
            vec![Duration::from_millis(1500), Duration::from_millis(20)]
        );
    }

    #[tokio::test]
    async fn test_instant_clock_hook_sees_call_numbers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let clock = InstantClock::new().with_hook(move |call| sink.lock().unwrap().push(call));

        for _ in 0..3 {
            clock.sleep(Duration::ZERO).await;
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_instant_clock_fixed_now() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let clock = InstantClock::new().at(instant);
        assert_eq!(clock.now(), instant);
    }

    #[tokio::test]
    async fn test_tokio_clock_waits() {
        let start = std::time::Instant::now();
        TokioClock.sleep(Duration::from_millis(10)).await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
