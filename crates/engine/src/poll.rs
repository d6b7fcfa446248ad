//! Convergence polling
//!
//! Every wait in the engine is bounded busy-polling against a deadline with a
//! fixed sleep between attempts: index building, overlay stabilization,
//! required-validation detection and awaited checks. There is no external
//! cancellation; each loop ends on success or on its own deadline.
//!
//! Time comes from `tokio::time`, so tests can run on a paused clock.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Timeout and sleep interval for one polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollPolicy {
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// A point in time a loop must not poll past
///
/// A timeout too large to represent as an instant never expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
        }
    }

    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn remaining(&self) -> Duration {
        self.at
            .map_or(Duration::MAX, |at| at.saturating_duration_since(Instant::now()))
    }
}

/// Tracks how many consecutive observations repeated the previous one
#[derive(Debug, Clone)]
pub struct StabilityWindow<K> {
    last: Option<K>,
    streak: usize,
    window: usize,
}

impl<K: PartialEq> StabilityWindow<K> {
    pub fn new(window: usize) -> Self {
        Self {
            last: None,
            streak: 0,
            window,
        }
    }

    /// Record an observation. Returns true once an accepted key has been seen
    /// unchanged for `window` consecutive iterations after its first sighting.
    pub fn observe(&mut self, key: K, accepted: bool) -> bool {
        if accepted && self.last.as_ref() == Some(&key) {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        self.last = Some(key);
        self.streak >= self.window
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.streak = 0;
    }

    pub fn streak(&self) -> usize {
        self.streak
    }
}

/// Outcome of a polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    Ready(T),
    TimedOut { last: Option<T>, attempts: usize },
}

impl<T> Polled<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Polled::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Polled::Ready(value) => Some(value),
            Polled::TimedOut { .. } => None,
        }
    }

    /// The ready value, or the last observation before the deadline
    pub fn into_last(self) -> Option<T> {
        match self {
            Polled::Ready(value) => Some(value),
            Polled::TimedOut { last, .. } => last,
        }
    }
}

/// Re-run `attempt` until it yields a value accepted by `done`.
///
/// `attempt` returns `None` when nothing could be observed this tick. The
/// attempt always runs at least once, and once more after the final sleep.
pub async fn poll_until<T, F, Fut, P>(policy: PollPolicy, mut attempt: F, mut done: P) -> Polled<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
    P: FnMut(&T) -> bool,
{
    let deadline = Deadline::after(policy.timeout);
    let mut last = None;
    let mut attempts = 0;
    loop {
        attempts += 1;
        if let Some(value) = attempt().await {
            if done(&value) {
                return Polled::Ready(value);
            }
            last = Some(value);
        }
        if deadline.expired() {
            return Polled::TimedOut { last, attempts };
        }
        sleep(policy.interval).await;
    }
}

/// Re-run `observe` until `key(observation)` has stayed the same, and been
/// accepted, for `window` consecutive iterations.
///
/// A `None` observation breaks the streak.
pub async fn poll_until_stable<T, K, F, Fut, KF, A>(
    policy: PollPolicy,
    window: usize,
    mut observe: F,
    key: KF,
    accept: A,
) -> Polled<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
    K: PartialEq,
    KF: Fn(&T) -> K,
    A: Fn(&K) -> bool,
{
    let deadline = Deadline::after(policy.timeout);
    let mut tracker = StabilityWindow::new(window);
    let mut last = None;
    let mut attempts = 0;
    loop {
        attempts += 1;
        match observe().await {
            Some(value) => {
                let k = key(&value);
                let accepted = accept(&k);
                if tracker.observe(k, accepted) {
                    return Polled::Ready(value);
                }
                last = Some(value);
            }
            None => tracker.reset(),
        }
        if deadline.expired() {
            return Polled::TimedOut { last, attempts };
        }
        sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(timeout_ms: u64, interval_ms: u64) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(timeout_ms), Duration::from_millis(interval_ms))
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_returns_first_accepted_value() {
        let mut calls = 0;
        let out = poll_until(
            policy(1_000, 50),
            || {
                calls += 1;
                let n = calls;
                async move { Some(n) }
            },
            |n| *n >= 3,
        )
        .await;
        assert_eq!(out, Polled::Ready(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_keeps_last_value_on_timeout() {
        let started = Instant::now();
        let out = poll_until(policy(200, 50), || async { Some("pending") }, |_| false).await;
        match out {
            Polled::TimedOut { last, attempts } => {
                assert_eq!(last, Some("pending"));
                assert!(attempts >= 4);
            }
            Polled::Ready(_) => panic!("should time out"),
        }
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_still_attempts_once() {
        let out = poll_until(policy(0, 50), || async { Some(1) }, |_| true).await;
        assert_eq!(out, Polled::Ready(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stable_requires_consecutive_equal_observations() {
        // counts grow 1, 2, 2, 2: ready on the third read of 2
        let counts = [1usize, 2, 2, 2, 2];
        let mut i = 0;
        let out = poll_until_stable(
            policy(5_000, 100),
            2,
            || {
                let n = counts[i.min(counts.len() - 1)];
                i += 1;
                async move { Some(n) }
            },
            |n| *n,
            |n| *n >= 1,
        )
        .await;
        assert_eq!(out, Polled::Ready(2));
        assert_eq!(i, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stable_never_accepts_rejected_key() {
        let out = poll_until_stable(policy(300, 100), 2, || async { Some(0usize) }, |n| *n, |n| *n >= 1).await;
        assert!(matches!(out, Polled::TimedOut { last: Some(0), .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_timeout_never_expires() {
        let deadline = Deadline::after(Duration::MAX);
        assert!(!deadline.expired());
        assert_eq!(deadline.remaining(), Duration::MAX);

        let mut calls = 0;
        let out = poll_until(
            PollPolicy::new(Duration::MAX, Duration::from_millis(50)),
            || {
                calls += 1;
                let n = calls;
                async move { Some(n) }
            },
            |n| *n >= 2,
        )
        .await;
        assert_eq!(out, Polled::Ready(2));
    }

    #[test]
    fn test_window_resets_on_change() {
        let mut w = StabilityWindow::new(2);
        assert!(!w.observe(3, true));
        assert!(!w.observe(3, true));
        assert!(!w.observe(4, true));
        assert_eq!(w.streak(), 0);
        assert!(!w.observe(4, true));
        assert!(w.observe(4, true));
    }
}
