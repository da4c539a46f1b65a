// Imports
use std::time::{Duration, Instant};

/// A leading + trailing result-cache throttle.
///
/// The first call in a fresh window invokes immediately. Calls within the window
/// return the cached result and mark a trailing invocation, which runs on the first
/// call after the window ends. The core runs on a cooperative event loop, so the
/// trailing invocation piggybacks on the next call instead of a timer; gestures end
/// with an explicit [Throttle::flush]. Callers treat results as possibly stale
/// within the window.
#[derive(Debug, Clone)]
pub struct Throttle<T>
where
    T: Clone,
{
    wait: Duration,
    last_invoke: Option<Instant>,
    last_result: Option<T>,
    trailing_pending: bool,
}

impl<T> Throttle<T>
where
    T: Clone,
{
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            last_invoke: None,
            last_result: None,
            trailing_pending: false,
        }
    }

    /// Invoke throttled, returning the cached result within the window.
    pub fn run(&mut self, now: Instant, f: impl FnOnce() -> T) -> T {
        let within_window = self
            .last_invoke
            .is_some_and(|last| now.saturating_duration_since(last) < self.wait);

        if within_window {
            if let Some(result) = &self.last_result {
                self.trailing_pending = true;
                return result.clone();
            }
        }

        self.invoke(now, f)
    }

    /// Invoke unconditionally, clearing any pending trailing invocation.
    pub fn flush(&mut self, now: Instant, f: impl FnOnce() -> T) -> T {
        self.invoke(now, f)
    }

    /// Forget the cached result and window.
    pub fn reset(&mut self) {
        self.last_invoke = None;
        self.last_result = None;
        self.trailing_pending = false;
    }

    /// Whether a call within the current window was served from the cache.
    pub fn trailing_pending(&self) -> bool {
        self.trailing_pending
    }

    fn invoke(&mut self, now: Instant, f: impl FnOnce() -> T) -> T {
        let result = f();
        self.last_invoke = Some(now);
        self.last_result = Some(result.clone());
        self.trailing_pending = false;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_within_the_window() {
        let mut throttle = Throttle::new(Duration::from_millis(32));
        let mut calls = 0;
        let t0 = Instant::now();

        let r = throttle.run(t0, || {
            calls += 1;
            calls
        });
        assert_eq!(r, 1);

        let r = throttle.run(t0 + Duration::from_millis(10), || {
            calls += 1;
            calls
        });
        assert_eq!(r, 1);
        assert_eq!(calls, 1);
        assert!(throttle.trailing_pending());

        // the window elapsed: the next call is the trailing invocation
        let r = throttle.run(t0 + Duration::from_millis(40), || {
            calls += 1;
            calls
        });
        assert_eq!(r, 2);
        assert!(!throttle.trailing_pending());
    }

    #[test]
    fn flush_always_invokes() {
        let mut throttle = Throttle::new(Duration::from_millis(16));
        let mut calls = 0;
        let t0 = Instant::now();

        throttle.run(t0, || {
            calls += 1;
            calls
        });
        let r = throttle.flush(t0 + Duration::from_millis(1), || {
            calls += 1;
            calls
        });
        assert_eq!(r, 2);
        assert_eq!(calls, 2);
    }
}
