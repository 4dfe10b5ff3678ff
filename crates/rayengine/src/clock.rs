use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Abstraction over where monotonic instants originate from.
pub trait TimeSource: Send {
    /// Current monotonic instant.
    fn now(&self) -> Instant;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Time source that only moves when told to.
///
/// Clones share the same underlying instant, so a test can keep one clone
/// and hand the other to an [`crate::Application`].
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, step: Duration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current += step;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Frame timer measuring per-frame deltas and total elapsed time.
///
/// Call [`FrameTimer::tick`] once per frame; the delta is the time between
/// two ticks (or between the last reset and the first tick).
pub struct FrameTimer {
    source: BoxedTimeSource,
    start: Instant,
    last: Instant,
    delta: Duration,
    elapsed: Duration,
}

impl FrameTimer {
    pub fn new(source: BoxedTimeSource) -> Self {
        let now = source.now();
        Self {
            source,
            start: now,
            last: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Resets start and last tick to now.
    pub fn reset(&mut self) {
        let now = self.source.now();
        self.start = now;
        self.last = now;
        self.delta = Duration::ZERO;
        self.elapsed = Duration::ZERO;
    }

    /// Advances the timer by one frame and returns the delta.
    pub fn tick(&mut self) -> Duration {
        let now = self.source.now();
        self.delta = now.saturating_duration_since(self.last);
        self.elapsed = now.saturating_duration_since(self.start);
        self.last = now;
        self.delta
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_seconds(&self) -> f64 {
        self.delta.as_secs_f64()
    }

    pub fn delta_seconds_f32(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total time between the last reset and the last tick.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Live time since the last reset, independent of ticks.
    pub fn elapsed_millis(&self) -> f64 {
        self.source
            .now()
            .saturating_duration_since(self.start)
            .as_secs_f64()
            * 1_000.0
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl std::fmt::Debug for FrameTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTimer")
            .field("delta", &self.delta)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}
