//! Time sources driving bucket refill and blocking waits.
//!
//! Buckets never read the system clock directly. Every operation asks a
//! [`TimeSource`] for the current monotonic nanosecond timestamp, and the
//! blocking consume parks the calling thread through the same trait. This
//! keeps the admission logic deterministic under test: swap in a
//! [`ManualClock`] and drive time by hand.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::error::AdmitResult;
use crate::types::Nanos;

/// Supplier of monotonic nanosecond timestamps and a blocking sleep.
///
/// Implementations must be cheap to call on every operation. The timestamps
/// should be monotonic, but the refill engine clamps regressions to zero
/// elapsed time, so a wall-clock adjustment slipping through cannot crash or
/// starve a bucket.
pub trait TimeSource: Send + Sync {
    /// Current time in nanoseconds.
    fn current_time_nanos(&self) -> Nanos;

    /// Suspends the calling thread for at least `duration_nanos`.
    ///
    /// Returns [`AdmitError::Interrupted`](crate::AdmitError::Interrupted)
    /// if the wait was cut short. Callers that committed a token
    /// reservation before parking keep the reservation either way.
    fn park_for(&self, duration_nanos: Nanos) -> AdmitResult;
}

// Wall-clock epoch captured once at first use, advanced by a monotonic
// Instant afterwards. Timestamps keep increasing even if the system clock
// is stepped backwards.
static TIME_BASE: OnceLock<(Instant, Nanos)> = OnceLock::new();

fn time_base() -> &'static (Instant, Nanos) {
    TIME_BASE.get_or_init(|| {
        let epoch_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as Nanos;
        (Instant::now(), epoch_nanos)
    })
}

/// Production time source.
///
/// Anchors a wall-clock epoch base at first use and advances it with
/// [`Instant`], so the reported time is immune to system clock steps.
/// Parking maps to [`std::thread::sleep`].
///
/// # Example
///
/// ```rust
/// use admission_core::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock;
/// let t1 = clock.current_time_nanos();
/// let t2 = clock.current_time_nanos();
/// assert!(t2 >= t1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl TimeSource for MonotonicClock {
    fn current_time_nanos(&self) -> Nanos {
        let (start, base_nanos) = time_base();
        base_nanos.saturating_add(start.elapsed().as_nanos() as Nanos)
    }

    fn park_for(&self, duration_nanos: Nanos) -> AdmitResult {
        if duration_nanos > 0 {
            thread::sleep(Duration::from_nanos(duration_nanos as u64));
        }
        Ok(())
    }
}

/// Hand-driven time source for tests.
///
/// Starts at an arbitrary timestamp and only moves when told to. Parking
/// advances the clock by the requested duration instead of sleeping, so
/// blocking consume paths run instantly and deterministically.
///
/// # Example
///
/// ```rust
/// use admission_core::{ManualClock, TimeSource};
///
/// let clock = ManualClock::new(0);
/// clock.advance(1_000);
/// assert_eq!(clock.current_time_nanos(), 1_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now_nanos: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `start_nanos`.
    pub fn new(start_nanos: Nanos) -> Self {
        ManualClock {
            now_nanos: AtomicI64::new(start_nanos),
        }
    }

    /// Moves the clock forward by `delta_nanos`.
    pub fn advance(&self, delta_nanos: Nanos) {
        self.now_nanos.fetch_add(delta_nanos, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute timestamp. May move time backwards,
    /// which the refill engine treats as zero elapsed time.
    pub fn set(&self, now_nanos: Nanos) {
        self.now_nanos.store(now_nanos, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn current_time_nanos(&self) -> Nanos {
        self.now_nanos.load(Ordering::SeqCst)
    }

    fn park_for(&self, duration_nanos: Nanos) -> AdmitResult {
        if duration_nanos > 0 {
            self.advance(duration_nanos);
        }
        Ok(())
    }
}
