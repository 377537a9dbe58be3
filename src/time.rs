use std::sync::atomic::{AtomicI64, Ordering};
#[cfg(not(target_os = "linux"))]
use std::time::Instant;

use chrono::Utc;

/// Source of the two timestamps stamped on every session transition.
pub trait Clock: Send + Sync {
    /// Monotonic milliseconds since boot, including time spent suspended.
    fn since_boot_millis(&self) -> i64;
    /// Milliseconds since the Unix epoch.
    fn wall_millis(&self) -> i64;
}

/// Clock backed by the host.
///
/// On Linux the since-boot value is `CLOCK_BOOTTIME`, read on every call, so
/// it keeps counting across suspend. Other hosts get a process-relative
/// monotonic value starting at zero.
#[derive(Debug)]
pub struct SystemClock {
    #[cfg(not(target_os = "linux"))]
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "linux"))]
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[cfg(target_os = "linux")]
    fn since_boot_millis(&self) -> i64 {
        use rustix::time::{clock_gettime, ClockId};

        let now = clock_gettime(ClockId::Boottime);
        now.tv_sec
            .saturating_mul(1000)
            .saturating_add(i64::from(now.tv_nsec) / 1_000_000)
    }

    #[cfg(not(target_os = "linux"))]
    fn since_boot_millis(&self) -> i64 {
        i64::try_from(self.anchor.elapsed().as_millis()).unwrap_or(i64::MAX)
    }

    fn wall_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    since_boot: AtomicI64,
    wall: AtomicI64,
}

impl ManualClock {
    pub fn new(since_boot_millis: i64, wall_millis: i64) -> Self {
        Self {
            since_boot: AtomicI64::new(since_boot_millis),
            wall: AtomicI64::new(wall_millis),
        }
    }

    /// Moves both clocks forward by the same amount.
    pub fn advance(&self, millis: i64) {
        self.since_boot.fetch_add(millis, Ordering::SeqCst);
        self.wall.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, since_boot_millis: i64, wall_millis: i64) {
        self.since_boot.store(since_boot_millis, Ordering::SeqCst);
        self.wall.store(wall_millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn since_boot_millis(&self) -> i64 {
        self.since_boot.load(Ordering::SeqCst)
    }

    fn wall_millis(&self) -> i64 {
        self.wall.load(Ordering::SeqCst)
    }
}
