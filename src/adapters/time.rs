//! Clock adapters.
//!
//! - [`SystemClock`] wraps `std::time::Instant` (monotonic) and
//!   `SystemTime` (wall clock) and really sleeps.
//! - [`SimClock`] advances both clocks by the requested duration instead
//!   of sleeping, so hours of appliance time run in milliseconds.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::app::ports::Clock;

/// Real time.
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn monotonic(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn wall(&self) -> f64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64())
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated time.  `sleep` advances the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    monotonic: f64,
    wall: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// Arbitrary wall-clock origin (2024-01-01T00:00:00Z).
    pub const WALL_ORIGIN: f64 = 1_704_067_200.0;

    pub fn new() -> Self {
        Self {
            monotonic: 0.0,
            wall: Self::WALL_ORIGIN,
        }
    }

    /// Start at the given wall-clock epoch seconds.
    pub fn starting_at(wall: f64) -> Self {
        Self {
            monotonic: 0.0,
            wall,
        }
    }

    pub fn advance(&mut self, seconds: f64) {
        self.monotonic += seconds;
        self.wall += seconds;
    }

    /// Move only the wall clock, as an NTP correction would.
    pub fn set_wall(&mut self, wall: f64) {
        self.wall = wall;
    }
}

impl Clock for SimClock {
    fn monotonic(&self) -> f64 {
        self.monotonic
    }

    fn wall(&self) -> f64 {
        self.wall
    }

    fn sleep(&mut self, duration: Duration) {
        self.advance(duration.as_secs_f64());
    }
}
