//! Noise-rejecting moving average for a single probe.
//!
//! The queue keeps the last `qlength` raw readings.  Once the window is
//! full it reports the arithmetic mean, unless the window's population
//! standard deviation reaches the unit-dependent threshold, in which case
//! the last accepted average is reported instead.  Samples are always
//! enqueued; only the reported value is held.

use heapless::Deque;

use crate::config::Units;

/// Hard upper bound for `qlength`.
pub const WINDOW_CAPACITY: usize = 32;

/// Smallest window that yields a meaningful deviation.
pub const MIN_QLENGTH: usize = 2;

pub const DEFAULT_QLENGTH: usize = 10;

/// Deviation at which a window is treated as a glitch.
pub fn noise_threshold(units: Units) -> f64 {
    match units {
        Units::Fahrenheit => 4.75,
        Units::Celsius => 2.25,
    }
}

#[derive(Debug, Clone)]
pub struct TempQueue {
    window: Deque<f64, WINDOW_CAPACITY>,
    qlength: usize,
    units: Units,
    /// Last accepted average; `None` until a full window has been seen.
    last_good: Option<f64>,
}

impl TempQueue {
    /// `qlength` is clamped to `MIN_QLENGTH..=WINDOW_CAPACITY`.
    pub fn new(qlength: usize, units: Units) -> Self {
        Self {
            window: Deque::new(),
            qlength: qlength.clamp(MIN_QLENGTH, WINDOW_CAPACITY),
            units,
            last_good: None,
        }
    }

    pub fn qlength(&self) -> usize {
        self.qlength
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// `true` once the window holds `qlength` samples.
    pub fn is_warm(&self) -> bool {
        self.window.len() >= self.qlength
    }

    /// Append a raw reading and return the filtered average (0 while the
    /// window is still filling).
    pub fn enqueue(&mut self, raw: f64) -> f64 {
        while self.window.len() >= self.qlength {
            self.window.pop_front();
        }
        // qlength never exceeds the deque capacity, so there is room.
        let _ = self.window.push_back(raw);

        if !self.is_warm() {
            self.last_good = None;
            return 0.0;
        }

        let mean = self.round(self.mean());
        match self.last_good {
            Some(previous) if self.std_dev() >= noise_threshold(self.units) => previous,
            _ => {
                self.last_good = Some(mean);
                mean
            }
        }
    }

    /// The most recently reported average (0 while warming up).
    pub fn average(&self) -> f64 {
        self.last_good.unwrap_or(0.0)
    }

    /// Discard every sample, e.g. after a unit change.
    pub fn reset(&mut self, units: Units) {
        self.window.clear();
        self.units = units;
        self.last_good = None;
    }

    fn mean(&self) -> f64 {
        let n = self.window.len() as f64;
        self.window.iter().sum::<f64>() / n
    }

    fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let n = self.window.len() as f64;
        let var = self.window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        var.sqrt()
    }

    fn round(&self, value: f64) -> f64 {
        match self.units {
            Units::Fahrenheit => value.trunc(),
            Units::Celsius => (value * 10.0).round() / 10.0,
        }
    }
}
