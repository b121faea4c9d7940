//! Probe readings and the per-probe filter bank.
//!
//! The temperature backend produces raw [`ProbeReadings`] each tick;
//! [`ProbeFilters`] owns one [`TempQueue`] per probe and turns them into
//! smoothed readings for the control core.

pub mod temp_queue;

use crate::config::{Settings, Units};
use temp_queue::TempQueue;

/// One reading per probe.  A probe that could not be read reports 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbeReadings {
    /// Chamber probe, used for control and safety.
    pub primary: f64,
    pub probe1: f64,
    pub probe2: f64,
}

/// Filter bank for the three probes.
#[derive(Debug, Clone)]
pub struct ProbeFilters {
    primary: TempQueue,
    probe1: TempQueue,
    probe2: TempQueue,
    latest: ProbeReadings,
}

impl ProbeFilters {
    pub fn new(qlength: usize, units: Units) -> Self {
        Self {
            primary: TempQueue::new(qlength, units),
            probe1: TempQueue::new(qlength, units),
            probe2: TempQueue::new(qlength, units),
            latest: ProbeReadings::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.filter.qlength, settings.globals.units)
    }

    /// Feed one raw sample per probe and return the smoothed readings.
    pub fn push(&mut self, raw: &ProbeReadings) -> ProbeReadings {
        self.latest = ProbeReadings {
            primary: self.primary.enqueue(raw.primary),
            probe1: self.probe1.enqueue(raw.probe1),
            probe2: self.probe2.enqueue(raw.probe2),
        };
        self.latest
    }

    /// The most recent smoothed readings.
    pub fn latest(&self) -> ProbeReadings {
        self.latest
    }

    /// The primary filter gates safety and notification decisions.
    pub fn is_warm(&self) -> bool {
        self.primary.is_warm()
    }

    pub fn reset(&mut self, units: Units) {
        self.primary.reset(units);
        self.probe1.reset(units);
        self.probe2.reset(units);
        self.latest = ProbeReadings::default();
    }
}
