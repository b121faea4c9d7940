//! Smoke Plus fan cycling.
//!
//! While Smoke Plus is active the combustion fan is pulsed to produce more
//! smoke.  Outside the `[min_temp, max_temp]` band the fan is held on.

use crate::config::SmokePlusSettings;
use crate::fsm::Mode;

/// Inputs sampled once per tick.
#[derive(Debug, Clone, Copy)]
pub struct FanSample {
    pub mode: Mode,
    /// Smoothed primary temperature.
    pub average: f64,
    pub setpoint: f64,
    /// `control.s_plus`
    pub enabled: bool,
    pub fan_on: bool,
    /// Monotonic seconds.
    pub now: f64,
}

#[derive(Debug, Clone)]
pub struct SmokePlus {
    last_toggle: f64,
    target_reached: bool,
}

impl SmokePlus {
    pub fn new(now: f64) -> Self {
        Self {
            last_toggle: now,
            target_reached: false,
        }
    }

    /// Whether Hold has reached its setpoint during this session.
    pub fn target_reached(&self) -> bool {
        self.target_reached
    }

    /// Returns the fan state to command, or `None` to leave it alone.
    pub fn step(&mut self, sample: FanSample, settings: &SmokePlusSettings) -> Option<bool> {
        if sample.mode == Mode::Hold && sample.average >= sample.setpoint {
            self.target_reached = true;
        }

        let active = sample.mode == Mode::Smoke || (sample.mode == Mode::Hold && self.target_reached);
        if active && sample.enabled {
            if sample.average > settings.max_temp || sample.average < settings.min_temp {
                return Some(true);
            }
            if sample.now - self.last_toggle > settings.cycle * 0.5 {
                self.last_toggle = sample.now;
                return Some(!sample.fan_on);
            }
            None
        } else if !sample.enabled && !sample.fan_on {
            Some(true)
        } else {
            None
        }
    }
}
