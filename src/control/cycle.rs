//! Auger duty-cycle computation and drive.
//!
//! [`compute_cycle`] derives the fixed per-mode cycle.  [`CycleController`]
//! owns the live cycle for one work-cycle session: it toggles the feed on
//! elapsed time since the last toggle and, in Hold, recomputes the ratio
//! from the PID each time the auger switches on.

use log::debug;

use crate::app::ports::Actuator;
use crate::config::{CycleData, Settings};
use crate::control::pid::PidController;
use crate::fsm::Mode;

/// Feed timing for one cycle, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleParameters {
    pub on_time: f64,
    pub off_time: f64,
    pub cycle_time: f64,
    pub ratio: f64,
}

impl CycleParameters {
    /// Feed disabled.
    pub const FEED_OFF: Self = Self {
        on_time: 0.0,
        off_time: 100.0,
        cycle_time: 100.0,
        ratio: 0.0,
    };

    /// Split `cycle_time` by `ratio` (clamped to `0..=1`).
    pub fn from_ratio(cycle_time: f64, ratio: f64) -> Self {
        let ratio = ratio.clamp(0.0, 1.0);
        let on_time = cycle_time * ratio;
        let off_time = cycle_time * (1.0 - ratio);
        Self {
            on_time,
            off_time,
            cycle_time: on_time + off_time,
            ratio,
        }
    }

    /// Fixed on-time cycle used while establishing or feeding a fire.
    pub fn smoke(cycle: &CycleData) -> Self {
        let on_time = cycle.smoke_cycle_time;
        let off_time = 45.0 + f64::from(cycle.p_mode) * 10.0;
        let cycle_time = on_time + off_time;
        Self {
            on_time,
            off_time,
            cycle_time,
            ratio: on_time / cycle_time,
        }
    }
}

/// Cycle parameters at the start of a session in `mode`.
pub fn compute_cycle(mode: Mode, settings: &Settings) -> CycleParameters {
    let cycle = &settings.cycle_data;
    match mode {
        Mode::Startup | Mode::Smoke | Mode::Reignite => CycleParameters::smoke(cycle),
        Mode::Hold => CycleParameters::from_ratio(cycle.hold_cycle_time, cycle.u_min),
        Mode::Shutdown
        | Mode::Monitor
        | Mode::Manual
        | Mode::Recipe
        | Mode::Stop
        | Mode::Error => CycleParameters::FEED_OFF,
    }
}

/// A feed toggle performed by [`CycleController::drive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedToggle {
    On,
    Off,
}

/// Live cycle state for one work-cycle session.
#[derive(Debug, Clone)]
pub struct CycleController {
    mode: Mode,
    params: CycleParameters,
    last_toggle: f64,
    /// Present only in Hold.
    pid: Option<PidController>,
    u_min: f64,
    u_max: f64,
    hold_cycle_time: f64,
}

impl CycleController {
    /// `setpoint` seeds the PID in Hold; `now` is monotonic seconds.
    pub fn new(mode: Mode, settings: &Settings, setpoint: f64, now: f64) -> Self {
        let cycle = &settings.cycle_data;
        let pid = (mode == Mode::Hold).then(|| {
            let mut pid = PidController::new(cycle.pb, cycle.ti, cycle.td, cycle.center);
            pid.set_target(setpoint, now);
            pid
        });
        let params = compute_cycle(mode, settings);
        debug!(
            "* On Time = {:.2}, OffTime = {:.2}, CycleTime = {:.2}, CycleRatio = {:.3}",
            params.on_time, params.off_time, params.cycle_time, params.ratio
        );
        Self {
            mode,
            params,
            last_toggle: now,
            pid,
            u_min: cycle.u_min,
            u_max: cycle.u_max,
            hold_cycle_time: cycle.hold_cycle_time,
        }
    }

    pub fn params(&self) -> CycleParameters {
        self.params
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Toggle the feed if the current phase has run its course.
    /// `average` is the smoothed primary temperature.
    pub fn drive<A: Actuator + ?Sized>(
        &mut self,
        actuator: &mut A,
        now: f64,
        average: f64,
    ) -> Option<FeedToggle> {
        let elapsed = now - self.last_toggle;
        let feeding = actuator.status().auger;

        if !feeding && elapsed > self.params.off_time {
            actuator.set_auger(true);
            self.last_toggle = now;
            if let Some(pid) = self.pid.as_mut() {
                let ratio = pid.update(average, now).clamp(self.u_min, self.u_max);
                self.params = CycleParameters::from_ratio(self.hold_cycle_time, ratio);
                debug!(
                    "* On Time = {:.2}, OffTime = {:.2}, CycleTime = {:.2}, CycleRatio = {:.3}",
                    self.params.on_time,
                    self.params.off_time,
                    self.params.cycle_time,
                    self.params.ratio
                );
            }
            debug!("* Cycle Event: Auger On");
            return Some(FeedToggle::On);
        }

        if feeding && elapsed > self.params.on_time {
            actuator.set_auger(false);
            self.last_toggle = now;
            debug!("* Cycle Event: Auger Off");
            return Some(FeedToggle::Off);
        }

        None
    }
}
