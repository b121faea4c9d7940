//! Per-session state.
//!
//! A [`Session`] exists while a work-cycle or passive mode is running.  It
//! owns everything that lives exactly as long as the mode: the probe
//! filters, the cycle controller, Smoke Plus state, and the timestamps
//! of the periodic duties.  Dropping it discards all of them.

use crate::config::Settings;
use crate::control::CycleController;
use crate::control::smoke_plus::SmokePlus;
use crate::sensors::ProbeFilters;

use super::Mode;

/// Seconds between history writes (and safety/notification checks).
pub const HISTORY_INTERVAL_SECS: f64 = 3.0;

/// Seconds between display refreshes.
pub const DISPLAY_INTERVAL_SECS: f64 = 0.5;

pub struct Session {
    pub mode: Mode,
    /// Monotonic seconds at entry.
    pub started: f64,
    /// Resolved time limit, if the mode has one.
    pub time_limit: Option<f64>,
    pub filters: ProbeFilters,
    /// Present for work-cycle modes only.
    pub cycle: Option<CycleController>,
    pub smoke_plus: SmokePlus,
    /// Switch position at the previous poll.
    pub switch_last: bool,
    last_history: f64,
    last_display: f64,
}

impl Session {
    pub fn new(mode: Mode, settings: &Settings, setpoint: f64, switch_on: bool, now: f64) -> Self {
        let descriptor = mode.descriptor();
        Self {
            mode,
            started: now,
            time_limit: descriptor
                .time_limit
                .map(|limit| limit.seconds(&settings.globals)),
            filters: ProbeFilters::from_settings(settings),
            cycle: mode
                .is_work_cycle()
                .then(|| CycleController::new(mode, settings, setpoint, now)),
            smoke_plus: SmokePlus::new(now),
            switch_last: switch_on,
            last_history: now,
            last_display: now,
        }
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.started
    }

    /// `true` once the session has outlived its time limit.
    pub fn expired(&self, now: f64) -> bool {
        self.time_limit
            .is_some_and(|limit| self.elapsed(now) > limit)
    }

    /// Claims the history slot when at least [`HISTORY_INTERVAL_SECS`]
    /// have passed since the last one.
    pub fn history_due(&mut self, now: f64) -> bool {
        if now - self.last_history >= HISTORY_INTERVAL_SECS {
            self.last_history = now;
            true
        } else {
            false
        }
    }

    pub fn display_due(&mut self, now: f64) -> bool {
        if now - self.last_display >= DISPLAY_INTERVAL_SECS {
            self.last_display = now;
            true
        } else {
            false
        }
    }
}
