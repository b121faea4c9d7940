//! Thermal safety interlocks.
//!
//! Pure decision logic; the controller applies the consequences (mode
//! change, display text, notification).
//!
//! ## Interlocks
//!
//! * **Startup watchdog**: at Startup/Reignite entry the minimum
//!   sustained temperature is fixed at 90 % of the entry reading, clamped
//!   to the configured startup band.
//! * **Flame-out**: in Smoke/Hold, an average below that threshold means
//!   the fire went out while pellets are still being fed.
//! * **Over-temperature**: in every running mode, an average above
//!   `max_temp` trips immediately.
//!
//! Checks are only evaluated against a warm filter average; the filter's
//! warm-up sentinel is never compared against a limit.

use crate::config::SafetySettings;
use crate::control_state::SafetyState;
use crate::error::SafetyFault;
use crate::fsm::Mode;

/// Startup watchdog threshold for an entry reading.
pub fn startup_threshold(entry_temp: f64, limits: &SafetySettings) -> f64 {
    (entry_temp * 0.9)
        .max(limits.min_startup_temp)
        .min(limits.max_startup_temp)
        .trunc()
}

/// A tripped interlock with the values that tripped it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trip {
    pub fault: SafetyFault,
    pub temperature: f64,
    pub limit: f64,
}

/// Modes that are subject to the flame-out check.
fn feeds_unattended(mode: Mode) -> bool {
    matches!(mode, Mode::Smoke | Mode::Hold)
}

/// Check performed once when Smoke or Hold is entered: the fire must have
/// reached the watchdog threshold by the end of the last ignition.
pub fn check_entry(mode: Mode, state: &SafetyState) -> Option<Trip> {
    (feeds_unattended(mode) && state.after_start_temp < state.startup_temp).then_some(Trip {
        fault: SafetyFault::FlameOut,
        temperature: state.after_start_temp,
        limit: state.startup_temp,
    })
}

/// Periodic check against the smoothed primary temperature.
pub fn check_running(
    mode: Mode,
    average: f64,
    state: &SafetyState,
    limits: &SafetySettings,
) -> Option<Trip> {
    if average > limits.max_temp {
        return Some(Trip {
            fault: SafetyFault::OverTemperature,
            temperature: average,
            limit: limits.max_temp,
        });
    }
    if feeds_unattended(mode) && average < state.startup_temp {
        return Some(Trip {
            fault: SafetyFault::FlameOut,
            temperature: average,
            limit: state.startup_temp,
        });
    }
    None
}

/// What to do about a flame-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlameOutResponse {
    /// Try to relight; carries the retries left after this attempt.
    Reignite { retries_left: u8 },
    Error,
}

pub fn flame_out_response(state: &SafetyState) -> FlameOutResponse {
    match state.reignite_retries {
        0 => FlameOutResponse::Error,
        n => FlameOutResponse::Reignite {
            retries_left: n - 1,
        },
    }
}
