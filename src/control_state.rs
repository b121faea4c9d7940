//! The control document.
//!
//! `ControlState` is the single source of cross-mode coordination: the web
//! UI writes mode-change requests into it, the controller reads it every
//! tick and writes back safety bookkeeping and cleared notification
//! requests.  Writes are read-modify-write with last-writer-wins
//! semantics; there is no optimistic-concurrency guard.

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::fsm::Mode;

/// Session status reported next to the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    #[default]
    Inactive,
    /// Watching an OEM controller; an over-temperature trip keeps
    /// appliance power on.
    Monitor,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Setpoints {
    pub primary: f64,
    pub probe1: f64,
    pub probe2: f64,
}

/// Startup watchdog bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyState {
    /// Minimum temperature the fire must hold once feeding unattended.
    pub startup_temp: f64,
    /// Last average primary temperature recorded during Startup/Reignite.
    pub after_start_temp: f64,
    pub reignite_retries: u8,
    /// Mode to resume once a reignite completes.
    pub reignite_last_state: Mode,
}

impl Default for SafetyState {
    fn default() -> Self {
        Self {
            startup_temp: 0.0,
            after_start_temp: 0.0,
            reignite_retries: 0,
            reignite_last_state: Mode::Smoke,
        }
    }
}

/// Armed notification requests.  A request is cleared when it fires and
/// must be re-armed externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyRequests {
    pub primary: bool,
    pub probe1: bool,
    pub probe2: bool,
    pub timer: bool,
}

/// Follow-up actions taken when a notification target fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetActions {
    pub shutdown: bool,
    pub keep_warm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyActions {
    pub probe1: TargetActions,
    pub probe2: TargetActions,
    pub timer: TargetActions,
}

/// Countdown timer, wall-clock epoch seconds; all zero when idle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Timer {
    pub start: f64,
    pub paused: f64,
    pub end: f64,
}

impl Timer {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Output overrides applied in Manual mode when `change` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualOverrides {
    pub change: bool,
    pub auger: bool,
    pub igniter: bool,
    pub fan: bool,
    pub power: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlState {
    pub mode: Mode,
    pub status: Status,
    /// External mode-change request; consumed by the controller.
    pub updated: bool,
    pub setpoints: Setpoints,
    pub safety: SafetyState,
    pub notify_req: NotifyRequests,
    pub notify_data: NotifyActions,
    pub timer: Timer,
    pub manual: ManualOverrides,
    /// Active recipe name.
    pub recipe: String,
    /// Smoke Plus fan cycling.
    pub s_plus: bool,
    pub probe_profile_update: bool,
    pub units_change: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self::with_defaults(&Settings::default())
    }
}

impl ControlState {
    /// A fresh control document seeded from the current settings.
    pub fn with_defaults(settings: &Settings) -> Self {
        Self {
            mode: Mode::Stop,
            status: Status::Inactive,
            updated: false,
            setpoints: Setpoints::default(),
            safety: SafetyState {
                reignite_retries: settings.safety.reignite_retries,
                ..SafetyState::default()
            },
            notify_req: NotifyRequests::default(),
            notify_data: NotifyActions::default(),
            timer: Timer::default(),
            manual: ManualOverrides::default(),
            recipe: String::new(),
            s_plus: settings.smoke_plus.enabled,
            probe_profile_update: false,
            units_change: false,
        }
    }

    /// Request a mode change the same way the web UI does.
    pub fn request_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.updated = true;
    }
}
