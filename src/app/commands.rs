//! Inbound operator commands.
//!
//! These represent the requests the outside world (web UI, CLI) makes of
//! the controller.  They never call into the controller directly: each one
//! is applied to the control document, which the controller picks up on
//! its next tick.

use crate::control_state::{ManualOverrides, TargetActions};
use crate::fsm::Mode;

/// Which notification target a command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Primary,
    Probe1,
    Probe2,
}

/// Commands that external adapters can apply to the control document.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Request a plain mode change (Startup, Smoke, Shutdown, Stop, ...).
    SetMode(Mode),

    /// Enter Hold at the given primary setpoint.
    Hold { setpoint: f64 },

    /// Enter Manual mode.
    Manual,

    /// Apply output overrides while in Manual mode.
    ManualOutputs {
        auger: bool,
        igniter: bool,
        fan: bool,
        power: bool,
    },

    /// Arm a temperature target.
    ArmTarget {
        target: Target,
        setpoint: f64,
        actions: TargetActions,
    },

    /// Start the countdown timer (`now` is wall-clock epoch seconds).
    StartTimer {
        now: f64,
        seconds: f64,
        actions: TargetActions,
    },

    /// Enable or disable Smoke Plus fan cycling.
    SmokePlus(bool),

    /// Run the named recipe.
    Recipe(String),

    /// Ask the running mode to reload probe profiles.
    ReloadProbeProfiles,
}

impl ControlCommand {
    /// Apply the command using the control document's
    /// read-modify-write contract.
    pub fn apply(&self, control: &mut crate::control_state::ControlState) {
        match self {
            Self::SetMode(mode) => control.request_mode(*mode),
            Self::Hold { setpoint } => {
                control.setpoints.primary = *setpoint;
                control.request_mode(Mode::Hold);
            }
            Self::Manual => control.request_mode(Mode::Manual),
            Self::ManualOutputs {
                auger,
                igniter,
                fan,
                power,
            } => {
                control.manual = ManualOverrides {
                    change: true,
                    auger: *auger,
                    igniter: *igniter,
                    fan: *fan,
                    power: *power,
                };
            }
            Self::ArmTarget {
                target,
                setpoint,
                actions,
            } => match target {
                Target::Primary => {
                    control.setpoints.primary = *setpoint;
                    control.notify_req.primary = true;
                }
                Target::Probe1 => {
                    control.setpoints.probe1 = *setpoint;
                    control.notify_req.probe1 = true;
                    control.notify_data.probe1 = *actions;
                }
                Target::Probe2 => {
                    control.setpoints.probe2 = *setpoint;
                    control.notify_req.probe2 = true;
                    control.notify_data.probe2 = *actions;
                }
            },
            Self::StartTimer {
                now,
                seconds,
                actions,
            } => {
                control.timer.start = *now;
                control.timer.paused = 0.0;
                control.timer.end = now + seconds;
                control.notify_req.timer = true;
                control.notify_data.timer = *actions;
            }
            Self::SmokePlus(on) => control.s_plus = *on,
            Self::Recipe(name) => {
                control.recipe.clone_from(name);
                control.request_mode(Mode::Recipe);
            }
            Self::ReloadProbeProfiles => control.probe_profile_update = true,
        }
    }
}
