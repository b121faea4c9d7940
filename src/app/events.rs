//! Outbound application events.
//!
//! The [`Controller`](crate::fsm::controller::Controller) emits these
//! through the [`EventSink`](super::ports::EventSink) port and sends
//! [`NotifyEvent`]s through the
//! [`NotificationSink`](super::ports::NotificationSink) port.  Adapters on
//! the other side decide what to do with them.

use crate::app::ports::ConfigError;
use crate::error::SafetyFault;
use crate::fsm::{ExitReason, Mode};

/// Structured operational events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started (carries the mode found in the store).
    Started(Mode),

    /// A mode session (or terminal mode) was entered.
    ModeStarted(Mode),

    /// A mode session ended.
    ModeEnded { mode: Mode, reason: ExitReason },

    /// The physical selector switch was turned off.
    SwitchOff,

    /// A safety interlock fired.
    SafetyTrip {
        fault: SafetyFault,
        temperature: f64,
        limit: f64,
    },

    /// A flame-out is being retried instead of raising an error.
    ReigniteAttempt { retries_left: u8 },

    /// A notification target fired.
    TargetReached(NotifyEvent),

    RecipeFound(String),
    RecipeNotFound(String),

    /// A reloaded settings document failed validation; the previous
    /// snapshot stays in effect.
    SettingsRejected(ConfigError),

    /// A named backend could not be used and a fallback was installed.
    BackendFallback {
        port: &'static str,
        requested: String,
        fallback: &'static str,
    },
}

/// Notification kinds handed to the notification transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyEvent {
    PrimaryTargetReached,
    Probe1TargetReached,
    Probe2TargetReached,
    TimerExpired,
    OverTemperature,
    FlameOut,
}

impl NotifyEvent {
    /// Event name understood by the notification transports.
    pub fn name(self) -> &'static str {
        match self {
            Self::PrimaryTargetReached => "Grill_Temp_Achieved",
            Self::Probe1TargetReached => "Probe1_Temp_Achieved",
            Self::Probe2TargetReached => "Probe2_Temp_Achieved",
            Self::TimerExpired => "Timer_Expired",
            Self::OverTemperature => "Grill_Error_01",
            Self::FlameOut => "Grill_Error_02",
        }
    }
}

impl From<SafetyFault> for NotifyEvent {
    fn from(fault: SafetyFault) -> Self {
        match fault {
            SafetyFault::OverTemperature => Self::OverTemperature,
            SafetyFault::FlameOut => Self::FlameOut,
        }
    }
}
