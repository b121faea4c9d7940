//! Unified error types for the controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level tick loop's error handling uniform.  Safety faults are not
//! errors in the control-flow sense (they force a mode transition), but
//! they share the taxonomy so they can be logged and reported uniformly.

use core::fmt;

use crate::app::ports::{ConfigError, StoreError};

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A settings/control/history store failed.
    Store(StoreError),
    /// Settings are invalid.
    Config(ConfigError),
    /// A hardware backend could not be set up or driven.
    Sensor(SensorError),
    /// A safety interlock fired.
    Safety(SafetyFault),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Safety(e) => write!(f, "safety: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Hardware backend failures.  Individual probe reads never fail (they
/// report the read-failure sentinel); these cover backend setup and bus
/// access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The named backend could not be initialised.
    BackendUnavailable(String),
    /// A pin or bus operation failed.
    Bus(String),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendUnavailable(name) => write!(f, "backend {name:?} unavailable"),
            Self::Bus(msg) => write!(f, "bus error: {msg}"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Safety faults always surface as a forced transition to `Error` (or a
/// reignite attempt), a logged event and a best-effort notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyFault {
    /// Average primary temperature exceeded `settings.safety.max_temp`.
    OverTemperature,
    /// Average primary temperature fell below the recorded startup
    /// temperature while feeding (flame-out).
    FlameOut,
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverTemperature => write!(f, "over temperature"),
            Self::FlameOut => write!(f, "temperature below startup minimum"),
        }
    }
}

impl From<SafetyFault> for Error {
    fn from(e: SafetyFault) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
