//! Port traits: the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (stores, probes, relays, display, notification
//! transports) implement these traits.  The
//! [`Controller`](crate::fsm::controller::Controller) consumes them via
//! generics, so the control core never touches hardware or files directly.
//!
//! Ports are grouped into three bundles with blanket impls
//! ([`StorePorts`], [`HardwarePorts`], [`SinkPorts`]) so a single adapter
//! may satisfy a whole bundle, the same way one hardware adapter serves
//! both sensor reads and actuator writes.

use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::events::{AppEvent, NotifyEvent};
use crate::config::{ProbeProfiles, Settings, Units};
use crate::control_state::ControlState;
use crate::fsm::Mode;
use crate::sensors::ProbeReadings;

// ───────────────────────────────────────────────────────────────
// Store ports (driven adapters: domain ↔ persisted documents)
// ───────────────────────────────────────────────────────────────

/// Read-only access to the settings document.
pub trait SettingsStore {
    fn read_settings(&self) -> Result<Settings, StoreError>;
}

/// Read/write access to the control document.
///
/// A read immediately following a write must observe that write.
pub trait ControlStore {
    fn read_control(&self) -> Result<ControlState, StoreError>;
    fn write_control(&mut self, control: &ControlState) -> Result<(), StoreError>;
}

/// Destination for periodic temperature history.
pub trait HistorySink {
    fn write_history(&mut self, entry: &HistoryEntry) -> Result<(), StoreError>;
}

/// Named recipe lookup.
pub trait RecipeBook {
    fn find_recipe(&self, name: &str) -> Option<Recipe>;
}

pub trait StorePorts: SettingsStore + ControlStore + HistorySink + RecipeBook {}

impl<T: SettingsStore + ControlStore + HistorySink + RecipeBook> StorePorts for T {}

// ───────────────────────────────────────────────────────────────
// Hardware ports (driven adapters: probes, relays, selector switch)
// ───────────────────────────────────────────────────────────────

/// Probe backend.  Must return the read-failure sentinel (0.0) for a
/// probe that cannot be read rather than failing.
pub trait TemperatureSource {
    fn read_all(&mut self) -> ProbeReadings;

    /// Push new physical probe profiles to the backend.
    fn set_profiles(&mut self, profiles: &ProbeProfiles);

    /// Switch the unit system readings are reported in.
    fn update_units(&mut self, units: Units);
}

/// Logical state of the four appliance outputs (`true` = energised),
/// independent of relay polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outputs {
    pub auger: bool,
    pub igniter: bool,
    pub fan: bool,
    pub power: bool,
}

impl Outputs {
    pub const ALL_OFF: Self = Self {
        auger: false,
        igniter: false,
        fan: false,
        power: false,
    };
}

/// Relay outputs.  The helpers are read-modify-write over [`set`].
///
/// [`set`]: Actuator::set
pub trait Actuator {
    fn set(&mut self, outputs: Outputs);

    fn status(&self) -> Outputs;

    fn set_auger(&mut self, on: bool) {
        let mut o = self.status();
        o.auger = on;
        self.set(o);
    }

    fn set_igniter(&mut self, on: bool) {
        let mut o = self.status();
        o.igniter = on;
        self.set(o);
    }

    fn set_fan(&mut self, on: bool) {
        let mut o = self.status();
        o.fan = on;
        self.set(o);
    }

    fn set_power(&mut self, on: bool) {
        let mut o = self.status();
        o.power = on;
        self.set(o);
    }
}

/// Physical on/off selector switch.
pub trait PhysicalInput {
    /// `true` when the switch is in the "on" position.
    fn is_on(&mut self) -> bool;
}

pub trait HardwarePorts: TemperatureSource + Actuator + PhysicalInput {}

impl<T: TemperatureSource + Actuator + PhysicalInput> HardwarePorts for T {}

// ───────────────────────────────────────────────────────────────
// Sink ports (driven adapters: domain → display / notify / log)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget display output.
pub trait DisplaySink {
    fn show_temperature(&mut self, value: f64);
    fn show_text(&mut self, message: &str);
    fn clear(&mut self);
}

/// Outbound notification transport (push, webhook, ...).  The core calls
/// `send` exactly once per satisfied condition; delivery is best-effort.
pub trait NotificationSink {
    fn send(&mut self, event: NotifyEvent);
}

/// The core emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, event file, UI feed).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

pub trait SinkPorts: DisplaySink + NotificationSink + EventSink {}

impl<T: DisplaySink + NotificationSink + EventSink> SinkPorts for T {}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Time source.  Intervals are always measured on the monotonic clock;
/// the wall clock is only compared against the countdown timer.
pub trait Clock {
    /// Monotonic seconds since an arbitrary origin.
    fn monotonic(&self) -> f64;

    /// Wall-clock seconds since the Unix epoch.
    fn wall(&self) -> f64;

    /// Block until the next tick.
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Document types carried across ports
// ───────────────────────────────────────────────────────────────

/// One periodic history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Wall-clock epoch seconds.
    pub timestamp: f64,
    pub mode: Mode,
    pub primary: f64,
    pub primary_setpoint: f64,
    pub probe1: f64,
    pub probe1_setpoint: f64,
    pub probe2: f64,
    pub probe2_setpoint: f64,
    pub outputs: Outputs,
}

/// A stored recipe.  Step execution is not implemented; steps are kept
/// opaque.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<serde_json::Value>,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from store ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No document has been written yet.
    NotFound,
    /// The stored document failed to deserialize.
    Corrupted(String),
    /// Generic I/O error from the backend.
    Io(String),
}

/// Errors from settings validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A settings field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "document not found"),
            Self::Corrupted(msg) => write!(f, "document corrupted: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}
impl std::error::Error for ConfigError {}
