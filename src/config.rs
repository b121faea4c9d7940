//! Appliance settings document.
//!
//! All tunable parameters for the controller.  The document is owned by
//! an external store (JSON file, web UI) and re-read by the controller
//! every tick, so every field can be changed while a mode is running.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Temperature unit system used by probes, setpoints and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Units {
    #[default]
    #[serde(rename = "F")]
    Fahrenheit,
    #[serde(rename = "C")]
    Celsius,
}

impl Units {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Fahrenheit => "F",
            Self::Celsius => "C",
        }
    }
}

/// Relay drive polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerLevel {
    /// Relay energised by driving the pin low.
    #[default]
    #[serde(rename = "LOW")]
    ActiveLow,
    #[serde(rename = "HIGH")]
    ActiveHigh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Globals {
    pub units: Units,
    pub trigger_level: TriggerLevel,
    /// Startup/Reignite work-cycle length (seconds).
    pub startup_timer: u32,
    /// Shutdown work-cycle length (seconds).
    pub shutdown_timer: u32,
    /// Enables `debug!` level cycle trace.
    pub debug_mode: bool,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            units: Units::Fahrenheit,
            trigger_level: TriggerLevel::ActiveLow,
            startup_timer: 240,
            shutdown_timer: 60,
            debug_mode: false,
        }
    }
}

/// Feed cycling and PID tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleData {
    /// Proportional band.
    pub pb: f64,
    /// Integral time (seconds).
    pub ti: f64,
    /// Derivative time (seconds).
    pub td: f64,
    /// Hold-mode cycle length (seconds).
    pub hold_cycle_time: f64,
    /// Auger on-time during Startup/Smoke/Reignite (seconds).
    pub smoke_cycle_time: f64,
    /// Pause setting: each step adds 10 s of auger off-time.
    pub p_mode: u8,
    pub u_min: f64,
    pub u_max: f64,
    /// Steady-state duty ratio bias added to the proportional term.
    pub center: f64,
}

impl Default for CycleData {
    fn default() -> Self {
        Self {
            pb: 60.0,
            ti: 180.0,
            td: 45.0,
            hold_cycle_time: 20.0,
            smoke_cycle_time: 15.0,
            p_mode: 2,
            u_min: 0.15,
            u_max: 1.0,
            center: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetySettings {
    pub min_startup_temp: f64,
    pub max_startup_temp: f64,
    /// Over-temperature cutoff, applied in every running mode.
    pub max_temp: f64,
    /// Reignite attempts before a flame-out becomes an error.
    pub reignite_retries: u8,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            min_startup_temp: 75.0,
            max_startup_temp: 100.0,
            max_temp: 550.0,
            reignite_retries: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokePlusSettings {
    /// Default for `control.s_plus` after a reset.
    pub enabled: bool,
    pub min_temp: f64,
    pub max_temp: f64,
    /// Full fan on/off period (seconds).
    pub cycle: f64,
}

impl Default for SmokePlusSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            min_temp: 160.0,
            max_temp: 220.0,
            cycle: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepWarm {
    pub temp: f64,
    pub s_plus: bool,
}

impl Default for KeepWarm {
    fn default() -> Self {
        Self {
            temp: 165.0,
            s_plus: false,
        }
    }
}

/// Physical probe characterisation consumed by the ADC backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeProfile {
    pub name: String,
    /// Steinhart-Hart coefficients.
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl ProbeProfile {
    fn default_pt1000() -> Self {
        Self {
            name: "PT-1000-OEM".into(),
            a: 0.002_323_860_5,
            b: 0.000_248_049_4,
            c: 0.000_000_008_099,
        }
    }

    fn default_tx1001x() -> Self {
        Self {
            name: "TWPS00".into(),
            a: 0.000_770_255_5,
            b: 0.000_229_749_3,
            c: 0.000_000_116_916_1,
        }
    }
}

/// Probe → profile-name mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeTypes {
    pub primary: String,
    pub probe1: String,
    pub probe2: String,
}

impl Default for ProbeTypes {
    fn default() -> Self {
        Self {
            primary: "PT-1000-OEM".into(),
            probe1: "TWPS00".into(),
            probe2: "TWPS00".into(),
        }
    }
}

/// The profiles assigned to each probe, resolved from [`ProbeTypes`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeProfiles {
    pub primary: ProbeProfile,
    pub probe1: ProbeProfile,
    pub probe2: ProbeProfile,
}

/// Backend names resolved by the registry at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modules {
    pub platform: String,
    pub probes: String,
    pub display: String,
}

impl Default for Modules {
    fn default() -> Self {
        Self {
            platform: "prototype".into(),
            probes: "prototype".into(),
            display: "none".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Temperature filter window length (samples).
    pub qlength: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self { qlength: 10 }
    }
}

/// Full appliance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub globals: Globals,
    pub cycle_data: CycleData,
    pub safety: SafetySettings,
    pub smoke_plus: SmokePlusSettings,
    pub keep_warm: KeepWarm,
    pub probe_types: ProbeTypes,
    pub probe_profiles: BTreeMap<String, ProbeProfile>,
    pub modules: Modules,
    pub filter: FilterSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let mut probe_profiles = BTreeMap::new();
        for profile in [ProbeProfile::default_pt1000(), ProbeProfile::default_tx1001x()] {
            probe_profiles.insert(profile.name.clone(), profile);
        }
        Self {
            globals: Globals::default(),
            cycle_data: CycleData::default(),
            safety: SafetySettings::default(),
            smoke_plus: SmokePlusSettings::default(),
            keep_warm: KeepWarm::default(),
            probe_types: ProbeTypes::default(),
            probe_profiles,
            modules: Modules::default(),
            filter: FilterSettings::default(),
        }
    }
}

impl Settings {
    /// Range-check every tuning field.  Invalid values are rejected, never
    /// clamped: a bad `max_temp` must not silently disable the cutoff.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.cycle_data;
        if !(c.pb > 0.0 && c.pb.is_finite()) {
            return Err(ConfigError::ValidationFailed("cycle_data.pb must be > 0"));
        }
        if !(c.ti > 0.0 && c.ti.is_finite()) {
            return Err(ConfigError::ValidationFailed("cycle_data.ti must be > 0"));
        }
        if !(c.td >= 0.0 && c.td.is_finite()) {
            return Err(ConfigError::ValidationFailed("cycle_data.td must be >= 0"));
        }
        if !(c.hold_cycle_time > 0.0 && c.hold_cycle_time <= 600.0) {
            return Err(ConfigError::ValidationFailed(
                "cycle_data.hold_cycle_time must be 0–600 s",
            ));
        }
        if !(c.smoke_cycle_time > 0.0 && c.smoke_cycle_time <= 600.0) {
            return Err(ConfigError::ValidationFailed(
                "cycle_data.smoke_cycle_time must be 0–600 s",
            ));
        }
        if c.p_mode > 9 {
            return Err(ConfigError::ValidationFailed("cycle_data.p_mode must be 0–9"));
        }
        if !(0.0..=1.0).contains(&c.u_min) || !(0.0..=1.0).contains(&c.u_max) {
            return Err(ConfigError::ValidationFailed(
                "cycle_data.u_min/u_max must be 0.0–1.0",
            ));
        }
        if c.u_min > c.u_max {
            return Err(ConfigError::ValidationFailed(
                "cycle_data.u_min must not exceed u_max",
            ));
        }
        if !(0.0..=1.0).contains(&c.center) {
            return Err(ConfigError::ValidationFailed("cycle_data.center must be 0.0–1.0"));
        }

        let s = &self.safety;
        if s.min_startup_temp > s.max_startup_temp {
            return Err(ConfigError::ValidationFailed(
                "safety.min_startup_temp must not exceed max_startup_temp",
            ));
        }
        if !(s.max_temp > s.max_startup_temp && s.max_temp.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "safety.max_temp must exceed max_startup_temp",
            ));
        }

        if self.globals.startup_timer == 0 || self.globals.shutdown_timer == 0 {
            return Err(ConfigError::ValidationFailed(
                "globals.startup_timer/shutdown_timer must be > 0",
            ));
        }
        if self.smoke_plus.cycle <= 0.0 {
            return Err(ConfigError::ValidationFailed("smoke_plus.cycle must be > 0"));
        }
        if self.smoke_plus.min_temp > self.smoke_plus.max_temp {
            return Err(ConfigError::ValidationFailed(
                "smoke_plus.min_temp must not exceed max_temp",
            ));
        }
        if self.filter.qlength < 2 {
            return Err(ConfigError::ValidationFailed("filter.qlength must be >= 2"));
        }
        Ok(())
    }

    /// Resolve the profile assigned to each probe.  Unknown profile names
    /// resolve to `None` so the caller can keep the previous profiles.
    pub fn resolve_probe_profiles(&self) -> Option<ProbeProfiles> {
        let lookup = |name: &str| self.probe_profiles.get(name).cloned();
        Some(ProbeProfiles {
            primary: lookup(&self.probe_types.primary)?,
            probe1: lookup(&self.probe_types.probe1)?,
            probe2: lookup(&self.probe_types.probe2)?,
        })
    }
}
