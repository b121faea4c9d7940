//! Backend registry.
//!
//! Resolves the backend names in `settings.modules` to constructed
//! adapters at startup.  Each port has its own name table:
//!
//! ```text
//!   settings.modules.probes   ──▶ TemperatureSource  (prototype, ...)
//!   settings.modules.platform ──▶ Actuator + Switch  (prototype, ...)
//!   settings.modules.display  ──▶ DisplaySink        (none, log, ...)
//! ```
//!
//! An unknown name, or a constructor that fails, falls back to the
//! built-in simulator (or the `none` display) and is reported as an
//! [`AppEvent::BackendFallback`] so the controller always starts.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::app::events::{AppEvent, NotifyEvent};
use crate::app::ports::{
    Actuator, DisplaySink, EventSink, NotificationSink, Outputs, PhysicalInput, TemperatureSource,
};
use crate::config::{ProbeProfiles, Settings, Units};
use crate::error::SensorError;
use crate::sensors::ProbeReadings;

use super::display::{LogDisplay, NullDisplay};
use super::prototype::{PrototypePlatform, PrototypeProbes};

/// Relay outputs plus the selector switch: one physical board.
pub trait Platform: Actuator + PhysicalInput {}

impl<T: Actuator + PhysicalInput> Platform for T {}

/// What a constructor gets to look at.
pub struct BackendContext<'a> {
    pub settings: &'a Settings,
}

pub type ProbeCtor = fn(&BackendContext<'_>) -> Result<Box<dyn TemperatureSource>, SensorError>;
pub type PlatformCtor = fn(&BackendContext<'_>) -> Result<Box<dyn Platform>, SensorError>;
pub type DisplayCtor = fn(&BackendContext<'_>) -> Result<Box<dyn DisplaySink>, SensorError>;

const FALLBACK_PROBES: &str = "prototype";
const FALLBACK_PLATFORM: &str = "prototype";
const FALLBACK_DISPLAY: &str = "none";

pub struct BackendRegistry {
    probes: BTreeMap<&'static str, ProbeCtor>,
    platforms: BTreeMap<&'static str, PlatformCtor>,
    displays: BTreeMap<&'static str, DisplayCtor>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl BackendRegistry {
    /// A registry that knows no names; everything falls back.
    pub fn empty() -> Self {
        Self {
            probes: BTreeMap::new(),
            platforms: BTreeMap::new(),
            displays: BTreeMap::new(),
        }
    }

    /// The backends that need no hardware.
    pub fn with_builtins() -> Self {
        let mut r = Self::empty();
        r.register_probes("prototype", prototype_probes);
        r.register_platform("prototype", prototype_platform);
        r.register_display("none", null_display);
        r.register_display("log", log_display);
        r
    }

    pub fn register_probes(&mut self, name: &'static str, ctor: ProbeCtor) {
        self.probes.insert(name, ctor);
    }

    pub fn register_platform(&mut self, name: &'static str, ctor: PlatformCtor) {
        self.platforms.insert(name, ctor);
    }

    pub fn register_display(&mut self, name: &'static str, ctor: DisplayCtor) {
        self.displays.insert(name, ctor);
    }

    /// Construct every backend named in `settings.modules`.
    pub fn build(&self, settings: &Settings) -> Resolved {
        let ctx = BackendContext { settings };
        let modules = &settings.modules;
        let mut fallbacks = Vec::new();

        let probes: Box<dyn TemperatureSource> =
            match resolve(&self.probes, "probes", &modules.probes, &ctx) {
                Some(probes) => probes,
                None => {
                    fallback(&mut fallbacks, "probes", &modules.probes, FALLBACK_PROBES);
                    Box::new(PrototypeProbes::new(settings.globals.units))
                }
            };
        let platform: Box<dyn Platform> =
            match resolve(&self.platforms, "platform", &modules.platform, &ctx) {
                Some(platform) => platform,
                None => {
                    fallback(&mut fallbacks, "platform", &modules.platform, FALLBACK_PLATFORM);
                    Box::new(PrototypePlatform::new())
                }
            };
        let display: Box<dyn DisplaySink> =
            match resolve(&self.displays, "display", &modules.display, &ctx) {
                Some(display) => display,
                None => {
                    fallback(&mut fallbacks, "display", &modules.display, FALLBACK_DISPLAY);
                    Box::new(NullDisplay)
                }
            };

        info!(
            "backends: probes={} platform={} display={}",
            modules.probes, modules.platform, modules.display
        );
        Resolved {
            hardware: Backends { probes, platform },
            display,
            fallbacks,
        }
    }
}

fn prototype_probes(ctx: &BackendContext<'_>) -> Result<Box<dyn TemperatureSource>, SensorError> {
    Ok(Box::new(PrototypeProbes::new(ctx.settings.globals.units)))
}

fn prototype_platform(_: &BackendContext<'_>) -> Result<Box<dyn Platform>, SensorError> {
    Ok(Box::new(PrototypePlatform::new()))
}

fn null_display(_: &BackendContext<'_>) -> Result<Box<dyn DisplaySink>, SensorError> {
    Ok(Box::new(NullDisplay))
}

fn log_display(_: &BackendContext<'_>) -> Result<Box<dyn DisplaySink>, SensorError> {
    Ok(Box::new(LogDisplay::new()))
}

fn resolve<T: ?Sized>(
    table: &BTreeMap<&'static str, fn(&BackendContext<'_>) -> Result<Box<T>, SensorError>>,
    port: &'static str,
    name: &str,
    ctx: &BackendContext<'_>,
) -> Option<Box<T>> {
    let Some(ctor) = table.get(name) else {
        warn!("{port} backend {name:?} is not registered");
        return None;
    };
    match ctor(ctx) {
        Ok(backend) => Some(backend),
        Err(e) => {
            warn!("{port} backend {name:?} failed to start: {e}");
            None
        }
    }
}

fn fallback(fallbacks: &mut Vec<AppEvent>, port: &'static str, requested: &str, to: &'static str) {
    fallbacks.push(AppEvent::BackendFallback {
        port,
        requested: requested.to_owned(),
        fallback: to,
    });
}

/// Output of [`BackendRegistry::build`].
pub struct Resolved {
    pub hardware: Backends,
    pub display: Box<dyn DisplaySink>,
    /// One [`AppEvent::BackendFallback`] per substituted backend.
    pub fallbacks: Vec<AppEvent>,
}

/// The constructed hardware backends behind the hardware ports.
pub struct Backends {
    pub probes: Box<dyn TemperatureSource>,
    pub platform: Box<dyn Platform>,
}

impl TemperatureSource for Backends {
    fn read_all(&mut self) -> ProbeReadings {
        self.probes.read_all()
    }

    fn set_profiles(&mut self, profiles: &ProbeProfiles) {
        self.probes.set_profiles(profiles);
    }

    fn update_units(&mut self, units: Units) {
        self.probes.update_units(units);
    }
}

impl Actuator for Backends {
    fn set(&mut self, outputs: Outputs) {
        self.platform.set(outputs);
    }

    fn status(&self) -> Outputs {
        self.platform.status()
    }
}

impl PhysicalInput for Backends {
    fn is_on(&mut self) -> bool {
        self.platform.is_on()
    }
}

/// The sink ports as one bundle of boxed adapters.
pub struct Sinks {
    pub display: Box<dyn DisplaySink>,
    pub notifier: Box<dyn NotificationSink>,
    pub events: Box<dyn EventSink>,
}

impl DisplaySink for Sinks {
    fn show_temperature(&mut self, value: f64) {
        self.display.show_temperature(value);
    }

    fn show_text(&mut self, message: &str) {
        self.display.show_text(message);
    }

    fn clear(&mut self) {
        self.display.clear();
    }
}

impl NotificationSink for Sinks {
    fn send(&mut self, event: NotifyEvent) {
        self.notifier.send(event);
    }
}

impl EventSink for Sinks {
    fn emit(&mut self, event: &AppEvent) {
        self.events.emit(event);
    }
}
