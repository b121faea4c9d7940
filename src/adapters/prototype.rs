//! Prototype (simulated) hardware.
//!
//! Runs the controller on a development machine with no probes or relays
//! attached.  [`PrototypeProbes`] produces a slow pseudo-random walk
//! clamped to plausible ranges; [`PrototypePlatform`] records the
//! commanded outputs and exposes a settable selector switch.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::app::ports::{Actuator, Outputs, PhysicalInput, TemperatureSource};
use crate::config::{ProbeProfile, ProbeProfiles, Units};
use crate::sensors::ProbeReadings;

/// Walk limits for one unit system.
#[derive(Debug, Clone, Copy)]
struct WalkLimits {
    grill: (f64, f64),
    probe: (f64, f64),
    step: f64,
}

impl WalkLimits {
    fn for_units(units: Units) -> Self {
        match units {
            Units::Fahrenheit => Self {
                grill: (50.0, 425.0),
                probe: (32.0, 220.0),
                step: 1.0,
            },
            Units::Celsius => Self {
                grill: (10.0, 220.0),
                probe: (0.0, 105.0),
                step: 0.5,
            },
        }
    }
}

fn start_readings(units: Units) -> ProbeReadings {
    match units {
        Units::Fahrenheit => ProbeReadings {
            primary: 55.0,
            probe1: 32.0,
            probe2: 42.0,
        },
        Units::Celsius => ProbeReadings {
            primary: 12.0,
            probe1: 0.0,
            probe2: 5.5,
        },
    }
}

/// Simulated probe backend (`"prototype"`).
pub struct PrototypeProbes {
    rng: StdRng,
    units: Units,
    readings: ProbeReadings,
    profiles: Option<ProbeProfiles>,
}

impl PrototypeProbes {
    pub fn new(units: Units) -> Self {
        Self::with_rng(units, StdRng::seed_from_u64(rand::random()))
    }

    /// Deterministic walk for tests.
    pub fn seeded(units: Units, seed: u64) -> Self {
        Self::with_rng(units, StdRng::seed_from_u64(seed))
    }

    fn with_rng(units: Units, rng: StdRng) -> Self {
        Self {
            rng,
            units,
            readings: start_readings(units),
            profiles: None,
        }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Thermistor resistance (ohms) that would produce the current primary
    /// reading under its assigned profile.  `None` until profiles are set.
    pub fn primary_resistance(&self) -> Option<f64> {
        let profiles = self.profiles.as_ref()?;
        thermistor_resistance(self.readings.primary, self.units, &profiles.primary)
    }

    /// One walk step: rise on 8-9, fall on 0, hold otherwise.
    fn walk(&mut self, value: f64, (min, max): (f64, f64), step: f64) -> f64 {
        match self.rng.random_range(0..10) {
            8..=9 if value < max => value + step,
            0 if value > min => value - step,
            _ => value,
        }
    }
}

impl TemperatureSource for PrototypeProbes {
    fn read_all(&mut self) -> ProbeReadings {
        let limits = WalkLimits::for_units(self.units);
        let r = self.readings;
        // The chamber moves a whole degree in either unit system.
        self.readings = ProbeReadings {
            primary: self.walk(r.primary, limits.grill, 1.0),
            probe1: self.walk(r.probe1, limits.probe, limits.step),
            probe2: self.walk(r.probe2, limits.probe, limits.step),
        };
        self.readings
    }

    fn set_profiles(&mut self, profiles: &ProbeProfiles) {
        debug!(
            "* Prototype probe profiles: {} / {} / {}",
            profiles.primary.name, profiles.probe1.name, profiles.probe2.name
        );
        self.profiles = Some(profiles.clone());
    }

    fn update_units(&mut self, units: Units) {
        self.units = units;
        self.readings = start_readings(units);
    }
}

/// Inverse Steinhart-Hart: the resistance a thermistor with `profile`
/// shows at `temperature`.
pub fn thermistor_resistance(temperature: f64, units: Units, profile: &ProbeProfile) -> Option<f64> {
    let kelvin = match units {
        Units::Fahrenheit => (temperature - 32.0) * 5.0 / 9.0 + 273.15,
        Units::Celsius => temperature + 273.15,
    };
    let (a, b, c) = (profile.a, profile.b, profile.c);
    if c == 0.0 || kelvin <= 0.0 {
        return None;
    }
    let x = (a - 1.0 / kelvin) / (2.0 * c);
    let y = ((b / (3.0 * c)).powi(3) + x * x).sqrt();
    let r = ((y - x).cbrt() - (y + x).cbrt()).exp();
    r.is_finite().then_some(r)
}

/// Simulated relay board and selector switch (`"prototype"`).
#[derive(Debug, Clone)]
pub struct PrototypePlatform {
    outputs: Outputs,
    switch_on: bool,
}

impl Default for PrototypePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PrototypePlatform {
    /// Outputs off, switch on.
    pub fn new() -> Self {
        Self {
            outputs: Outputs::ALL_OFF,
            switch_on: true,
        }
    }

    pub fn set_switch(&mut self, on: bool) {
        self.switch_on = on;
    }
}

impl Actuator for PrototypePlatform {
    fn set(&mut self, outputs: Outputs) {
        if outputs != self.outputs {
            debug!("* Prototype outputs: {:?}", outputs);
        }
        self.outputs = outputs;
    }

    fn status(&self) -> Outputs {
        self.outputs
    }
}

impl PhysicalInput for PrototypePlatform {
    fn is_on(&mut self) -> bool {
        self.switch_on
    }
}
