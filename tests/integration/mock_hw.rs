//! Mock adapters for integration tests.
//!
//! `MockHardware` produces scripted probe ramps and records every output
//! command; `RecordingSinks` captures display frames, notifications and
//! events so tests can assert on the full history.  Stores and the
//! clock are the crate's own in-memory adapters.

#![allow(dead_code)]

use std::time::Duration;

use pelletctl::adapters::memory::MemoryStore;
use pelletctl::adapters::time::SimClock;
use pelletctl::app::events::{AppEvent, NotifyEvent};
use pelletctl::app::ports::{
    Actuator, Clock, DisplaySink, EventSink, NotificationSink, Outputs, PhysicalInput,
    TemperatureSource,
};
use pelletctl::config::{ProbeProfiles, Settings, Units};
use pelletctl::fsm::controller::{Controller, TickOutcome};
use pelletctl::sensors::ProbeReadings;

// ── Scripted probe ramp ───────────────────────────────────────

/// `start + step * n` for the n-th read.
#[derive(Debug, Clone, Copy)]
pub struct Ramp {
    pub start: f64,
    pub step: f64,
}

impl Ramp {
    pub const fn constant(value: f64) -> Self {
        Self {
            start: value,
            step: 0.0,
        }
    }

    pub const fn rising(start: f64, step: f64) -> Self {
        Self { start, step }
    }

    fn at(self, n: u32) -> f64 {
        self.start + self.step * f64::from(n)
    }
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub primary: Ramp,
    pub probe1: Ramp,
    pub probe2: Ramp,
    pub reads: u32,
    pub outputs: Outputs,
    /// Every distinct output state commanded, in order.
    pub commands: Vec<Outputs>,
    pub switch_on: bool,
    pub units: Option<Units>,
    pub profile_pushes: usize,
}

impl MockHardware {
    pub fn new(primary: Ramp) -> Self {
        Self {
            primary,
            probe1: Ramp::constant(70.0),
            probe2: Ramp::constant(70.0),
            reads: 0,
            outputs: Outputs::ALL_OFF,
            commands: Vec::new(),
            switch_on: true,
            units: None,
            profile_pushes: 0,
        }
    }

    /// Replace the primary script, restarting its ramp.
    pub fn set_primary(&mut self, primary: Ramp) {
        self.primary = primary;
        self.reads = 0;
    }
}

impl TemperatureSource for MockHardware {
    fn read_all(&mut self) -> ProbeReadings {
        let n = self.reads;
        self.reads += 1;
        ProbeReadings {
            primary: self.primary.at(n),
            probe1: self.probe1.at(n),
            probe2: self.probe2.at(n),
        }
    }

    fn set_profiles(&mut self, _profiles: &ProbeProfiles) {
        self.profile_pushes += 1;
    }

    fn update_units(&mut self, units: Units) {
        self.units = Some(units);
    }
}

impl Actuator for MockHardware {
    fn set(&mut self, outputs: Outputs) {
        if self.commands.last() != Some(&outputs) {
            self.commands.push(outputs);
        }
        self.outputs = outputs;
    }

    fn status(&self) -> Outputs {
        self.outputs
    }
}

impl PhysicalInput for MockHardware {
    fn is_on(&mut self) -> bool {
        self.switch_on
    }
}

// ── RecordingSinks ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSinks {
    pub texts: Vec<String>,
    pub temperatures: Vec<f64>,
    pub clears: usize,
    pub notifications: Vec<NotifyEvent>,
    pub events: Vec<AppEvent>,
}

impl RecordingSinks {
    pub fn saw(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl DisplaySink for RecordingSinks {
    fn show_temperature(&mut self, value: f64) {
        self.temperatures.push(value);
    }

    fn show_text(&mut self, message: &str) {
        self.texts.push(message.to_owned());
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

impl NotificationSink for RecordingSinks {
    fn send(&mut self, event: NotifyEvent) {
        self.notifications.push(event);
    }
}

impl EventSink for RecordingSinks {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Rig = Controller<MockHardware, MemoryStore, RecordingSinks, SimClock>;

pub const TICK: f64 = 0.5;

pub fn rig(settings: Settings, primary: Ramp) -> Rig {
    let _ = env_logger::builder().is_test(true).try_init();
    Controller::new(
        MockHardware::new(primary),
        MemoryStore::new(settings),
        RecordingSinks::default(),
        SimClock::new(),
    )
    .expect("controller starts")
}

/// Tick once, then advance the clock by one period.
pub fn step(rig: &mut Rig) -> TickOutcome {
    let outcome = rig.tick().expect("tick");
    rig.clock_mut().sleep(Duration::from_secs_f64(TICK));
    outcome
}

/// Tick until `pred` holds or `seconds` of simulated time have passed.
/// Returns the outcome that satisfied `pred`.
pub fn step_until(
    rig: &mut Rig,
    seconds: f64,
    mut pred: impl FnMut(&Rig, &TickOutcome) -> bool,
) -> Option<TickOutcome> {
    let deadline = rig.clock().monotonic() + seconds;
    while rig.clock().monotonic() <= deadline {
        let outcome = step(rig);
        if pred(rig, &outcome) {
            return Some(outcome);
        }
    }
    None
}

/// Tick for `seconds` of simulated time.
pub fn run_for(rig: &mut Rig, seconds: f64) {
    let ticks = (seconds / TICK).round() as usize;
    for _ in 0..ticks {
        step(rig);
    }
}
