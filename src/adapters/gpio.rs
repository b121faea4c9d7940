//! GPIO relay board and selector switch over `embedded-hal` 1.0.
//!
//! Any HAL that provides `OutputPin`/`InputPin` (linux-embedded-hal,
//! rppal, esp-idf-hal, ...) can drive the appliance through these
//! adapters.  Relay polarity comes from `globals.trigger_level`; the
//! logical state in [`Outputs`] is always "`true` = energised".
//!
//! These are library-only adapters: the host binary has no pins to hand
//! them, so [`BackendRegistry::with_builtins`] does not list them.  An
//! integrator builds them from their HAL's pins and installs them with
//! [`BackendRegistry::register_platform`] or passes them straight to
//! [`Controller::new`].
//!
//! [`BackendRegistry::with_builtins`]: super::registry::BackendRegistry::with_builtins
//! [`BackendRegistry::register_platform`]: super::registry::BackendRegistry::register_platform
//! [`Controller::new`]: crate::fsm::controller::Controller::new

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use log::warn;

use crate::app::ports::{Actuator, Outputs, PhysicalInput};
use crate::config::TriggerLevel;

/// The four relay channels.
pub struct RelayPins<P> {
    pub auger: P,
    pub igniter: P,
    pub fan: P,
    pub power: P,
}

pub struct RelayBoard<P: OutputPin> {
    pins: RelayPins<P>,
    trigger: TriggerLevel,
    outputs: Outputs,
}

impl<P: OutputPin> RelayBoard<P> {
    /// Take the pins and drive every relay to de-energised.
    pub fn new(pins: RelayPins<P>, trigger: TriggerLevel) -> Self {
        let mut board = Self {
            pins,
            trigger,
            outputs: Outputs::ALL_OFF,
        };
        board.write_all(Outputs::ALL_OFF);
        board
    }

    pub fn release(self) -> RelayPins<P> {
        self.pins
    }

    fn level(&self, on: bool) -> PinState {
        match (self.trigger, on) {
            (TriggerLevel::ActiveHigh, true) | (TriggerLevel::ActiveLow, false) => PinState::High,
            _ => PinState::Low,
        }
    }

    fn write_all(&mut self, outputs: Outputs) {
        let levels = [
            ("auger", self.level(outputs.auger)),
            ("igniter", self.level(outputs.igniter)),
            ("fan", self.level(outputs.fan)),
            ("power", self.level(outputs.power)),
        ];
        let pins = [
            &mut self.pins.auger,
            &mut self.pins.igniter,
            &mut self.pins.fan,
            &mut self.pins.power,
        ];
        for ((name, level), pin) in levels.into_iter().zip(pins) {
            if let Err(e) = pin.set_state(level) {
                warn!("relay {name}: pin write failed: {e:?}");
            }
        }
        self.outputs = outputs;
    }
}

impl<P: OutputPin> Actuator for RelayBoard<P> {
    fn set(&mut self, outputs: Outputs) {
        self.write_all(outputs);
    }

    fn status(&self) -> Outputs {
        self.outputs
    }
}

/// Selector switch wired to an input pin.
pub struct SwitchInput<I: InputPin> {
    pin: I,
    active_low: bool,
    last: bool,
}

impl<I: InputPin> SwitchInput<I> {
    pub fn new(pin: I, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            last: true,
        }
    }
}

impl<I: InputPin> PhysicalInput for SwitchInput<I> {
    /// A failed read repeats the previous position.
    fn is_on(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => {
                self.last = high != self.active_low;
            }
            Err(e) => warn!("selector switch read failed: {e:?}"),
        }
        self.last
    }
}
