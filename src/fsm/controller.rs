//! The top-level controller.
//!
//! `Controller` owns every port and drives the mode state machine one
//! tick at a time.  While no session is running the tick acts as the
//! supervisor (switch, timer, `updated` dispatch); while a session runs
//! the tick executes one pass of that session's loop.  The handlers for
//! both live in [`states`](super::states).
//!
//! ```text
//!   tick() ──▶ session? ──yes──▶ step_session ──▶ exit? ──▶ finish
//!                 │
//!                 no
//!                 ▼
//!             supervise ──▶ updated? ──▶ dispatch(mode)
//! ```

use std::time::Duration;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, HardwarePorts, Outputs, SinkPorts, StoreError, StorePorts};
use crate::config::Settings;
use crate::control_state::ControlState;
use crate::error::Result;

use super::context::Session;
use super::{ExitReason, Mode};

/// Default control-loop period.
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// What one call to [`Controller::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No session running and nothing requested.
    Idle,
    /// A requested mode was dispatched.
    Dispatched(Mode),
    /// The running session completed one pass.
    Running(Mode),
    /// The running session ended.
    Ended { mode: Mode, reason: ExitReason },
}

pub struct Controller<H, S, K, C> {
    pub(super) hw: H,
    pub(super) store: S,
    pub(super) sinks: K,
    pub(super) clock: C,
    /// Last settings document that passed validation.
    pub(super) settings: Settings,
    pub(super) settings_rejected: bool,
    /// Working copy of the control document.
    pub(super) control: ControlState,
    /// The working copy holds changes the store has not accepted yet.
    pub(super) control_dirty: bool,
    pub(super) session: Option<Session>,
    /// Switch position at the previous supervisor poll.
    pub(super) switch_last: bool,
    tick_period: Duration,
}

impl<H, S, K, C> Controller<H, S, K, C>
where
    H: HardwarePorts,
    S: StorePorts,
    K: SinkPorts,
    C: Clock,
{
    /// Load both documents and bring the outputs to a known state: all off,
    /// appliance power following the switch.
    pub fn new(mut hw: H, mut store: S, mut sinks: K, clock: C) -> Result<Self> {
        let settings = match store.read_settings() {
            Ok(settings) => settings,
            Err(StoreError::NotFound) => Settings::default(),
            Err(e) => return Err(e.into()),
        };
        settings.validate()?;

        let control = match store.read_control() {
            Ok(control) => control,
            Err(StoreError::NotFound) => {
                let control = ControlState::with_defaults(&settings);
                store.write_control(&control)?;
                control
            }
            Err(e) => return Err(e.into()),
        };

        hw.update_units(settings.globals.units);
        match settings.resolve_probe_profiles() {
            Some(profiles) => hw.set_profiles(&profiles),
            None => warn!("probe types do not match any probe profile"),
        }

        let switch_on = hw.is_on();
        hw.set(Outputs {
            power: switch_on,
            ..Outputs::ALL_OFF
        });

        info!(
            "controller starting: mode={} units={} switch={}",
            control.mode,
            settings.globals.units.symbol(),
            if switch_on { "on" } else { "off" }
        );
        sinks.emit(&AppEvent::Started(control.mode));

        Ok(Self {
            hw,
            store,
            sinks,
            clock,
            settings,
            settings_rejected: false,
            control,
            control_dirty: false,
            session: None,
            switch_last: switch_on,
            tick_period: DEFAULT_TICK,
        })
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Advance by one tick.  Only an idle tick that cannot record a
    /// dispatch fails; the request is retried on the next tick.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let now = self.clock.monotonic();
        match self.session.take() {
            Some(session) => self.tick_session(session, now),
            None => self.supervise(now),
        }
    }

    /// Tick forever (or `max_ticks` times), sleeping one period between
    /// ticks.  Tick errors are logged and the loop carries on.
    pub fn run(&mut self, max_ticks: Option<u64>) {
        let mut ticks: u64 = 0;
        loop {
            if let Err(e) = self.tick() {
                warn!("tick failed: {e}");
            }
            ticks += 1;
            if max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            self.clock.sleep(self.tick_period);
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Mode of the running session, if any.
    pub fn running_mode(&self) -> Option<Mode> {
        self.session.as_ref().map(|s| s.mode)
    }

    /// The working copy of the control document.
    pub fn control(&self) -> &ControlState {
        &self.control
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Smoothed readings of the running session.
    pub fn averages(&self) -> Option<crate::sensors::ProbeReadings> {
        self.session.as_ref().map(|s| s.filters.latest())
    }

    /// Active cycle parameters of the running work-cycle session.
    pub fn cycle(&self) -> Option<crate::control::CycleParameters> {
        self.session
            .as_ref()
            .and_then(|s| s.cycle.as_ref())
            .map(|c| c.params())
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn sinks(&self) -> &K {
        &self.sinks
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    // -----------------------------------------------------------------------
    // Document helpers shared by the handlers
    // -----------------------------------------------------------------------

    /// Re-read the control document.  Unwritten local changes are flushed
    /// first.  When the store cannot be read (or the flush fails) the
    /// working copy stays in effect for this tick.
    pub(super) fn reload_control(&mut self) {
        if self.control_dirty {
            self.persist_or_warn();
            if self.control_dirty {
                return;
            }
        }
        match self.store.read_control() {
            Ok(control) => self.control = control,
            Err(e) => warn!("control read failed, keeping working copy: {e}"),
        }
    }

    pub(super) fn persist(&mut self) -> Result<()> {
        match self.store.write_control(&self.control) {
            Ok(()) => {
                self.control_dirty = false;
                Ok(())
            }
            Err(e) => {
                self.control_dirty = true;
                Err(e.into())
            }
        }
    }

    /// Write the working copy; a failure is logged and retried on the
    /// next reload.
    pub(super) fn persist_or_warn(&mut self) {
        if let Err(e) = self.persist() {
            warn!("control write failed: {e}");
        }
    }

    /// Re-read settings.  A document that fails to load or validate is
    /// reported once and the previous snapshot stays in effect.
    pub(super) fn reload_settings(&mut self) {
        let candidate = match self.store.read_settings() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("settings reload failed: {e}");
                return;
            }
        };
        match candidate.validate() {
            Ok(()) => {
                self.settings = candidate;
                self.settings_rejected = false;
            }
            Err(e) => {
                if !self.settings_rejected {
                    warn!("settings rejected, keeping previous: {e}");
                    self.sinks.emit(&AppEvent::SettingsRejected(e));
                    self.settings_rejected = true;
                }
            }
        }
    }
}
