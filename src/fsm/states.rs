//! Mode handlers.
//!
//! ```text
//!  Stop ──[Startup]──▶ STARTUP ──[startup_timer]──▶ SMOKE ◀──────┐
//!                         │                          │  ▲        │
//!                         │                   [Hold] ▼  │[Smoke] │
//!                         │                         HOLD         │
//!                         │                          │           │
//!                         │            [flame-out, retries left] │
//!                         │                          ▼           │
//!                         │                      REIGNITE ───────┘
//!                         │                   (resumes last state)
//!                         ▼
//!  any running ──[Shutdown]──▶ SHUTDOWN ──[shutdown_timer]──▶ STOP
//!
//!  any running ──[over-temp | flame-out, no retries]──▶ ERROR
//!  any running ──[switch off]──▶ STOP
//! ```
//!
//! Each handler is an inherent method on [`Controller`] so it can reach
//! the ports directly.  The running [`Session`] is taken out of the
//! controller for the duration of a tick and handed to the handlers by
//! reference.

use log::{debug, error, info, warn};

use crate::app::events::{AppEvent, NotifyEvent};
use crate::app::ports::{Clock, HardwarePorts, HistoryEntry, Outputs, SinkPorts, StorePorts};
use crate::control::smoke_plus::FanSample;
use crate::control_state::{ControlState, Status};
use crate::error::{Result, SafetyFault};
use crate::notify::{self, NotifySample};
use crate::safety::{self, FlameOutResponse, Trip};
use crate::sensors::ProbeReadings;

use super::context::Session;
use super::controller::{Controller, TickOutcome};
use super::{Completion, ExitReason, Mode, ModeKind};

impl<H, S, K, C> Controller<H, S, K, C>
where
    H: HardwarePorts,
    S: StorePorts,
    K: SinkPorts,
    C: Clock,
{
    // =======================================================================
    //  Supervisor (no session running)
    // =======================================================================

    pub(super) fn supervise(&mut self, now: f64) -> Result<TickOutcome> {
        self.reload_control();

        let switch_on = self.hw.is_on();
        if switch_on != self.switch_last {
            self.switch_last = switch_on;
            if !switch_on {
                info!("Switch set to off, going to stop mode.");
                self.sinks.emit(&AppEvent::SwitchOff);
                self.control.request_mode(Mode::Stop);
                self.persist_or_warn();
            }
        }

        let wall = self.clock.wall();
        if let Some(event) = notify::check_timer(wall, &mut self.control, &self.settings) {
            self.persist_or_warn();
            self.announce_target(event);
        }

        if !self.control.updated {
            return Ok(TickOutcome::Idle);
        }
        debug!("* Updated Flag Captured.");
        self.control.updated = false;
        self.reload_settings();

        if self.control.units_change {
            info!("Changing base units to {}", self.settings.globals.units.symbol());
            self.hw.update_units(self.settings.globals.units);
            self.control.units_change = false;
            self.control.mode = Mode::Stop;
        }

        if self.control.status != Status::Monitor && self.control.mode != Mode::Error {
            self.control.status = Status::Active;
        }
        let mode = self.control.mode;
        if let Err(e) = self.persist() {
            // Stop and Error are entered even when they cannot be recorded.
            if mode.kind() != ModeKind::Terminal {
                self.control.updated = true;
                return Err(e);
            }
            warn!("control write failed, entering {mode} anyway: {e}");
        }

        self.dispatch(mode, now);
        Ok(TickOutcome::Dispatched(mode))
    }

    /// Single dispatch point for a requested mode.
    fn dispatch(&mut self, mode: Mode, now: f64) {
        match mode.kind() {
            ModeKind::Terminal => self.enter_terminal(mode),
            ModeKind::Instant => self.run_recipe(),
            ModeKind::WorkCycle | ModeKind::Passive => self.start_session(mode, now),
        }
    }

    // =======================================================================
    //  STOP / ERROR
    // =======================================================================

    fn enter_terminal(&mut self, mode: Mode) {
        let power = mode == Mode::Error && self.control.status == Status::Monitor;
        self.hw.set(Outputs {
            power,
            ..Outputs::ALL_OFF
        });

        let defaults = ControlState::with_defaults(&self.settings);
        if mode == Mode::Stop {
            self.sinks.clear();
            self.control = defaults;
            info!("Stop Mode Started.");
        } else {
            // The display keeps showing ERROR.
            self.control = ControlState {
                mode: Mode::Error,
                ..defaults
            };
            error!("ERROR: An error has occurred, Stop Mode enabled.");
        }
        self.persist_or_warn();
        self.sinks.emit(&AppEvent::ModeStarted(mode));
    }

    // =======================================================================
    //  RECIPE
    // =======================================================================

    fn run_recipe(&mut self) {
        info!("Recipe Mode started.");
        let name = self.control.recipe.clone();
        match self.store.find_recipe(&name) {
            Some(recipe) => {
                debug!("* Found recipe: {} ({} steps)", recipe.name, recipe.steps.len());
                self.sinks.emit(&AppEvent::RecipeFound(name));
            }
            None => {
                warn!("Recipe not found: {name:?}");
                self.sinks.emit(&AppEvent::RecipeNotFound(name));
            }
        }
        info!("Recipe mode ended.");
    }

    // =======================================================================
    //  Session entry
    // =======================================================================

    /// Store failures from here on are logged and never abandon a session
    /// whose outputs are already energised.
    fn start_session(&mut self, mode: Mode, now: f64) {
        self.reload_settings();
        let switch_on = self.hw.is_on();
        self.switch_last = switch_on;
        let mut session = Session::new(
            mode,
            &self.settings,
            self.control.setpoints.primary,
            switch_on,
            now,
        );
        info!("{mode} Mode started.");
        self.sinks.emit(&AppEvent::ModeStarted(mode));

        let descriptor = mode.descriptor();
        if descriptor.kind == ModeKind::WorkCycle {
            self.hw.set(Outputs {
                auger: descriptor.feeds,
                igniter: descriptor.ignites,
                fan: true,
                power: true,
            });
            debug!(
                "* Fan ON, Igniter {}, Auger {}",
                on_off(descriptor.ignites),
                on_off(descriptor.feeds)
            );
        } else {
            self.hw.set(Outputs::ALL_OFF);
        }

        if let Some(profiles) = self.settings.resolve_probe_profiles() {
            self.hw.set_profiles(&profiles);
        }
        let raw = self.hw.read_all();
        session.filters.push(&raw);

        let mut early_exit = None;
        match mode {
            Mode::Startup | Mode::Reignite => {
                let threshold = safety::startup_threshold(raw.primary, &self.settings.safety);
                self.control.safety.startup_temp = threshold;
                self.control.safety.after_start_temp = raw.primary;
                self.persist_or_warn();
                debug!("* Startup watchdog threshold {threshold}");
            }
            Mode::Smoke | Mode::Hold => {
                if let Some(trip) = safety::check_entry(mode, &self.control.safety) {
                    self.trip(mode, trip);
                    early_exit = Some(ExitReason::Safety(trip.fault));
                }
            }
            Mode::Monitor => {
                self.control.status = Status::Monitor;
                self.persist_or_warn();
            }
            _ => {}
        }

        match early_exit {
            Some(reason) => {
                self.finish(session, reason, now);
            }
            None => self.session = Some(session),
        }
    }

    // =======================================================================
    //  Session tick
    // =======================================================================

    pub(super) fn tick_session(&mut self, mut session: Session, now: f64) -> Result<TickOutcome> {
        let mode = session.mode;
        match self.step_session(&mut session, now) {
            None => {
                self.session = Some(session);
                Ok(TickOutcome::Running(mode))
            }
            Some(reason) => Ok(self.finish(session, reason, now)),
        }
    }

    /// One pass of the session loop.  Returns the exit reason when the
    /// session must end.  A failing control store never skips a step: the
    /// pass runs on the working copy.
    fn step_session(&mut self, s: &mut Session, now: f64) -> Option<ExitReason> {
        // 1. external request
        self.reload_control();
        if self.control.updated {
            return Some(ExitReason::Requested);
        }

        // 2. physical switch
        let switch_on = self.hw.is_on();
        if switch_on != s.switch_last {
            s.switch_last = switch_on;
            if !switch_on {
                info!("Switch set to off, going to stop mode.");
                self.sinks.emit(&AppEvent::SwitchOff);
                self.control.request_mode(Mode::Stop);
                self.control.status = Status::Active;
                self.persist_or_warn();
                return Some(ExitReason::SwitchOff);
            }
        }

        // 3. outputs
        if let Some(cycle) = s.cycle.as_mut() {
            cycle.drive(&mut self.hw, now, s.filters.latest().primary);
        } else if s.mode == Mode::Manual {
            self.apply_manual();
        }

        // 4. hot reload
        self.reload_settings();
        if self.control.probe_profile_update {
            match self.settings.resolve_probe_profiles() {
                Some(profiles) => self.hw.set_profiles(&profiles),
                None => warn!("probe types do not match any probe profile"),
            }
            self.control.probe_profile_update = false;
            self.persist_or_warn();
        }

        // 5. probes
        let raw = self.hw.read_all();
        let avg = s.filters.push(&raw);

        // 6. Smoke Plus
        if s.mode.is_work_cycle() {
            let sample = FanSample {
                mode: s.mode,
                average: avg.primary,
                setpoint: self.control.setpoints.primary,
                enabled: self.control.s_plus,
                fan_on: self.hw.status().fan,
                now,
            };
            if let Some(fan) = s.smoke_plus.step(sample, &self.settings.smoke_plus) {
                self.hw.set_fan(fan);
                debug!("* Smoke Plus: Fan {}", on_off(fan));
            }
        }

        // 7. display
        if s.display_due(now) {
            self.sinks.show_temperature(avg.primary);
        }

        // 8. history, safety, notifications
        if s.history_due(now) {
            self.write_history(s.mode, &avg);
            if s.filters.is_warm() {
                if let Some(reason) = self.periodic_checks(s.mode, &avg) {
                    return Some(reason);
                }
            }
        }

        // 9. time limit
        if s.expired(now) {
            return Some(ExitReason::Completed);
        }
        None
    }

    fn periodic_checks(&mut self, mode: Mode, avg: &ProbeReadings) -> Option<ExitReason> {
        if matches!(mode, Mode::Startup | Mode::Reignite) {
            self.control.safety.after_start_temp = avg.primary;
            self.persist_or_warn();
        }

        if let Some(trip) =
            safety::check_running(mode, avg.primary, &self.control.safety, &self.settings.safety)
        {
            self.trip(mode, trip);
            return Some(ExitReason::Safety(trip.fault));
        }

        let sample = NotifySample {
            readings: *avg,
            now: self.clock.wall(),
        };
        let fired = notify::check_notify(&sample, &mut self.control, &self.settings);
        if fired.changed() {
            self.persist_or_warn();
            for event in fired.events() {
                self.announce_target(*event);
            }
        }
        None
    }

    fn apply_manual(&mut self) {
        let manual = self.control.manual;
        if !manual.change {
            return;
        }
        self.hw.set(Outputs {
            auger: manual.auger,
            igniter: manual.igniter,
            fan: manual.fan,
            power: manual.power,
        });
        self.control.manual.change = false;
        self.persist_or_warn();
        debug!("* Manual outputs applied: {:?}", self.hw.status());
    }

    fn write_history(&mut self, mode: Mode, avg: &ProbeReadings) {
        let entry = HistoryEntry {
            timestamp: self.clock.wall(),
            mode,
            primary: avg.primary,
            primary_setpoint: self.control.setpoints.primary,
            probe1: avg.probe1,
            probe1_setpoint: self.control.setpoints.probe1,
            probe2: avg.probe2,
            probe2_setpoint: self.control.setpoints.probe2,
            outputs: self.hw.status(),
        };
        if let Err(e) = self.store.write_history(&entry) {
            warn!("history write failed: {e}");
        }
    }

    // =======================================================================
    //  Safety trips
    // =======================================================================

    /// Record the trip and request the follow-up mode.  The caller ends
    /// the session whether or not the request could be stored.
    fn trip(&mut self, mode: Mode, trip: Trip) {
        self.sinks.emit(&AppEvent::SafetyTrip {
            fault: trip.fault,
            temperature: trip.temperature,
            limit: trip.limit,
        });
        let units = self.settings.globals.units.symbol();

        match trip.fault {
            SafetyFault::OverTemperature => {
                error!(
                    "ERROR: Grill exceeded maximum temperature limit of {}{}! Shutting down.",
                    trip.limit, units
                );
                self.raise_error(NotifyEvent::OverTemperature, mode == Mode::Monitor);
            }
            SafetyFault::FlameOut => match safety::flame_out_response(&self.control.safety) {
                FlameOutResponse::Error => {
                    error!(
                        "ERROR: Grill temperature dropped below minimum startup temperature of {}{}! \
                         Shutting down to prevent firepot overload.",
                        trip.limit, units
                    );
                    self.raise_error(NotifyEvent::FlameOut, false);
                }
                FlameOutResponse::Reignite { retries_left } => {
                    warn!(
                        "ERROR: Grill temperature dropped below minimum startup temperature of {}{}. \
                         Starting a re-ignite attempt.",
                        trip.limit, units
                    );
                    self.control.safety.reignite_retries = retries_left;
                    self.control.safety.reignite_last_state = mode;
                    self.sinks.show_text("Re-Ignite");
                    self.control.request_mode(Mode::Reignite);
                    self.persist_or_warn();
                    self.sinks.emit(&AppEvent::ReigniteAttempt { retries_left });
                }
            },
        }
    }

    fn raise_error(&mut self, event: NotifyEvent, keep_monitor: bool) {
        self.sinks.show_text("ERROR");
        self.control.request_mode(Mode::Error);
        if keep_monitor {
            self.control.status = Status::Monitor;
        }
        self.persist_or_warn();
        info!("notification: {}", event.name());
        self.sinks.send(event);
    }

    fn announce_target(&mut self, event: NotifyEvent) {
        info!("notification: {}", event.name());
        self.sinks.send(event);
        self.sinks.emit(&AppEvent::TargetReached(event));
    }

    // =======================================================================
    //  Session exit
    // =======================================================================

    fn finish(&mut self, session: Session, reason: ExitReason, now: f64) -> TickOutcome {
        let mode = session.mode;
        self.switch_last = session.switch_last;
        self.exit_actions(&session);
        info!("{mode} mode ended ({reason:?}).");
        self.sinks.emit(&AppEvent::ModeEnded { mode, reason });

        if reason == ExitReason::Completed {
            if let Some(completion) = mode.descriptor().on_complete {
                self.complete(mode, completion, now);
            }
        }
        TickOutcome::Ended { mode, reason }
    }

    fn exit_actions(&mut self, session: &Session) {
        match session.mode.kind() {
            ModeKind::WorkCycle => {
                self.hw.set_auger(false);
                self.hw.set_igniter(false);
                debug!("* Auger OFF, Igniter OFF");
                if session.mode == Mode::Shutdown {
                    self.hw.set_fan(false);
                    self.hw.set_power(false);
                    debug!("* Fan OFF, Power OFF");
                }
                if matches!(session.mode, Mode::Startup | Mode::Reignite) {
                    if session.filters.is_warm() {
                        self.control.safety.after_start_temp = session.filters.latest().primary;
                    }
                    self.persist_or_warn();
                }
            }
            ModeKind::Passive if session.mode == Mode::Manual => {
                self.hw.set(Outputs::ALL_OFF);
            }
            _ => {}
        }
    }

    fn complete(&mut self, ended: Mode, completion: Completion, now: f64) {
        self.reload_control();
        match completion {
            Completion::Continue(next) => {
                if self.control.mode == ended {
                    self.control.mode = next;
                    self.persist_or_warn();
                    self.start_session(next, now);
                }
            }
            Completion::Request(next) => {
                if self.control.mode == ended {
                    self.control.request_mode(next);
                    self.persist_or_warn();
                }
            }
            Completion::ResumeLastState => {
                let next = match self.control.safety.reignite_last_state {
                    Mode::Hold => Mode::Hold,
                    _ => Mode::Smoke,
                };
                self.control.mode = next;
                self.persist_or_warn();
                self.start_session(next, now);
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}
