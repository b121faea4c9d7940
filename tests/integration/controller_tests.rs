//! End-to-end tests for the Controller → FSM → actuator pipeline.
//!
//! Every test drives the real controller with scripted probe ramps on a
//! simulated clock (0.5 s per tick) and asserts on the outputs, the
//! stored control document and the emitted events.

use std::time::Duration;

use pelletctl::adapters::json_store::JsonFileStore;
use pelletctl::adapters::memory::MemoryStore;
use pelletctl::adapters::time::SimClock;
use pelletctl::app::commands::{ControlCommand, Target};
use pelletctl::app::events::{AppEvent, NotifyEvent};
use pelletctl::app::ports::{
    Clock, ControlStore, HistoryEntry, HistorySink, Outputs, Recipe, RecipeBook, SettingsStore,
    StoreError,
};
use pelletctl::config::{Settings, Units};
use pelletctl::control_state::{ControlState, Status, TargetActions};
use pelletctl::error::{Error, SafetyFault};
use pelletctl::fsm::controller::{Controller, TickOutcome};
use pelletctl::fsm::{ExitReason, Mode};

use crate::mock_hw::{
    MockHardware, Ramp, RecordingSinks, Rig, TICK, rig, run_for, step, step_until,
};

fn request(rig: &mut Rig, command: ControlCommand) {
    command.apply(rig.store_mut().control_mut());
}

fn stored_mode(rig: &Rig) -> Mode {
    rig.store().control().map(|c| c.mode).unwrap_or_default()
}

fn outputs(rig: &Rig) -> Outputs {
    rig.hardware().outputs
}

fn ended(outcome: &TickOutcome) -> bool {
    matches!(outcome, TickOutcome::Ended { .. })
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn new_controller_writes_default_control_and_follows_switch() {
    let rig = rig(Settings::default(), Ramp::constant(70.0));
    let control = rig.store().control().expect("defaults written");
    assert_eq!(control.mode, Mode::Stop);
    assert!(!control.updated);
    assert_eq!(
        outputs(&rig),
        Outputs {
            power: true,
            ..Outputs::ALL_OFF
        }
    );
    assert_eq!(rig.hardware().units, Some(Units::Fahrenheit));
    assert_eq!(rig.hardware().profile_pushes, 1);
    assert!(rig.sinks().saw(&AppEvent::Started(Mode::Stop)));
}

#[test]
fn new_controller_rejects_invalid_settings() {
    let mut settings = Settings::default();
    settings.cycle_data.pb = 0.0;
    let result = Controller::new(
        MockHardware::new(Ramp::constant(70.0)),
        MemoryStore::new(settings),
        RecordingSinks::default(),
        SimClock::new(),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn idle_controller_stays_idle() {
    let mut rig = rig(Settings::default(), Ramp::constant(70.0));
    for _ in 0..10 {
        assert_eq!(step(&mut rig), TickOutcome::Idle);
    }
    assert_eq!(rig.running_mode(), None);
}

// ── Safety cutoff ─────────────────────────────────────────────

#[test]
fn over_temperature_trips_to_error_within_one_history_interval() {
    let mut settings = Settings::default();
    settings.safety.max_temp = 450.0;
    let mut rig = rig(settings, Ramp::rising(440.0, 1.0));

    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Smoke));

    let mut crossed_at = None;
    let outcome = step_until(&mut rig, 60.0, |r, o| {
        if crossed_at.is_none() && r.averages().is_some_and(|a| a.primary > 450.0) {
            crossed_at = Some(r.clock().monotonic());
        }
        ended(o)
    })
    .expect("session ends");

    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Smoke,
            reason: ExitReason::Safety(SafetyFault::OverTemperature),
        }
    );
    let crossed_at = crossed_at.expect("average crossed the limit");
    assert!(rig.clock().monotonic() - crossed_at <= 3.0);

    let o = outputs(&rig);
    assert!(!o.auger, "feed must be off after the trip");
    assert!(!o.igniter, "igniter must be off after the trip");
    assert_eq!(stored_mode(&rig), Mode::Error);

    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Error));
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);
    assert_eq!(rig.control().mode, Mode::Error);
    assert_eq!(rig.sinks().notifications, vec![NotifyEvent::OverTemperature]);
    assert!(rig.sinks().texts.iter().any(|t| t == "ERROR"));
}

#[test]
fn over_temperature_in_monitor_keeps_power_on() {
    let mut rig = rig(Settings::default(), Ramp::constant(600.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Monitor));
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Monitor));
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);
    assert_eq!(rig.control().status, Status::Monitor);

    let outcome = step_until(&mut rig, 30.0, |_, o| ended(o)).expect("trip");
    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Monitor,
            reason: ExitReason::Safety(SafetyFault::OverTemperature),
        }
    );

    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Error));
    assert_eq!(
        outputs(&rig),
        Outputs {
            power: true,
            ..Outputs::ALL_OFF
        }
    );
}

#[test]
fn cold_filter_never_trips() {
    // 1 entry sample + 8 ticks: still short of a full window.
    let mut rig = rig(Settings::default(), Ramp::constant(900.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    step(&mut rig);
    for _ in 0..8 {
        assert_eq!(step(&mut rig), TickOutcome::Running(Mode::Smoke));
    }
    assert!(rig.sinks().notifications.is_empty());
}

// ── Startup watchdog and flame-out ────────────────────────────

#[test]
fn startup_watchdog_clamps_then_flame_out_reignites_then_errors() {
    let mut settings = Settings::default();
    settings.safety.min_startup_temp = 150.0;
    settings.safety.max_startup_temp = 200.0;
    settings.globals.startup_timer = 30;
    let mut rig = rig(settings, Ramp::constant(100.0));

    request(&mut rig, ControlCommand::SetMode(Mode::Startup));
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Startup));
    assert_eq!(rig.control().safety.startup_temp, 150.0);
    let o = outputs(&rig);
    assert!(o.igniter && o.fan && o.power && o.auger);

    // Startup completes, Smoke's entry check sees a fire that never caught.
    let outcome = step_until(&mut rig, 40.0, |_, o| ended(o)).expect("startup ends");
    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Startup,
            reason: ExitReason::Completed,
        }
    );
    assert!(rig.sinks().saw(&AppEvent::ReigniteAttempt { retries_left: 0 }));
    assert!(rig.sinks().texts.iter().any(|t| t == "Re-Ignite"));
    assert_eq!(stored_mode(&rig), Mode::Reignite);

    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Reignite));
    assert_eq!(rig.control().safety.reignite_retries, 0);
    assert_eq!(rig.control().safety.reignite_last_state, Mode::Smoke);
    assert!(outputs(&rig).igniter);

    // No retries left: the second flame-out is an error.
    step_until(&mut rig, 40.0, |_, o| ended(o)).expect("reignite ends");
    assert_eq!(stored_mode(&rig), Mode::Error);
    assert_eq!(rig.sinks().notifications, vec![NotifyEvent::FlameOut]);

    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Error));
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);
}

#[test]
fn flame_out_in_hold_reignites_and_resumes_hold() {
    let mut settings = Settings::default();
    settings.globals.startup_timer = 12;
    let mut rig = rig(settings, Ramp::constant(140.0));
    {
        let control = rig.store_mut().control_mut();
        control.safety.startup_temp = 150.0;
        control.safety.after_start_temp = 160.0;
        control.safety.reignite_retries = 1;
    }
    request(&mut rig, ControlCommand::Hold { setpoint: 225.0 });
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Hold));

    let outcome = step_until(&mut rig, 20.0, |_, o| ended(o)).expect("flame-out");
    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Hold,
            reason: ExitReason::Safety(SafetyFault::FlameOut),
        }
    );
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Reignite));
    assert_eq!(rig.control().safety.reignite_last_state, Mode::Hold);

    let outcome = step_until(&mut rig, 20.0, |_, o| ended(o)).expect("reignite ends");
    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Reignite,
            reason: ExitReason::Completed,
        }
    );
    assert_eq!(rig.running_mode(), Some(Mode::Hold));
    assert_eq!(rig.control().setpoints.primary, 225.0);
    assert!(!outputs(&rig).igniter);
    assert!(rig.sinks().notifications.is_empty());
}

#[test]
fn flame_out_in_hold_without_retries_errors() {
    let mut settings = Settings::default();
    settings.safety.reignite_retries = 0;
    let mut rig = rig(settings, Ramp::constant(140.0));
    {
        let control = rig.store_mut().control_mut();
        control.safety.startup_temp = 150.0;
        control.safety.after_start_temp = 160.0;
        control.safety.reignite_retries = 0;
    }
    request(&mut rig, ControlCommand::Hold { setpoint: 225.0 });
    step(&mut rig);

    let outcome = step_until(&mut rig, 20.0, |_, o| ended(o)).expect("flame-out");
    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Hold,
            reason: ExitReason::Safety(SafetyFault::FlameOut),
        }
    );
    assert!(!outputs(&rig).auger);
    assert_eq!(stored_mode(&rig), Mode::Error);
    assert_eq!(rig.sinks().notifications, vec![NotifyEvent::FlameOut]);
}

// ── Timed work cycles ─────────────────────────────────────────

#[test]
fn startup_advances_to_smoke_after_startup_timer() {
    let mut rig = rig(Settings::default(), Ramp::rising(70.0, 0.5));
    request(&mut rig, ControlCommand::SetMode(Mode::Startup));
    step(&mut rig);

    let outcome = step_until(&mut rig, 300.0, |_, o| ended(o)).expect("startup ends");
    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Startup,
            reason: ExitReason::Completed,
        }
    );
    let now = rig.clock().monotonic();
    assert!((240.0..=241.0 + TICK).contains(&now), "ended at {now}");
    assert_eq!(rig.running_mode(), Some(Mode::Smoke));
    assert_eq!(rig.control().mode, Mode::Smoke);
    assert!(!outputs(&rig).igniter);
    assert!(rig.control().safety.after_start_temp > rig.control().safety.startup_temp);
}

#[test]
fn shutdown_completes_with_all_outputs_off_then_stops() {
    let mut rig = rig(Settings::default(), Ramp::constant(300.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Shutdown));
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Shutdown));
    assert_eq!(
        outputs(&rig),
        Outputs {
            fan: true,
            power: true,
            ..Outputs::ALL_OFF
        }
    );

    let outcome = step_until(&mut rig, 90.0, |_, o| ended(o)).expect("shutdown ends");
    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Shutdown,
            reason: ExitReason::Completed,
        }
    );
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);
    let stored = rig.store().control().expect("control");
    assert_eq!(stored.mode, Mode::Stop);
    assert!(stored.updated);

    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Stop));
    assert_eq!(rig.control().status, Status::Inactive);
    assert!(!rig.control().updated);
    assert!(rig.sinks().clears >= 1);
}

#[test]
fn interrupted_smoke_leaves_fan_and_power_unchanged() {
    let mut rig = rig(Settings::default(), Ramp::constant(200.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    step(&mut rig);
    run_for(&mut rig, 5.0);
    assert!(outputs(&rig).auger, "first feed phase still running");

    request(&mut rig, ControlCommand::SetMode(Mode::Stop));
    assert_eq!(
        step(&mut rig),
        TickOutcome::Ended {
            mode: Mode::Smoke,
            reason: ExitReason::Requested,
        }
    );
    assert_eq!(
        outputs(&rig),
        Outputs {
            auger: false,
            igniter: false,
            fan: true,
            power: true,
        }
    );

    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Stop));
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);
}

#[test]
fn smoke_feeds_on_its_cycle() {
    // on 15 s, off 45 + 2 * 10 s.
    let mut rig = rig(Settings::default(), Ramp::constant(200.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    step(&mut rig);
    let cycle = rig.cycle().expect("work cycle");
    assert_eq!(cycle.on_time, 15.0);
    assert_eq!(cycle.off_time, 65.0);

    run_for(&mut rig, 15.0);
    assert!(outputs(&rig).auger);
    run_for(&mut rig, 1.0);
    assert!(!outputs(&rig).auger);
    run_for(&mut rig, 65.0);
    assert!(outputs(&rig).auger);
}

#[test]
fn hold_raises_duty_when_below_setpoint() {
    let mut rig = rig(Settings::default(), Ramp::constant(150.0));
    request(&mut rig, ControlCommand::Hold { setpoint: 225.0 });
    step(&mut rig);
    let initial = rig.cycle().expect("work cycle");
    assert!((initial.ratio - 0.15).abs() < 1e-9);
    assert!((initial.cycle_time - 20.0).abs() < 1e-9);

    // First feed phase (3 s) and pause (17 s), then the next cycle starts
    // with a PID-computed ratio.
    run_for(&mut rig, 22.0);
    let next = rig.cycle().expect("work cycle");
    assert!(next.ratio > initial.ratio, "{next:?}");
    assert!(next.ratio <= 1.0);
    assert!((next.on_time + next.off_time - next.cycle_time).abs() < 1e-9);
}

// ── Passive and instant modes ─────────────────────────────────

#[test]
fn manual_applies_overrides_only_when_changed() {
    let mut rig = rig(Settings::default(), Ramp::constant(70.0));
    request(&mut rig, ControlCommand::Manual);
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Manual));
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);

    request(
        &mut rig,
        ControlCommand::ManualOutputs {
            auger: true,
            igniter: false,
            fan: true,
            power: true,
        },
    );
    assert_eq!(step(&mut rig), TickOutcome::Running(Mode::Manual));
    assert_eq!(
        outputs(&rig),
        Outputs {
            auger: true,
            igniter: false,
            fan: true,
            power: true,
        }
    );
    assert!(!rig.store().control().expect("control").manual.change);

    request(&mut rig, ControlCommand::SetMode(Mode::Stop));
    assert!(ended(&step(&mut rig)));
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);
}

#[test]
fn recipe_lookup_reports_found_and_missing() {
    let mut rig = rig(Settings::default(), Ramp::constant(70.0));
    let before = outputs(&rig);

    request(&mut rig, ControlCommand::Recipe("brisket".into()));
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Recipe));
    assert!(rig.sinks().saw(&AppEvent::RecipeNotFound("brisket".into())));
    assert_eq!(rig.running_mode(), None);
    assert_eq!(outputs(&rig), before);

    rig.store_mut().insert_recipe(Recipe {
        name: "brisket".into(),
        steps: Vec::new(),
    });
    request(&mut rig, ControlCommand::Recipe("brisket".into()));
    step(&mut rig);
    assert!(rig.sinks().saw(&AppEvent::RecipeFound("brisket".into())));
}

// ── Physical switch ───────────────────────────────────────────

#[test]
fn switch_off_stops_running_mode() {
    let mut rig = rig(Settings::default(), Ramp::constant(200.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    step(&mut rig);
    run_for(&mut rig, 2.0);

    rig.hardware_mut().switch_on = false;
    assert_eq!(
        step(&mut rig),
        TickOutcome::Ended {
            mode: Mode::Smoke,
            reason: ExitReason::SwitchOff,
        }
    );
    assert!(rig.sinks().saw(&AppEvent::SwitchOff));
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Stop));
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);

    // The supervisor inherits the switch position seen by the session.
    assert_eq!(step(&mut rig), TickOutcome::Idle);
    assert_eq!(rig.sinks().count(|e| *e == AppEvent::SwitchOff), 1);
}

#[test]
fn switch_off_while_idle_requests_stop() {
    let mut rig = rig(Settings::default(), Ramp::constant(70.0));
    step(&mut rig);
    rig.hardware_mut().switch_on = false;
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Stop));
    assert_eq!(outputs(&rig), Outputs::ALL_OFF);
    // Position unchanged: no further requests.
    assert_eq!(step(&mut rig), TickOutcome::Idle);
}

// ── Notifications ─────────────────────────────────────────────

#[test]
fn timer_fires_while_idle() {
    let mut rig = rig(Settings::default(), Ramp::constant(70.0));
    let now = rig.clock().wall();
    request(
        &mut rig,
        ControlCommand::StartTimer {
            now,
            seconds: 10.0,
            actions: TargetActions::default(),
        },
    );
    run_for(&mut rig, 9.0);
    assert!(rig.sinks().notifications.is_empty());
    run_for(&mut rig, 2.0);
    assert_eq!(rig.sinks().notifications, vec![NotifyEvent::TimerExpired]);
    let stored = rig.store().control().expect("control");
    assert!(!stored.notify_req.timer);
    assert_eq!(stored.timer.end, 0.0);
}

#[test]
fn probe_target_fires_once_and_requests_shutdown() {
    let mut rig = rig(Settings::default(), Ramp::constant(230.0));
    rig.hardware_mut().probe1 = Ramp::constant(160.0);
    request(
        &mut rig,
        ControlCommand::ArmTarget {
            target: Target::Probe1,
            setpoint: 150.0,
            actions: TargetActions {
                shutdown: true,
                keep_warm: false,
            },
        },
    );
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    step(&mut rig);

    let outcome = step_until(&mut rig, 20.0, |_, o| ended(o)).expect("smoke ends");
    assert_eq!(
        outcome,
        TickOutcome::Ended {
            mode: Mode::Smoke,
            reason: ExitReason::Requested,
        }
    );
    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Shutdown));
    run_for(&mut rig, 10.0);

    assert_eq!(rig.sinks().notifications, vec![NotifyEvent::Probe1TargetReached]);
    assert_eq!(
        rig.sinks()
            .count(|e| matches!(e, AppEvent::TargetReached(NotifyEvent::Probe1TargetReached))),
        1
    );
}

// ── Documents ─────────────────────────────────────────────────

#[test]
fn history_is_written_every_three_seconds() {
    let mut rig = rig(Settings::default(), Ramp::constant(200.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    step(&mut rig);
    run_for(&mut rig, 9.0);

    let history = rig.store().history();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|h| h.mode == Mode::Smoke));
    // The first write precedes a full filter window.
    assert_eq!(history[0].primary, 0.0);
    assert_eq!(history[2].primary, 200.0);
    assert!(history[2].outputs.fan);
}

#[test]
fn unit_change_updates_backend_and_stops() {
    let mut rig = rig(Settings::default(), Ramp::constant(70.0));
    let mut settings = Settings::default();
    settings.globals.units = Units::Celsius;
    rig.store_mut().set_settings(settings);
    rig.store_mut().control_mut().units_change = true;
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));

    assert_eq!(step(&mut rig), TickOutcome::Dispatched(Mode::Stop));
    assert_eq!(rig.hardware().units, Some(Units::Celsius));
    assert_eq!(rig.settings().globals.units, Units::Celsius);
    assert!(!rig.control().units_change);
}

#[test]
fn rejected_settings_keep_previous_snapshot() {
    let mut rig = rig(Settings::default(), Ramp::constant(200.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    step(&mut rig);

    let mut bad = Settings::default();
    bad.cycle_data.pb = 0.0;
    rig.store_mut().set_settings(bad);
    run_for(&mut rig, 3.0);

    assert_eq!(rig.settings().cycle_data.pb, 60.0);
    assert_eq!(
        rig.sinks().count(|e| matches!(e, AppEvent::SettingsRejected(_))),
        1
    );

    let mut good = Settings::default();
    good.safety.max_temp = 500.0;
    rig.store_mut().set_settings(good);
    step(&mut rig);
    assert_eq!(rig.settings().safety.max_temp, 500.0);
    assert_eq!(rig.running_mode(), Some(Mode::Smoke));
}

#[test]
fn probe_profile_update_is_pushed_and_cleared() {
    let mut rig = rig(Settings::default(), Ramp::constant(200.0));
    request(&mut rig, ControlCommand::SetMode(Mode::Smoke));
    step(&mut rig);
    let pushes = rig.hardware().profile_pushes;

    request(&mut rig, ControlCommand::ReloadProbeProfiles);
    step(&mut rig);
    assert_eq!(rig.hardware().profile_pushes, pushes + 1);
    assert!(!rig.store().control().expect("control").probe_profile_update);
}

// ── Store faults ──────────────────────────────────────────────

/// In-memory store whose control document can be made unreadable and
/// unwritable.
struct FaultyStore {
    inner: MemoryStore,
    fail_control: bool,
}

impl SettingsStore for FaultyStore {
    fn read_settings(&self) -> Result<Settings, StoreError> {
        self.inner.read_settings()
    }
}

impl ControlStore for FaultyStore {
    fn read_control(&self) -> Result<ControlState, StoreError> {
        if self.fail_control {
            return Err(StoreError::Corrupted("expected value at line 1 column 3".into()));
        }
        self.inner.read_control()
    }

    fn write_control(&mut self, control: &ControlState) -> Result<(), StoreError> {
        if self.fail_control {
            return Err(StoreError::Io("read-only file system".into()));
        }
        self.inner.write_control(control)
    }
}

impl HistorySink for FaultyStore {
    fn write_history(&mut self, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.inner.write_history(entry)
    }
}

impl RecipeBook for FaultyStore {
    fn find_recipe(&self, name: &str) -> Option<Recipe> {
        self.inner.find_recipe(name)
    }
}

type FaultyRig = Controller<MockHardware, FaultyStore, RecordingSinks, SimClock>;

fn faulty_rig(settings: Settings, primary: Ramp) -> FaultyRig {
    Controller::new(
        MockHardware::new(primary),
        FaultyStore {
            inner: MemoryStore::new(settings),
            fail_control: false,
        },
        RecordingSinks::default(),
        SimClock::new(),
    )
    .expect("controller starts")
}

fn faulty_step(rig: &mut FaultyRig) -> pelletctl::error::Result<TickOutcome> {
    let outcome = rig.tick();
    rig.clock_mut().sleep(Duration::from_secs_f64(TICK));
    outcome
}

#[test]
fn over_temperature_trips_while_control_store_fails() {
    let mut settings = Settings::default();
    settings.safety.max_temp = 450.0;
    let mut rig = faulty_rig(settings, Ramp::constant(600.0));
    rig.store_mut().inner.control_mut().request_mode(Mode::Smoke);
    assert_eq!(faulty_step(&mut rig).expect("dispatch"), TickOutcome::Dispatched(Mode::Smoke));
    assert!(outputs_of(&rig).auger);

    rig.store_mut().fail_control = true;
    let mut outcome = None;
    for _ in 0..40 {
        let o = faulty_step(&mut rig).expect("session ticks survive store faults");
        if matches!(o, TickOutcome::Ended { .. }) {
            outcome = Some(o);
            break;
        }
    }
    assert_eq!(
        outcome,
        Some(TickOutcome::Ended {
            mode: Mode::Smoke,
            reason: ExitReason::Safety(SafetyFault::OverTemperature),
        })
    );
    assert!(!outputs_of(&rig).auger);
    assert!(!outputs_of(&rig).igniter);
    assert_eq!(rig.sinks().notifications, vec![NotifyEvent::OverTemperature]);

    // Error is entered from the working copy while the store is down.
    assert_eq!(faulty_step(&mut rig).expect("terminal dispatch"), TickOutcome::Dispatched(Mode::Error));
    assert_eq!(outputs_of(&rig), Outputs::ALL_OFF);

    // Once the store recovers, the unwritten Error document lands in it.
    rig.store_mut().fail_control = false;
    assert_eq!(faulty_step(&mut rig).expect("idle"), TickOutcome::Idle);
    assert_eq!(rig.store().inner.control().map(|c| c.mode), Some(Mode::Error));
}

#[test]
fn feed_cycle_continues_while_control_store_fails() {
    let mut rig = faulty_rig(Settings::default(), Ramp::constant(200.0));
    rig.store_mut().inner.control_mut().request_mode(Mode::Smoke);
    faulty_step(&mut rig).expect("dispatch");
    rig.store_mut().fail_control = true;

    // 15 s feed phase, then the auger must drop out on schedule.
    for _ in 0..32 {
        assert_eq!(
            faulty_step(&mut rig).expect("session tick"),
            TickOutcome::Running(Mode::Smoke)
        );
    }
    assert!(!outputs_of(&rig).auger);
    assert_eq!(rig.cycle().map(|c| c.on_time), Some(15.0));
}

#[test]
fn corrupt_control_file_does_not_disable_interlocks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path().join("settings.json"), dir.path().join("control.json"));
    let mut settings = Settings::default();
    settings.safety.max_temp = 450.0;
    store.write_settings(&settings).expect("settings written");

    let mut rig = Controller::new(
        MockHardware::new(Ramp::constant(600.0)),
        store,
        RecordingSinks::default(),
        SimClock::new(),
    )
    .expect("controller starts");

    let mut control = rig.store().read_control().expect("defaults written");
    control.request_mode(Mode::Smoke);
    rig.store_mut().write_control(&control).expect("request written");
    assert_eq!(rig.tick().expect("dispatch"), TickOutcome::Dispatched(Mode::Smoke));
    assert!(rig.hardware().outputs.auger);

    std::fs::write(dir.path().join("control.json"), "{ not json").expect("overwrite");
    let mut ended = None;
    for _ in 0..40 {
        rig.clock_mut().sleep(Duration::from_secs_f64(TICK));
        let o = rig.tick().expect("session tick");
        if matches!(o, TickOutcome::Ended { .. }) {
            ended = Some(o);
            break;
        }
    }
    assert_eq!(
        ended,
        Some(TickOutcome::Ended {
            mode: Mode::Smoke,
            reason: ExitReason::Safety(SafetyFault::OverTemperature),
        })
    );
    assert!(!rig.hardware().outputs.auger);
    assert_eq!(rig.sinks().notifications, vec![NotifyEvent::OverTemperature]);

    // The trip rewrote the document with the Error request.
    let stored = rig.store().read_control().expect("control readable again");
    assert_eq!(stored.mode, Mode::Error);
    assert!(stored.updated);
}

fn outputs_of(rig: &FaultyRig) -> Outputs {
    rig.hardware().outputs
}
