//! Notification decision logic.
//!
//! Every armed target (primary setpoint, two food probes, countdown timer)
//! is checked independently.  A target fires when its condition is met:
//! the request flag is cleared, follow-up actions are applied to the
//! control document, and the target's [`NotifyEvent`] is reported exactly
//! once.  Re-arming is up to the outside world.

use heapless::Vec;
use log::info;

use crate::app::events::NotifyEvent;
use crate::config::Settings;
use crate::control_state::{ControlState, TargetActions};
use crate::fsm::Mode;
use crate::sensors::ProbeReadings;

/// One notification sample.
#[derive(Debug, Clone, Copy)]
pub struct NotifySample {
    /// Smoothed probe readings.
    pub readings: ProbeReadings,
    /// Wall-clock epoch seconds, compared against the timer end.
    pub now: f64,
}

/// Targets that fired during one check; at most one per target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fired(Vec<NotifyEvent, 4>);

impl Fired {
    /// `true` when the control document was mutated.
    pub fn changed(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn events(&self) -> &[NotifyEvent] {
        &self.0
    }

    fn push(&mut self, event: NotifyEvent) {
        // One slot per target; a target fires at most once per check.
        let _ = self.0.push(event);
    }
}

/// Evaluate every armed target.
pub fn check_notify(sample: &NotifySample, control: &mut ControlState, settings: &Settings) -> Fired {
    let mut fired = Fired::default();
    let r = &sample.readings;
    let units = settings.globals.units.symbol();

    if control.notify_req.primary && r.primary >= control.setpoints.primary {
        control.notify_req.primary = false;
        info!("Grill Temp of {}{} Achieved", control.setpoints.primary, units);
        fired.push(NotifyEvent::PrimaryTargetReached);
    }

    if control.notify_req.probe1 && r.probe1 >= control.setpoints.probe1 {
        control.notify_req.probe1 = false;
        let actions = core::mem::take(&mut control.notify_data.probe1);
        apply_follow_up(actions, control, settings);
        info!("Probe 1 Temp of {}{} Achieved", control.setpoints.probe1, units);
        fired.push(NotifyEvent::Probe1TargetReached);
    }

    if control.notify_req.probe2 && r.probe2 >= control.setpoints.probe2 {
        control.notify_req.probe2 = false;
        let actions = core::mem::take(&mut control.notify_data.probe2);
        apply_follow_up(actions, control, settings);
        info!("Probe 2 Temp of {}{} Achieved", control.setpoints.probe2, units);
        fired.push(NotifyEvent::Probe2TargetReached);
    }

    if let Some(event) = check_timer(sample.now, control, settings) {
        fired.push(event);
    }

    fired
}

/// Evaluate only the countdown timer.  Used while no mode is running.
pub fn check_timer(now: f64, control: &mut ControlState, settings: &Settings) -> Option<NotifyEvent> {
    if !control.notify_req.timer || now < control.timer.end {
        return None;
    }
    control.notify_req.timer = false;
    control.timer.reset();
    let actions = core::mem::take(&mut control.notify_data.timer);
    apply_follow_up(actions, control, settings);
    info!("Timer Expired");
    Some(NotifyEvent::TimerExpired)
}

fn apply_follow_up(actions: TargetActions, control: &mut ControlState, settings: &Settings) {
    let mode = control.mode;
    if actions.shutdown
        && matches!(mode, Mode::Startup | Mode::Reignite | Mode::Smoke | Mode::Hold)
    {
        control.request_mode(Mode::Shutdown);
    }
    if actions.keep_warm && matches!(mode, Mode::Smoke | Mode::Hold) {
        control.setpoints.primary = settings.keep_warm.temp;
        control.s_plus = settings.keep_warm.s_plus;
        control.request_mode(Mode::Hold);
    }
}
