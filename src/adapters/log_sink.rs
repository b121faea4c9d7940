//! Log-based sink adapters.
//!
//! [`LogEventSink`] renders every [`AppEvent`] as one structured log line
//! (the controller's event log).  [`LogNotifier`] is the notification
//! transport of last resort: it logs the event name.  A push or webhook
//! transport would implement the same trait.

use log::{info, warn};

use crate::app::events::{AppEvent, NotifyEvent};
use crate::app::ports::{EventSink, NotificationSink};

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | stored_mode={}", mode);
            }
            AppEvent::ModeStarted(mode) => {
                info!("MODE  | {} started", mode);
            }
            AppEvent::ModeEnded { mode, reason } => {
                info!("MODE  | {} ended, reason={:?}", mode, reason);
            }
            AppEvent::SwitchOff => {
                info!("INPUT | switch off, stopping");
            }
            AppEvent::SafetyTrip {
                fault,
                temperature,
                limit,
            } => {
                warn!(
                    "SAFETY| {} | avg={:.1} limit={:.1}",
                    fault, temperature, limit
                );
            }
            AppEvent::ReigniteAttempt { retries_left } => {
                warn!("SAFETY| re-ignite attempt, retries_left={}", retries_left);
            }
            AppEvent::TargetReached(event) => {
                info!("NOTIFY| {}", event.name());
            }
            AppEvent::RecipeFound(name) => {
                info!("RECIPE| found {:?}", name);
            }
            AppEvent::RecipeNotFound(name) => {
                warn!("RECIPE| not found {:?}", name);
            }
            AppEvent::SettingsRejected(e) => {
                warn!("CONFIG| settings rejected: {}", e);
            }
            AppEvent::BackendFallback {
                port,
                requested,
                fallback,
            } => {
                warn!(
                    "CONFIG| {} backend {:?} unavailable, using {:?}",
                    port, requested, fallback
                );
            }
        }
    }
}

/// Notification transport that only logs.
#[derive(Debug, Default)]
pub struct LogNotifier {
    sent: usize,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl NotificationSink for LogNotifier {
    fn send(&mut self, event: NotifyEvent) {
        self.sent += 1;
        info!("NOTIFY| send {}", event.name());
    }
}
