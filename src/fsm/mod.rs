//! Mode state machine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  MODE_TABLE                                                        │
//! │  ┌──────────┬────────────┬────────────────┬─────────────────────┐  │
//! │  │ Mode     │ kind       │ time limit     │ on completion       │  │
//! │  ├──────────┼────────────┼────────────────┼─────────────────────┤  │
//! │  │ Startup  │ WorkCycle  │ startup_timer  │ continue → Smoke    │  │
//! │  │ Smoke    │ WorkCycle  │ -              │ -                   │  │
//! │  │ Hold     │ WorkCycle  │ -              │ -                   │  │
//! │  │ Shutdown │ WorkCycle  │ shutdown_timer │ request → Stop      │  │
//! │  │ Reignite │ WorkCycle  │ startup_timer  │ resume last state   │  │
//! │  │ Monitor  │ Passive    │ -              │ -                   │  │
//! │  │ Manual   │ Passive    │ -              │ -                   │  │
//! │  │ Recipe   │ Instant    │ -              │ -                   │  │
//! │  │ Stop     │ Terminal   │ -              │ -                   │  │
//! │  │ Error    │ Terminal   │ -              │ -                   │  │
//! │  └──────────┴────────────┴────────────────┴─────────────────────┘  │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The requested mode lives in the control document.  When the
//! controller sees `updated`, it looks the mode up in [`MODE_TABLE`] and
//! dispatches on the row's [`ModeKind`]: work-cycle and passive modes
//! open a session that runs tick by tick, instant and terminal modes
//! complete within the dispatching tick.  A session that reaches its time
//! limit follows the row's [`Completion`].

pub mod context;
pub mod controller;
pub mod states;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Globals;
use crate::error::SafetyFault;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Every appliance mode.  Serialized by variant name in the control
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Mode {
    Startup = 0,
    Smoke = 1,
    Hold = 2,
    Shutdown = 3,
    Reignite = 4,
    Monitor = 5,
    Manual = 6,
    Recipe = 7,
    #[default]
    Stop = 8,
    Error = 9,
}

impl Mode {
    pub const COUNT: usize = 10;

    pub const ALL: [Mode; Mode::COUNT] = [
        Mode::Startup,
        Mode::Smoke,
        Mode::Hold,
        Mode::Shutdown,
        Mode::Reignite,
        Mode::Monitor,
        Mode::Manual,
        Mode::Recipe,
        Mode::Stop,
        Mode::Error,
    ];

    /// This mode's row in [`MODE_TABLE`].
    pub fn descriptor(self) -> &'static ModeDescriptor {
        &MODE_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn kind(self) -> ModeKind {
        self.descriptor().kind
    }

    /// Modes whose session drives the auger.
    pub fn is_work_cycle(self) -> bool {
        self.kind() == ModeKind::WorkCycle
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Mode {
    type Err = UnknownMode;

    /// Case-insensitive mode name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMode(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode {:?}", self.0)
    }
}

impl std::error::Error for UnknownMode {}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// How a mode is executed once dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    /// Tick-driven session that cycles the auger.
    WorkCycle,
    /// Tick-driven session that only observes (or applies manual
    /// overrides).
    Passive,
    /// Completes within the dispatching tick.
    Instant,
    /// Outputs de-energised until an external request arrives.
    Terminal,
}

/// Which settings field bounds a session's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLimit {
    Startup,
    Shutdown,
}

impl TimeLimit {
    pub fn seconds(self, globals: &Globals) -> f64 {
        match self {
            Self::Startup => f64::from(globals.startup_timer),
            Self::Shutdown => f64::from(globals.shutdown_timer),
        }
    }
}

/// What follows a session that ran to its time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Record the mode and run it within the same tick.
    Continue(Mode),
    /// Record the mode with `updated` set; dispatched on the next tick.
    Request(Mode),
    /// Continue with the mode that was interrupted by a flame-out.
    ResumeLastState,
}

/// One row of the mode table.
#[derive(Debug)]
pub struct ModeDescriptor {
    pub mode: Mode,
    pub name: &'static str,
    pub kind: ModeKind,
    pub time_limit: Option<TimeLimit>,
    pub on_complete: Option<Completion>,
    /// Igniter energised for the whole session.
    pub ignites: bool,
    /// Auger switched on at session entry.
    pub feeds: bool,
}

/// Indexed by `Mode as usize`.
pub static MODE_TABLE: [ModeDescriptor; Mode::COUNT] = [
    ModeDescriptor {
        mode: Mode::Startup,
        name: "Startup",
        kind: ModeKind::WorkCycle,
        time_limit: Some(TimeLimit::Startup),
        on_complete: Some(Completion::Continue(Mode::Smoke)),
        ignites: true,
        feeds: true,
    },
    ModeDescriptor {
        mode: Mode::Smoke,
        name: "Smoke",
        kind: ModeKind::WorkCycle,
        time_limit: None,
        on_complete: None,
        ignites: false,
        feeds: true,
    },
    ModeDescriptor {
        mode: Mode::Hold,
        name: "Hold",
        kind: ModeKind::WorkCycle,
        time_limit: None,
        on_complete: None,
        ignites: false,
        feeds: true,
    },
    ModeDescriptor {
        mode: Mode::Shutdown,
        name: "Shutdown",
        kind: ModeKind::WorkCycle,
        time_limit: Some(TimeLimit::Shutdown),
        on_complete: Some(Completion::Request(Mode::Stop)),
        ignites: false,
        feeds: false,
    },
    ModeDescriptor {
        mode: Mode::Reignite,
        name: "Reignite",
        kind: ModeKind::WorkCycle,
        time_limit: Some(TimeLimit::Startup),
        on_complete: Some(Completion::ResumeLastState),
        ignites: true,
        feeds: true,
    },
    ModeDescriptor {
        mode: Mode::Monitor,
        name: "Monitor",
        kind: ModeKind::Passive,
        time_limit: None,
        on_complete: None,
        ignites: false,
        feeds: false,
    },
    ModeDescriptor {
        mode: Mode::Manual,
        name: "Manual",
        kind: ModeKind::Passive,
        time_limit: None,
        on_complete: None,
        ignites: false,
        feeds: false,
    },
    ModeDescriptor {
        mode: Mode::Recipe,
        name: "Recipe",
        kind: ModeKind::Instant,
        time_limit: None,
        on_complete: None,
        ignites: false,
        feeds: false,
    },
    ModeDescriptor {
        mode: Mode::Stop,
        name: "Stop",
        kind: ModeKind::Terminal,
        time_limit: None,
        on_complete: None,
        ignites: false,
        feeds: false,
    },
    ModeDescriptor {
        mode: Mode::Error,
        name: "Error",
        kind: ModeKind::Terminal,
        time_limit: None,
        on_complete: None,
        ignites: false,
        feeds: false,
    },
];

// ---------------------------------------------------------------------------
// Session exit
// ---------------------------------------------------------------------------

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The session reached its time limit.
    Completed,
    /// `updated` was observed in the control document.
    Requested,
    /// The physical switch was turned off.
    SwitchOff,
    /// A safety interlock fired.
    Safety(SafetyFault),
}
