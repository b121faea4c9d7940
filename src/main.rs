//! pelletctl main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  JsonFileStore        Backends (registry)     Sinks            │
//! │  (settings, control,  (probes, relays,        (display, log,   │
//! │   history, recipes)    selector switch)        notifications)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │             Controller (pure logic)                    │    │
//! │  │  FSM · Cycle/PID · TempQueue · Safety · Notify         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  SystemClock (real time) · SimClock (--simulated-clock)        │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use pelletctl::adapters::json_store::JsonFileStore;
use pelletctl::adapters::log_sink::{LogEventSink, LogNotifier};
use pelletctl::adapters::registry::{BackendRegistry, Backends, Sinks};
use pelletctl::adapters::time::{SimClock, SystemClock};
use pelletctl::app::commands::{ControlCommand, Target};
use pelletctl::app::ports::{Clock, ControlStore, EventSink, SettingsStore, StoreError};
use pelletctl::config::Settings;
use pelletctl::control_state::{ControlState, TargetActions};
use pelletctl::fsm::Mode;
use pelletctl::fsm::controller::Controller;

/// Closed-loop controller for pellet-fed combustion appliances
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings document (JSON)
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Control document (JSON), shared with the web UI
    #[arg(long, default_value = "control.json")]
    control: PathBuf,

    /// Recipe book (JSON array)
    #[arg(long)]
    recipes: Option<PathBuf>,

    /// Temperature history output (JSON lines)
    #[arg(long)]
    history: Option<PathBuf>,

    /// Control-loop period in milliseconds
    #[arg(long, default_value_t = 500)]
    tick_ms: u64,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Advance a simulated clock instead of sleeping
    #[arg(long)]
    simulated_clock: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the control loop (default)
    Run,
    /// Write a default settings document if none exists
    Init,
    /// Validate the settings document and exit
    Validate,
    /// Write a request into the control document
    #[command(subcommand)]
    Request(Request),
}

#[derive(Debug, Subcommand)]
enum Request {
    /// Request a mode (startup, smoke, shutdown, stop, monitor, ...)
    Mode { mode: Mode },
    /// Hold at a primary setpoint
    Hold { setpoint: f64 },
    /// Arm a food-probe target (probe 1 or 2)
    Probe {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        probe: u8,
        setpoint: f64,
        #[arg(long)]
        shutdown: bool,
        #[arg(long)]
        keep_warm: bool,
    },
    /// Start the countdown timer
    Timer {
        seconds: f64,
        #[arg(long)]
        shutdown: bool,
        #[arg(long)]
        keep_warm: bool,
    },
    /// Toggle Smoke Plus fan cycling
    SmokePlus {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Run a named recipe
    Recipe { name: String },
}

impl Request {
    fn into_command(self, now: f64) -> ControlCommand {
        match self {
            Self::Mode { mode } => ControlCommand::SetMode(mode),
            Self::Hold { setpoint } => ControlCommand::Hold { setpoint },
            Self::Probe {
                probe,
                setpoint,
                shutdown,
                keep_warm,
            } => ControlCommand::ArmTarget {
                target: if probe == 1 { Target::Probe1 } else { Target::Probe2 },
                setpoint,
                actions: TargetActions { shutdown, keep_warm },
            },
            Self::Timer {
                seconds,
                shutdown,
                keep_warm,
            } => ControlCommand::StartTimer {
                now,
                seconds,
                actions: TargetActions { shutdown, keep_warm },
            },
            Self::SmokePlus { enabled } => ControlCommand::SmokePlus(enabled),
            Self::Recipe { name } => ControlCommand::Recipe(name),
        }
    }
}

fn main() -> Result<()> {
    let mut args = Args::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let mut store = JsonFileStore::new(&args.settings, &args.control);
    if let Some(path) = &args.history {
        store = store.with_history(path);
    }
    if let Some(path) = &args.recipes {
        store = store.with_recipes(path);
    }

    match args.command.take().unwrap_or(Command::Run) {
        Command::Run => run(&args, store),
        Command::Init => init(&store),
        Command::Validate => validate(&store),
        Command::Request(req) => {
            let now = SystemClock::new().wall();
            request(store, &req.into_command(now))
        }
    }
}

fn run(args: &Args, store: JsonFileStore) -> Result<()> {
    info!("pelletctl v{}", env!("CARGO_PKG_VERSION"));

    let settings = match store.read_settings() {
        Ok(settings) => settings,
        Err(StoreError::NotFound) => Settings::default(),
        Err(e) => {
            return Err(e).with_context(|| format!("reading {}", args.settings.display()));
        }
    };
    let resolved = BackendRegistry::with_builtins().build(&settings);
    let mut sinks = Sinks {
        display: resolved.display,
        notifier: Box::new(LogNotifier::new()),
        events: Box::new(LogEventSink::new()),
    };
    for event in &resolved.fallbacks {
        sinks.emit(event);
    }

    let period = Duration::from_millis(args.tick_ms);
    if args.simulated_clock {
        drive(resolved.hardware, store, sinks, SimClock::new(), period, args.ticks)
    } else {
        drive(resolved.hardware, store, sinks, SystemClock::new(), period, args.ticks)
    }
}

fn drive<C: Clock>(
    hardware: Backends,
    store: JsonFileStore,
    sinks: Sinks,
    clock: C,
    period: Duration,
    ticks: Option<u64>,
) -> Result<()> {
    let mut controller = Controller::new(hardware, store, sinks, clock)
        .context("starting controller")?
        .with_tick_period(period);
    controller.run(ticks);
    info!("controller stopped in {:?}", controller.control().mode);
    Ok(())
}

fn init(store: &JsonFileStore) -> Result<()> {
    match store.read_settings() {
        Ok(_) => {
            info!("{} already exists", store.settings_path().display());
            Ok(())
        }
        Err(StoreError::NotFound) => {
            store
                .write_settings(&Settings::default())
                .with_context(|| format!("writing {}", store.settings_path().display()))?;
            info!("wrote default settings to {}", store.settings_path().display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", store.settings_path().display())),
    }
}

fn validate(store: &JsonFileStore) -> Result<()> {
    let settings = store
        .read_settings()
        .with_context(|| format!("reading {}", store.settings_path().display()))?;
    settings
        .validate()
        .with_context(|| format!("validating {}", store.settings_path().display()))?;
    println!("Settings are valid: {}", store.settings_path().display());
    Ok(())
}

fn request(mut store: JsonFileStore, command: &ControlCommand) -> Result<()> {
    let mut control = match store.read_control() {
        Ok(control) => control,
        Err(StoreError::NotFound) => {
            let settings = store.read_settings().unwrap_or_default();
            ControlState::with_defaults(&settings)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading {}", store.control_path().display()));
        }
    };
    command.apply(&mut control);
    store
        .write_control(&control)
        .with_context(|| format!("writing {}", store.control_path().display()))?;
    info!("request applied: {:?}", command);
    Ok(())
}
