//! Actuator control: PID, auger duty cycle, Smoke Plus fan cycling.

pub mod cycle;
pub mod pid;
pub mod smoke_plus;

pub use cycle::{CycleController, CycleParameters, FeedToggle, compute_cycle};
pub use pid::PidController;
