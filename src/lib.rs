//! Pellet appliance controller library.
//!
//! Exposes the control core (mode state machine, cycle controller, PID,
//! temperature filter, safety and notification logic) and the adapters
//! that connect it to documents, probes and relays.  Everything touching
//! the outside world sits behind the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod control_state;
pub mod error;
pub mod fsm;
pub mod notify;
pub mod safety;
pub mod sensors;
