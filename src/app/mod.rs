//! Application boundary: ports, events and commands.
//!
//! The control core ([`fsm`](crate::fsm), [`control`](crate::control),
//! [`sensors`](crate::sensors), [`safety`](crate::safety),
//! [`notify`](crate::notify)) contains the business rules.  All
//! interaction with stores, hardware and transports happens through the
//! **port traits** defined in [`ports`], keeping the core fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
