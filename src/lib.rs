//! Core of an embedded traffic-light controller: the per-light signal state
//! machine, the GPIO line actuation behind it, and the intersection-level
//! scheduler that keeps conflicting approaches from ever being permissive at
//! the same time.
//!
//! Hardware-generic: lines are [`embedded_hal::digital::OutputPin`]
//! implementations and timestamps are [`embassy_time::Instant`] values, both
//! supplied by the caller. The crate never reads the clock and never blocks;
//! a single external scheduler drives [`Controller::update`] on a fixed
//! period and exclusively owns all calls into the controller.

#![cfg_attr(not(test), no_std)]

mod controller;
pub use controller::*;
mod error;
pub use error::*;
mod light;
pub use light::*;
mod pins;
pub use pins::*;
mod policy;
pub use policy::*;
mod signal;
pub use signal::*;

/// Upper bound on the number of lights a conflict group can address.
pub const MAX_LIGHTS: usize = 32;
