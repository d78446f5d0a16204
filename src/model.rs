//! Core data model for Pilgrim.
//!
//! Coordinates and targets on the input side, orientation samples from
//! the device, and readings on the output side.

mod coordinates;
mod orientation;
mod reading;
mod target;

pub use coordinates::Coordinates;
pub use orientation::OrientationSample;
pub use reading::{BearingResult, Guidance, Reading, Transition};
pub use target::LocationTarget;
