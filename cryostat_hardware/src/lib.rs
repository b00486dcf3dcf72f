//! Instrument backends for the resistivity controller.
//!
//! The simulated backends in `sim` are the default stand-ins for the real
//! GPIB instruments; `scpi` carries the pure command/reply formats those
//! instruments speak. Opening and managing actual VISA/GPIB connections is
//! outside this crate: drivers are handed to the core as implementations of
//! the `cryostat_traits` port traits, constructed connected and
//! disconnected on drop.

pub mod error;
pub mod scpi;
pub mod sim;

pub use error::InstrumentError;
pub use sim::{SimCryostat, SimLockIn, SimThermometer, SimVoltmeter};
