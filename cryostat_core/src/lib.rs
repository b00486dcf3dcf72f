#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core acquisition logic for the cryostat resistivity controller
//! (hardware-agnostic).
//!
//! All instrument interaction goes through the `cryostat_traits` port
//! traits; this crate never talks to a bus.
//!
//! ## Architecture
//!
//! - **Cycle state machine** (`cycle`): per-temperature-tick phase decisions
//!   (Cooling/Heating -> Stabilizing -> Acquiring -> Continue)
//! - **Sample buffer & averaging** (`sample`): one window at a time, reduced
//!   to its componentwise mean
//! - **Result log** (`results`, `logfile`): derived resistance, append-only
//!   rows, fixed-width text output
//! - **Pollers** (`poller`): timekeeper, temperature, and signal loops with
//!   independent stop flags, joined on shutdown
//! - **Session controller** (`session`, `builder`): configure/start/stop/
//!   rearm/save commands and the event notification surface (`events`)
//!
//! ## Time
//!
//! All internal timing is integer milliseconds measured against a
//! `cryostat_traits::Clock`, so the whole cycle is deterministic under a
//! manual test clock.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod cycle;
pub mod error;
pub mod events;
pub mod hw_error;
pub mod logfile;
pub mod mocks;
pub mod phase;
pub mod poller;
pub mod results;
pub mod sample;
pub mod session;
pub mod util;

pub use builder::SessionBuilder;
pub use config::{PollingCfg, RunParameters, SampleInfo};
pub use cycle::{CycleCore, RunState, TickOutcome};
pub use error::{BuildError, ControllerError, Result};
pub use events::SessionEvent;
pub use phase::Phase;
pub use results::{ResistanceScaling, ResultLog, ResultRow};
pub use sample::{AveragedRecord, Sample, SampleBuffer};
pub use session::Session;
