//! Notifications pushed to the presentation collaborator.
//!
//! The core never calls into rendering; it only publishes these events over
//! an unbounded channel. Senders never block.

use crate::phase::Phase;
use crate::results::ResultRow;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Wall-clock heartbeat from the timekeeper.
    Tick {
        local_time: chrono::DateTime<chrono::Local>,
        run_elapsed_s: f64,
    },
    /// The cycle moved to a new phase.
    PhaseChanged(Phase),
    /// An averaging window completed and appended a row to the result log.
    WindowClosed(ResultRow),
    /// Opportunistic plot-refresh hint, every few display seconds of a run.
    PlotRefresh,
}
