//! Session controller: the command surface the presentation layer calls.
//!
//! Holds the run parameters, the start/stop/rearm transitions, and the
//! result-file writing. All cycle state lives behind the shared mutex; the
//! session takes the lock briefly per command and publishes events after
//! releasing it.

use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::builder::SessionBuilder;
use crate::config::{RunParameters, SampleInfo};
use crate::cycle::RunState;
use crate::error::Result;
use crate::events::SessionEvent;
use crate::logfile::ResultWriter;
use crate::phase::Phase;
use crate::poller::{Poller, Shared};
use crate::results::ResultRow;

pub struct Session {
    shared: Arc<Shared>,
    events: Receiver<SessionEvent>,
    pollers: Vec<Poller>,
    info: SampleInfo,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub(crate) fn from_parts(
        shared: Arc<Shared>,
        events: Receiver<SessionEvent>,
        pollers: Vec<Poller>,
        info: SampleInfo,
    ) -> Self {
        Self {
            shared,
            events,
            pollers,
            info,
        }
    }

    /// Install new run parameters. Rejected while a run is active; the
    /// configuration is locked from `start()` until `stop()`.
    pub fn configure(&self, params: RunParameters) -> Result<()> {
        self.shared
            .lock_cycle()
            .set_params(params)
            .map_err(eyre::Report::new)
    }

    /// Start a run. No-op if one is already active. Re-validates the
    /// configuration and zeroes every timer before running.
    pub fn start(&self) -> Result<()> {
        let outcome = {
            let mut cycle = self.shared.lock_cycle();
            cycle.params().validate().map_err(eyre::Report::new)?;
            cycle.begin()
        };
        if outcome.phase_changed {
            let _ = self
                .shared
                .events
                .send(SessionEvent::PhaseChanged(outcome.phase));
        }
        Ok(())
    }

    /// Stop the run: phase forced to `Idle`, configuration unlocked, result
    /// log kept. Idempotent; in-flight instrument reads are not interrupted,
    /// only future phase progress halts.
    pub fn stop(&self) {
        let changed = self.shared.lock_cycle().halt();
        if changed {
            let _ = self
                .shared
                .events
                .send(SessionEvent::PhaseChanged(Phase::Idle));
        }
    }

    /// Provide the next setpoint after a completed window (the cycle is
    /// latched in `Continue` until this is called).
    pub fn rearm(&self, params: RunParameters) -> Result<()> {
        self.shared
            .lock_cycle()
            .rearm(params)
            .map_err(eyre::Report::new)
    }

    pub fn state(&self) -> RunState {
        self.shared.lock_cycle().snapshot()
    }

    pub fn params(&self) -> RunParameters {
        self.shared.lock_cycle().params()
    }

    /// Copy of the result log accumulated so far.
    pub fn results(&self) -> Vec<ResultRow> {
        self.shared.lock_cycle().results().rows().to_vec()
    }

    pub fn sample_info(&self) -> &SampleInfo {
        &self.info
    }

    /// Receiver for the notification events. The channel is single-consumer:
    /// clones compete for messages rather than each seeing all of them.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events.clone()
    }

    /// Write the full result log to `path`: header block, then one row per
    /// completed window.
    pub fn save(&self, path: &Path) -> Result<()> {
        let rows = self.results();
        let writer = ResultWriter::create(path, &self.info)?;
        for row in &rows {
            writer.append_row(row)?;
        }
        tracing::info!(path = %path.display(), rows = rows.len(), "result log saved");
        Ok(())
    }

    /// Signal all three pollers to stop and join them. Blocks until each
    /// loop has observed its stop flag and returned; the joined threads drop
    /// their instrument ports. Join failures are reported, never fatal.
    pub fn shutdown(&mut self) {
        tracing::debug!("session shutdown: stopping pollers");
        for poller in &mut self.pollers {
            poller.stop_and_join();
        }
        self.pollers.clear();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
