//! The acquisition cycle state machine (`CycleCore`).
//!
//! Decides, once per temperature tick, which phase the run is in: out of
//! tolerance (Cooling/Heating), dwelling (Stabilizing), averaging
//! (Acquiring), or finished with the current window (Continue). Owns the
//! sample buffer and the result log; all mutation happens through it.

use std::sync::Arc;
use std::time::Instant;

use cryostat_traits::Signal;
use cryostat_traits::clock::Clock;

use crate::config::RunParameters;
use crate::error::ControllerError;
use crate::phase::Phase;
use crate::results::{ResistanceScaling, ResultLog, ResultRow};
use crate::sample::{Sample, SampleBuffer};
use crate::util::ms_to_secs;

/// Temperature assumed before the first poll tick (K).
const ROOM_K: f64 = 300.0;

/// Snapshot of the live run state for presentation collaborators.
/// Read-only outside the cycle core.
#[derive(Debug, Clone, Copy)]
pub struct RunState {
    pub phase: Phase,
    pub is_running: bool,
    pub setpoint_k: f64,
    pub temperature_k: f64,
    pub dwell_elapsed_s: f64,
    pub acquire_elapsed_s: f64,
    pub run_elapsed_s: f64,
}

/// What a single temperature tick did.
#[derive(Debug, Clone, Copy)]
pub struct TickOutcome {
    pub phase: Phase,
    pub phase_changed: bool,
    /// The row appended when this tick closed an averaging window.
    pub closed: Option<ResultRow>,
    /// The window closed with zero samples; nothing was appended.
    pub empty_window: bool,
}

impl TickOutcome {
    fn unchanged(phase: Phase) -> Self {
        Self {
            phase,
            phase_changed: false,
            closed: None,
            empty_window: false,
        }
    }
}

pub struct CycleCore {
    params: RunParameters,
    scaling: ResistanceScaling,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,

    running: bool,
    phase: Phase,
    /// Latched once a window completes; cleared by `rearm` or `begin`.
    continue_latched: bool,
    temperature_k: f64,
    run_start_ms: u64,
    dwell_start_ms: Option<u64>,
    acquire_start_ms: Option<u64>,
    buffer: SampleBuffer,
    results: ResultLog,
}

impl core::fmt::Debug for CycleCore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CycleCore")
            .field("phase", &self.phase)
            .field("running", &self.running)
            .field("setpoint_k", &self.params.setpoint_k)
            .field("temperature_k", &self.temperature_k)
            .finish()
    }
}

impl CycleCore {
    pub fn new(
        params: RunParameters,
        scaling: ResistanceScaling,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let epoch = clock.now();
        Self {
            params,
            scaling,
            clock,
            epoch,
            running: false,
            phase: Phase::Idle,
            continue_latched: false,
            temperature_k: ROOM_K,
            run_start_ms: 0,
            dwell_start_ms: None,
            acquire_start_ms: None,
            buffer: SampleBuffer::new(),
            results: ResultLog::new(),
        }
    }

    pub fn params(&self) -> RunParameters {
        self.params
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_acquiring(&self) -> bool {
        self.running && self.phase == Phase::Acquiring
    }

    pub fn results(&self) -> &ResultLog {
        &self.results
    }

    /// Install new parameters. Only permitted while idle; during a run the
    /// configuration is locked.
    pub fn set_params(&mut self, params: RunParameters) -> Result<(), ControllerError> {
        if self.running {
            return Err(ControllerError::State(
                "configuration is locked while a run is active".into(),
            ));
        }
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Start a run: zero every timer, open no window, evaluate the phase
    /// from the last known temperature. No-op if already running.
    pub fn begin(&mut self) -> TickOutcome {
        if self.running {
            return TickOutcome::unchanged(self.phase);
        }
        let now = self.clock.ms_since(self.epoch);
        self.run_start_ms = now;
        self.dwell_start_ms = None;
        self.acquire_start_ms = None;
        self.continue_latched = false;
        self.buffer.abandon();
        self.running = true;
        tracing::info!(
            setpoint_k = self.params.setpoint_k,
            temperature_k = self.temperature_k,
            "run start"
        );
        self.step(now)
    }

    /// Stop the run: force `Idle`, clear the trackers, abandon any open
    /// window. The result log is kept. Idempotent.
    pub fn halt(&mut self) -> bool {
        let was_active = self.phase.is_active();
        if self.running {
            tracing::info!(windows = self.results.len(), "run stop");
        }
        self.running = false;
        self.phase = Phase::Idle;
        self.continue_latched = false;
        self.dwell_start_ms = None;
        self.acquire_start_ms = None;
        self.buffer.abandon();
        was_active
    }

    /// Provide the next setpoint after a completed window and resume phase
    /// evaluation. Only legal while latched in `Continue`.
    pub fn rearm(&mut self, params: RunParameters) -> Result<(), ControllerError> {
        if !(self.running && self.phase == Phase::Continue) {
            return Err(ControllerError::State(
                "rearm is only permitted in the Continue phase".into(),
            ));
        }
        params.validate()?;
        self.params = params;
        self.continue_latched = false;
        tracing::info!(setpoint_k = params.setpoint_k, "rearmed for next setpoint");
        Ok(())
    }

    /// Commit one temperature reading and evaluate the transition function.
    /// Non-finite readings never reach the decision logic.
    pub fn on_temperature(&mut self, temperature_k: f64) -> TickOutcome {
        if !temperature_k.is_finite() {
            tracing::warn!(temperature_k, "non-finite temperature dropped");
            return TickOutcome::unchanged(self.phase);
        }
        self.temperature_k = temperature_k;
        let now = self.clock.ms_since(self.epoch);
        self.step(now)
    }

    /// Append one signal/reference reading to the open window. Returns false
    /// (and drops the reading) unless the cycle is currently acquiring.
    pub fn record_signal(&mut self, signal: Signal, reference_v: f64) -> bool {
        if !self.is_acquiring() {
            return false;
        }
        let elapsed_ms = self
            .clock
            .ms_since(self.epoch)
            .saturating_sub(self.run_start_ms);
        self.buffer.push(Sample {
            elapsed_ms,
            temperature_k: self.temperature_k,
            signal,
            reference_v,
        });
        true
    }

    pub fn snapshot(&self) -> RunState {
        let now = self.clock.ms_since(self.epoch);
        let since = |start: Option<u64>| {
            start
                .map(|s| ms_to_secs(now.saturating_sub(s)))
                .unwrap_or(0.0)
        };
        RunState {
            phase: self.phase,
            is_running: self.running,
            setpoint_k: self.params.setpoint_k,
            temperature_k: self.temperature_k,
            dwell_elapsed_s: since(self.dwell_start_ms),
            acquire_elapsed_s: since(self.acquire_start_ms),
            run_elapsed_s: if self.running {
                ms_to_secs(now.saturating_sub(self.run_start_ms))
            } else {
                0.0
            },
        }
    }

    // ── Private: the transition function ─────────────────────────────────

    /// One evaluation of the cycle logic at `now` (ms since epoch).
    fn step(&mut self, now: u64) -> TickOutcome {
        let previous = self.phase;
        let mut closed = None;
        let mut empty_window = false;

        let next = if !self.running {
            Phase::Idle
        } else if self.continue_latched {
            Phase::Continue
        } else if (self.temperature_k - self.params.setpoint_k).abs() > self.params.temp_tolerance_k
        {
            // Out of band: any excursion before window completion discards
            // partial acquisition data and restarts stabilization.
            self.dwell_start_ms = None;
            if self.acquire_start_ms.take().is_some() {
                tracing::debug!(
                    discarded = self.buffer.len(),
                    temperature_k = self.temperature_k,
                    "tolerance excursion; acquisition window abandoned"
                );
                self.buffer.abandon();
            }
            if self.temperature_k > self.params.setpoint_k {
                Phase::Cooling
            } else {
                Phase::Heating
            }
        } else {
            match self.dwell_start_ms {
                None => {
                    self.dwell_start_ms = Some(now);
                    Phase::Stabilizing
                }
                Some(dwell_start) => {
                    if now.saturating_sub(dwell_start) < self.params.stable_ms {
                        Phase::Stabilizing
                    } else {
                        let acquire_start = match self.acquire_start_ms {
                            Some(s) => s,
                            None => {
                                self.buffer.open();
                                self.acquire_start_ms = Some(now);
                                now
                            }
                        };
                        if now.saturating_sub(acquire_start) < self.params.integration_ms {
                            Phase::Acquiring
                        } else {
                            // Window complete: reduce, clear both trackers,
                            // latch until the next setpoint arrives.
                            self.acquire_start_ms = None;
                            self.dwell_start_ms = None;
                            self.continue_latched = true;
                            let closed_at = now.saturating_sub(self.run_start_ms);
                            match self.buffer.reduce(closed_at) {
                                Some(record) => {
                                    let row = self.results.push(record, &self.scaling);
                                    tracing::info!(
                                        elapsed_s = ms_to_secs(closed_at),
                                        mean_temperature_k = record.temperature_k,
                                        resistance_ohm = row.resistance_ohm,
                                        "averaging window closed"
                                    );
                                    closed = Some(row);
                                }
                                None => {
                                    // Zero-length averaging window: a caller
                                    // error, not a fatal one.
                                    empty_window = true;
                                    tracing::warn!(
                                        error = %ControllerError::EmptyWindow,
                                        "window closed without samples; no record appended"
                                    );
                                }
                            }
                            Phase::Continue
                        }
                    }
                }
            }
        };

        let phase_changed = next != previous;
        if phase_changed {
            tracing::debug!(from = %previous, to = %next, "phase transition");
        }
        self.phase = next;
        TickOutcome {
            phase: next,
            phase_changed,
            closed,
            empty_window,
        }
    }
}
