//! The three polling loops: timekeeper, temperature, and signal.
//!
//! Each loop runs on its own thread, owns its instrument port outright (no
//! port is shared across loops), and is guarded by an independent stop flag
//! checked once per iteration. Blocking instrument reads happen outside the
//! shared lock; the lock is taken only to commit a result.
//!
//! Safety: each `Poller` owns exactly one thread that is signalled and
//! joined when the `Poller` is dropped, preventing thread leaks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use cryostat_traits::clock::Clock;
use cryostat_traits::{LockIn, Thermometer, Voltmeter};

use crate::config::PollingCfg;
use crate::cycle::CycleCore;
use crate::events::SessionEvent;
use crate::hw_error::map_instrument_error;
use crate::util::period_us;

/// State the three loops coordinate through: the cycle core behind one
/// mutex, plus the outbound event channel.
pub(crate) struct Shared {
    pub(crate) cycle: Mutex<CycleCore>,
    pub(crate) events: Sender<SessionEvent>,
}

impl Shared {
    pub(crate) fn lock_cycle(&self) -> MutexGuard<'_, CycleCore> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one polling thread. Dropping it signals the stop flag and
/// joins the thread.
pub struct Poller {
    name: &'static str,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    fn launch(name: &'static str, stop: Arc<AtomicBool>, handle: JoinHandle<()>) -> Self {
        Self {
            name,
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the loop and block until it has observed the flag and
    /// returned. The loop is never killed mid-instrument-call; the join
    /// waits out at most one read.
    pub fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!(poller = self.name, "poller joined"),
                Err(e) => {
                    // Thread panicked; report but never block process exit.
                    tracing::warn!(poller = self.name, ?e, "poller panicked during shutdown");
                }
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

/// Timekeeper: fires at the tick cadence, publishes the wall-clock display
/// value, and every few display seconds of an active run nudges the plot.
/// The plot cadence is a modulo comparison against run start, not a precise
/// timer.
pub(crate) fn spawn_timekeeper(
    shared: Arc<Shared>,
    cfg: PollingCfg,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Poller {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let period = Duration::from_millis(cfg.tick_ms.max(1));
    let tick_s = cfg.tick_ms.max(1) as f64 / 1000.0;
    let plot_every_s = cfg.plot_every_s.max(1) as f64;

    let handle = std::thread::spawn(move || {
        loop {
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            let state = shared.lock_cycle().snapshot();
            let _ = shared.events.send(SessionEvent::Tick {
                local_time: chrono::Local::now(),
                run_elapsed_s: state.run_elapsed_s,
            });
            if state.is_running && state.run_elapsed_s % plot_every_s < tick_s {
                let _ = shared.events.send(SessionEvent::PlotRefresh);
            }
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            clock.sleep(period);
        }
        tracing::trace!("timekeeper thread exiting cleanly");
    });
    Poller::launch("timekeeper", stop, handle)
}

/// Temperature poller: reads the thermometer, commits the reading, and
/// re-evaluates the cycle phase. Per-tick read failures are logged and the
/// tick is skipped; nothing propagates across the loop boundary.
pub(crate) fn spawn_temperature(
    shared: Arc<Shared>,
    mut thermometer: Box<dyn Thermometer + Send>,
    cfg: PollingCfg,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Poller {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let period = Duration::from_micros(period_us(cfg.temperature_hz));
    let timeout = Duration::from_millis(cfg.read_timeout_ms);

    let handle = std::thread::spawn(move || {
        loop {
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            // Only poll while a run is active. The blocking read happens
            // outside the lock; the lock is retaken to commit.
            let running = shared.lock_cycle().is_running();
            if running {
                match thermometer.read_temperature(timeout) {
                    Ok(t) if t.is_finite() => {
                        let outcome = shared.lock_cycle().on_temperature(t);
                        // Window rows go out before the phase move so a
                        // consumer reacting to Continue has already seen
                        // the row.
                        if let Some(row) = outcome.closed {
                            let _ = shared.events.send(SessionEvent::WindowClosed(row));
                        }
                        if outcome.phase_changed {
                            let _ = shared
                                .events
                                .send(SessionEvent::PhaseChanged(outcome.phase));
                        }
                    }
                    Ok(t) => {
                        tracing::warn!(value = t, "non-finite temperature reading dropped");
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %map_instrument_error(&*e),
                            "temperature read failed; skipping tick"
                        );
                    }
                }
            }
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            clock.sleep(period);
        }
        tracing::trace!("temperature poller thread exiting cleanly");
    });
    Poller::launch("temperature", stop, handle)
}

/// Signal poller: while the cycle is acquiring, reads the reference
/// voltmeter and the lock-in and appends one sample per tick. Outside the
/// acquiring phase it only paces.
pub(crate) fn spawn_signal(
    shared: Arc<Shared>,
    mut voltmeter: Box<dyn Voltmeter + Send>,
    mut lockin: Box<dyn LockIn + Send>,
    cfg: PollingCfg,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Poller {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let period = Duration::from_micros(period_us(cfg.signal_hz));
    let timeout = Duration::from_millis(cfg.read_timeout_ms);

    let handle = std::thread::spawn(move || {
        loop {
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            let acquiring = shared.lock_cycle().is_acquiring();
            if acquiring {
                let reading = voltmeter
                    .read_voltage(timeout)
                    .and_then(|vref| lockin.read_signal(timeout).map(|sig| (vref, sig)));
                match reading {
                    Ok((vref, signal)) if vref.is_finite() && signal.in_phase_v.is_finite() => {
                        // The phase may have moved during the reads;
                        // record_signal drops the sample in that case.
                        if !shared.lock_cycle().record_signal(signal, vref) {
                            tracing::trace!("sample arrived outside acquiring phase; dropped");
                        }
                    }
                    Ok((vref, signal)) => {
                        tracing::warn!(
                            reference_v = vref,
                            signal_v = signal.in_phase_v,
                            "non-finite signal reading dropped"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %map_instrument_error(&*e),
                            "signal read failed; skipping tick"
                        );
                    }
                }
            }
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            clock.sleep(period);
        }
        tracing::trace!("signal poller thread exiting cleanly");
    });
    Poller::launch("signal", stop, handle)
}
