//! Run execution: session assembly over the simulated backends, the event
//! loop, and setpoint stepping.
//!
//! The CLI doubles as the external temperature controller: it commands the
//! simulated cryostat to each setpoint as it arms the cycle, and provides
//! the next setpoint whenever the cycle parks in `Continue`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cryostat_core::logfile::ResultWriter;
use cryostat_core::util::secs_to_ms;
use cryostat_core::{
    ControllerError, Phase, PollingCfg, RunParameters, SampleInfo, Session, SessionEvent,
};
use cryostat_hardware::{SimCryostat, SimLockIn, SimThermometer, SimVoltmeter};
use cryostat_traits::Signal;

pub struct RunOptions {
    pub setpoints: Vec<f64>,
    pub integration_s: Option<f64>,
    pub stable_s: Option<f64>,
    pub temp_tol: Option<f64>,
    pub out: Option<PathBuf>,
    pub sample: Option<String>,
    pub user: Option<String>,
    pub material: Option<String>,
    pub max_run_s: f64,
    pub progress: bool,
}

pub struct RunOutcome {
    pub windows: usize,
    pub out_path: PathBuf,
    pub interrupted: bool,
}

pub fn run_measurement(
    cfg: &cryostat_config::Config,
    opts: RunOptions,
    shutdown: Arc<AtomicBool>,
) -> cryostat_core::Result<RunOutcome> {
    // Runtime parameters: config first, CLI overrides on top.
    let mut params = RunParameters::from(&cfg.program);
    if let Some(s) = opts.integration_s {
        params.integration_ms = secs_to_ms(s);
    }
    if let Some(s) = opts.stable_s {
        params.stable_ms = secs_to_ms(s);
    }
    if let Some(k) = opts.temp_tol {
        params.temp_tolerance_k = k;
    }
    params.setpoint_k = opts.setpoints[0];
    params.validate().map_err(eyre::Report::new)?;

    let mut info = SampleInfo::from(&cfg.sample);
    if let Some(s) = &opts.sample {
        info.sample = s.clone();
    }
    if let Some(u) = &opts.user {
        info.user = u.clone();
    }
    if let Some(m) = &opts.material {
        info.material = m.clone();
    }
    let out_path = opts
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.sample.file));

    // Simulated bench.
    let sim = &cfg.simulation;
    let cryostat = SimCryostat::new(sim.initial_k, Duration::from_secs_f64(sim.tau_s));
    let thermometer = SimThermometer::new(
        cryostat.clone(),
        sim.noise_k,
        Duration::from_millis(sim.thermometer_latency_ms),
    );
    let voltmeter = SimVoltmeter::new(1.0, 0.01, Duration::from_millis(sim.lockin_latency_ms));
    let lockin = SimLockIn::new(
        Signal::new(0.5, 0.005),
        0.02,
        Duration::from_millis(sim.lockin_latency_ms),
    );

    let mut session = Session::builder()
        .with_thermometer(thermometer)
        .with_voltmeter(voltmeter)
        .with_lockin(lockin)
        .with_params(params)
        .with_polling(PollingCfg::from(&cfg.polling))
        .with_sample_info(info.clone())
        .build()?;

    let writer = ResultWriter::create(&out_path, &info)?;
    let events = session.events();

    cryostat.set_target(params.setpoint_k);
    session.start()?;
    tracing::info!(
        setpoint_k = params.setpoint_k,
        setpoints = opts.setpoints.len(),
        ramp_k_per_min = cfg.program.ramp_k_per_min,
        out = %out_path.display(),
        "measurement start"
    );

    let started = Instant::now();
    let mut next_idx = 1usize;
    let mut windows = 0usize;
    let mut interrupted = false;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!("interrupt received; stopping run");
            interrupted = true;
            session.stop();
            break;
        }
        if opts.max_run_s > 0.0 && started.elapsed().as_secs_f64() > opts.max_run_s {
            session.stop();
            session.shutdown();
            return Err(eyre::Report::new(ControllerError::State(
                "max run time exceeded".into(),
            )));
        }
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(SessionEvent::WindowClosed(row)) => {
                writer.append_row(&row)?;
                windows += 1;
                if opts.progress {
                    eprintln!(
                        "window {windows}: T = {:.3} K, R = {:.3} Ohm",
                        row.record.temperature_k, row.resistance_ohm
                    );
                }
            }
            Ok(SessionEvent::PhaseChanged(Phase::Continue)) => {
                if next_idx < opts.setpoints.len() {
                    params.setpoint_k = opts.setpoints[next_idx];
                    next_idx += 1;
                    cryostat.set_target(params.setpoint_k);
                    session.rearm(params)?;
                    tracing::info!(setpoint_k = params.setpoint_k, "advancing to next setpoint");
                } else {
                    session.stop();
                    break;
                }
            }
            Ok(SessionEvent::PhaseChanged(phase)) => {
                if opts.progress {
                    let state = session.state();
                    eprintln!("phase: {phase} (T = {:.3} K)", state.temperature_k);
                }
            }
            Ok(SessionEvent::Tick { .. } | SessionEvent::PlotRefresh) => {}
            // Timeout: loop back around to re-check the shutdown flag.
            Err(_) => {}
        }
    }

    session.shutdown();
    tracing::info!(windows, interrupted, "measurement finished");
    Ok(RunOutcome {
        windows,
        out_path,
        interrupted,
    })
}

/// One read from each simulated port; prints what came back and the GPIB
/// addressing a real bench would use.
pub fn self_check(cfg: &cryostat_config::Config) -> cryostat_core::Result<()> {
    use cryostat_hardware::scpi;
    use cryostat_traits::{LockIn, Thermometer, Voltmeter};

    println!(
        "gpib map: thermometer {} ({}), voltmeter {} ({}), lock-in {}",
        scpi::gpib_resource(cfg.instruments.thermometer_addr),
        scpi::kelvin_query(&cfg.instruments.thermometer_channel),
        scpi::gpib_resource(cfg.instruments.voltmeter_addr),
        scpi::ACV_MEASURE,
        scpi::gpib_resource(cfg.instruments.lockin_addr),
    );

    let sim = &cfg.simulation;
    let timeout = Duration::from_millis(cfg.polling.read_timeout_ms);

    let cryostat = SimCryostat::new(sim.initial_k, Duration::from_secs_f64(sim.tau_s));
    let mut thermometer = SimThermometer::new(cryostat, sim.noise_k, Duration::from_millis(1));
    let t = thermometer
        .read_temperature(timeout)
        .map_err(|e| eyre::eyre!("thermometer: {e}"))?;
    println!("thermometer ok: {t:.3} K");

    let mut voltmeter = SimVoltmeter::default();
    let v = voltmeter
        .read_voltage(timeout)
        .map_err(|e| eyre::eyre!("voltmeter: {e}"))?;
    println!("voltmeter ok: {v:.4} V");

    let mut lockin = SimLockIn::default();
    let s = lockin
        .read_signal(timeout)
        .map_err(|e| eyre::eyre!("lock-in: {e}"))?;
    println!("lock-in ok: {:.4} V / {:.4} V", s.in_phase_v, s.quadrature_v);
    Ok(())
}
