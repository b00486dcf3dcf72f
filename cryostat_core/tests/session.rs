//! Session controller surface: builder requirements, configuration
//! locking, and start/stop idempotence.

use std::time::Duration;

use cryostat_core::mocks::{ConstLockIn, ConstVoltmeter, NoopThermometer};
use cryostat_core::{BuildError, Phase, PollingCfg, RunParameters, SampleInfo, Session};
use cryostat_traits::{Signal, Thermometer};

/// Thermometer pinned to one temperature.
struct ConstThermometer(f64);
impl Thermometer for ConstThermometer {
    fn read_temperature(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}

fn fast_polling() -> PollingCfg {
    PollingCfg {
        temperature_hz: 200,
        signal_hz: 200,
        tick_ms: 10,
        plot_every_s: 1,
        read_timeout_ms: 50,
    }
}

fn session_at(temperature_k: f64, params: RunParameters) -> Session {
    Session::builder()
        .with_thermometer(ConstThermometer(temperature_k))
        .with_voltmeter(ConstVoltmeter(1.0))
        .with_lockin(ConstLockIn(Signal::scalar(0.5)))
        .with_params(params)
        .with_polling(fast_polling())
        .with_sample_info(SampleInfo::default())
        .build()
        .expect("session build")
}

fn assert_is_build_err(err: &eyre::Report, expected: &str) {
    let be = err
        .downcast_ref::<BuildError>()
        .unwrap_or_else(|| panic!("expected BuildError, got {err}"));
    assert!(
        be.to_string().contains(expected),
        "expected {expected:?} in {be}"
    );
}

#[test]
fn builder_requires_all_three_ports() {
    let err = Session::builder().build().expect_err("no ports");
    assert_is_build_err(&err, "thermometer");

    let err = Session::builder()
        .with_thermometer(NoopThermometer)
        .build()
        .expect_err("missing voltmeter");
    assert_is_build_err(&err, "voltmeter");

    let err = Session::builder()
        .with_thermometer(NoopThermometer)
        .with_voltmeter(ConstVoltmeter(1.0))
        .build()
        .expect_err("missing lock-in");
    assert_is_build_err(&err, "lock-in");
}

#[test]
fn builder_rejects_invalid_parameters() {
    let err = Session::builder()
        .with_thermometer(NoopThermometer)
        .with_voltmeter(ConstVoltmeter(1.0))
        .with_lockin(ConstLockIn(Signal::scalar(0.5)))
        .with_params(RunParameters {
            setpoint_k: -4.2,
            ..RunParameters::default()
        })
        .build()
        .expect_err("negative setpoint");
    assert!(err.to_string().contains("setpoint"));
}

#[test]
fn configuration_is_locked_while_running() {
    let mut session = session_at(
        260.0,
        RunParameters {
            setpoint_k: 250.0,
            ..RunParameters::default()
        },
    );
    session.start().expect("start");
    assert!(session.state().is_running);

    let err = session
        .configure(RunParameters::default())
        .expect_err("configure mid-run");
    assert!(err.to_string().contains("locked"));

    session.stop();
    session
        .configure(RunParameters {
            setpoint_k: 200.0,
            ..RunParameters::default()
        })
        .expect("configure while idle");
    assert_eq!(session.params().setpoint_k, 200.0);
    session.shutdown();
}

#[test]
fn start_is_idempotent_and_stop_is_idempotent() {
    let mut session = session_at(
        260.0,
        RunParameters {
            setpoint_k: 250.0,
            ..RunParameters::default()
        },
    );
    session.start().expect("start");
    session.start().expect("second start is a no-op");
    assert!(session.state().is_running);

    session.stop();
    let first = session.state();
    session.stop();
    let second = session.state();
    assert_eq!(first.phase, Phase::Idle);
    assert_eq!(second.phase, Phase::Idle);
    assert_eq!(first.is_running, second.is_running);
    assert_eq!(first.run_elapsed_s, second.run_elapsed_s);
    session.shutdown();
}

#[test]
fn stop_keeps_the_result_log() {
    // Held at the setpoint with tiny dwell/window so rows accumulate fast.
    let mut session = session_at(
        250.0,
        RunParameters {
            setpoint_k: 250.0,
            temp_tolerance_k: 0.5,
            stable_ms: 20,
            integration_ms: 100,
        },
    );
    session.start().expect("start");
    let events = session.events();
    // Wait for the first completed window.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    let mut rows = 0;
    while std::time::Instant::now() < deadline && rows == 0 {
        if let Ok(cryostat_core::SessionEvent::WindowClosed(_)) =
            events.recv_timeout(Duration::from_millis(200))
        {
            rows += 1;
        }
    }
    assert_eq!(rows, 1, "expected a completed window");
    session.stop();
    assert_eq!(session.results().len(), 1);
    session.shutdown();
}

#[test]
fn start_publishes_phase_change() {
    let mut session = session_at(
        260.0,
        RunParameters {
            setpoint_k: 250.0,
            ..RunParameters::default()
        },
    );
    let events = session.events();
    session.start().expect("start");
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    let mut saw_phase = false;
    while std::time::Instant::now() < deadline && !saw_phase {
        if let Ok(cryostat_core::SessionEvent::PhaseChanged(phase)) =
            events.recv_timeout(Duration::from_millis(100))
        {
            assert_ne!(phase, Phase::Idle);
            saw_phase = true;
        }
    }
    assert!(saw_phase, "expected a PhaseChanged event after start");
    session.shutdown();
}

#[test]
fn rearm_is_rejected_outside_continue() {
    let mut session = session_at(
        260.0,
        RunParameters {
            setpoint_k: 250.0,
            ..RunParameters::default()
        },
    );
    let err = session
        .rearm(RunParameters::default())
        .expect_err("rearm while idle");
    assert!(err.to_string().contains("Continue"));
    session.shutdown();
}

#[test]
fn save_writes_header_even_with_no_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("empty_run.txt");
    let mut session = session_at(260.0, RunParameters::default());
    session.save(&path).expect("save");
    let text = std::fs::read_to_string(&path).expect("read back");
    assert!(text.contains("Sample Name: Sample"));
    assert!(text.contains("Time(s)"));
    session.shutdown();
}
