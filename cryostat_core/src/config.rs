//! Runtime configuration types for the acquisition cycle.
//!
//! These are the structs the core operates on. They are separate from the
//! TOML-deserialized schema in `cryostat_config`; see `conversions` for the
//! bridges.

use crate::error::ControllerError;

/// Parameters of one temperature cycle. Immutable while a run is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParameters {
    /// Target temperature (K).
    pub setpoint_k: f64,
    /// Half-width of the in-tolerance band around the setpoint (K).
    pub temp_tolerance_k: f64,
    /// Dwell required inside the band before acquisition starts (ms).
    pub stable_ms: u64,
    /// Length of the averaging window (ms).
    pub integration_ms: u64,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            setpoint_k: 300.0,
            temp_tolerance_k: 0.5,
            stable_ms: 2_000,
            integration_ms: 10_000,
        }
    }
}

impl RunParameters {
    /// Range checks applied on `configure`, `start`, and `rearm`.
    pub fn validate(&self) -> Result<(), ControllerError> {
        if !(self.setpoint_k.is_finite() && self.setpoint_k > 0.0) {
            return Err(ControllerError::Config(
                "setpoint must be finite and > 0 K".into(),
            ));
        }
        if !(self.temp_tolerance_k.is_finite() && self.temp_tolerance_k > 0.0) {
            return Err(ControllerError::Config(
                "temperature tolerance must be finite and > 0 K".into(),
            ));
        }
        if self.integration_ms == 0 {
            return Err(ControllerError::Config(
                "integration time must be >= 1 ms".into(),
            ));
        }
        Ok(())
    }
}

/// Cadences for the three polling loops.
#[derive(Debug, Clone, Copy)]
pub struct PollingCfg {
    /// Temperature poll rate (Hz).
    pub temperature_hz: u32,
    /// Signal/reference poll rate (Hz).
    pub signal_hz: u32,
    /// Timekeeper tick period (ms).
    pub tick_ms: u64,
    /// Plot-refresh notification cadence in display seconds.
    pub plot_every_s: u64,
    /// Max instrument wait per read (ms).
    pub read_timeout_ms: u64,
}

impl Default for PollingCfg {
    fn default() -> Self {
        Self {
            temperature_hz: 5,
            signal_hz: 1,
            tick_ms: 1000,
            plot_every_s: 5,
            read_timeout_ms: 2000,
        }
    }
}

/// Run metadata for the result-file header, plus the conversion constants.
#[derive(Debug, Clone)]
pub struct SampleInfo {
    pub sample: String,
    pub user: String,
    pub material: String,
    /// Reference resistor in series with the sample (Ohm).
    pub reference_resistor_ohm: f64,
    /// Preamplifier gain applied to the sample signal.
    pub amplification: f64,
}

impl Default for SampleInfo {
    fn default() -> Self {
        Self {
            sample: "Sample".into(),
            user: "Username".into(),
            material: "Material".into(),
            reference_resistor_ohm: 1.0e4,
            amplification: 1.0e2,
        }
    }
}
