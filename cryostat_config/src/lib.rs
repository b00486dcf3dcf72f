#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and program-entry parsing for the resistivity controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `RawProgram` resolves free-text numeric entries from the presentation
//!   layer field-by-field: a non-numeric entry falls back to its documented
//!   default and yields a warning instead of aborting configuration.
use serde::Deserialize;

/// Default temperature setpoint when the entry is missing or non-numeric (K).
pub const DEFAULT_SETPOINT_K: f64 = 300.0;
/// Default ramp rate (K/min). Informational only; no ramp is generated.
pub const DEFAULT_RAMP_K_PER_MIN: f64 = 1.0;
/// Default acquisition window length (s).
pub const DEFAULT_INTEGRATION_S: f64 = 10.0;
/// Default half-width of the in-tolerance band around the setpoint (K).
pub const DEFAULT_TEMP_TOLERANCE_K: f64 = 0.5;
/// Default dwell required inside the tolerance band before acquiring (s).
pub const DEFAULT_STABLE_TOLERANCE_S: f64 = 2.0;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Program {
    /// Target temperature for the cycle (K).
    pub setpoint_k: f64,
    /// Requested ramp rate (K/min); recorded but never acted on.
    pub ramp_k_per_min: f64,
    /// Length of the averaging window (s).
    pub integration_s: f64,
    /// `|T - setpoint| <= temp_tolerance_k` counts as in-band.
    pub temp_tolerance_k: f64,
    /// Time the temperature must stay in-band before acquisition starts (s).
    pub stable_tolerance_s: f64,
}

impl Default for Program {
    fn default() -> Self {
        Self {
            setpoint_k: DEFAULT_SETPOINT_K,
            ramp_k_per_min: DEFAULT_RAMP_K_PER_MIN,
            integration_s: DEFAULT_INTEGRATION_S,
            temp_tolerance_k: DEFAULT_TEMP_TOLERANCE_K,
            stable_tolerance_s: DEFAULT_STABLE_TOLERANCE_S,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Polling {
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

impl Default for Polling {
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

/// Run metadata written into the result-file header.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Sample {
    pub file: String,
    pub name: String,
    pub user: String,
    pub material: String,
    /// Reference resistor in series with the sample (Ohm).
    pub reference_resistor_ohm: f64,
    /// Preamplifier gain applied to the sample signal.
    pub amplification: f64,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            file: "Sample_001.txt".to_string(),
            name: "Sample".to_string(),
            user: "Username".to_string(),
            material: "Material".to_string(),
            reference_resistor_ohm: 1.0e4,
            amplification: 1.0e2,
        }
    }
}

/// GPIB addressing for the physical instruments. Consumed by whichever
/// backend actually opens the ports; the core never sees these.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Instruments {
    pub thermometer_addr: u8,
    pub thermometer_channel: String,
    pub voltmeter_addr: u8,
    pub lockin_addr: u8,
}

impl Default for Instruments {
    fn default() -> Self {
        Self {
            thermometer_addr: 15,
            thermometer_channel: "B".to_string(),
            voltmeter_addr: 9,
            lockin_addr: 8,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Parameters for the simulated cryostat/instruments used in development
/// and the CLI's default backend.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Simulation {
    /// Temperature the simulated cryostat starts at (K).
    pub initial_k: f64,
    /// Exponential approach time constant toward the setpoint (s).
    pub tau_s: f64,
    /// Peak-to-peak thermometer noise (K).
    pub noise_k: f64,
    /// Simulated thermometer read latency (ms).
    pub thermometer_latency_ms: u64,
    /// Simulated lock-in/voltmeter read latency (ms).
    pub lockin_latency_ms: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            initial_k: 300.0,
            tau_s: 5.0,
            noise_k: 0.05,
            thermometer_latency_ms: 200,
            lockin_latency_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub program: Program,
    pub polling: Polling,
    pub sample: Sample,
    pub instruments: Instruments,
    pub logging: Logging,
    pub simulation: Simulation,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        self.program.validate()?;

        // Polling
        if self.polling.temperature_hz == 0 {
            eyre::bail!("polling.temperature_hz must be > 0");
        }
        if self.polling.signal_hz == 0 {
            eyre::bail!("polling.signal_hz must be > 0");
        }
        if self.polling.tick_ms == 0 {
            eyre::bail!("polling.tick_ms must be >= 1");
        }
        if self.polling.plot_every_s == 0 {
            eyre::bail!("polling.plot_every_s must be >= 1");
        }
        if self.polling.read_timeout_ms == 0 {
            eyre::bail!("polling.read_timeout_ms must be >= 1");
        }

        // Sample / conversion constants
        if !(self.sample.reference_resistor_ohm.is_finite()
            && self.sample.reference_resistor_ohm > 0.0)
        {
            eyre::bail!("sample.reference_resistor_ohm must be finite and > 0");
        }
        if !(self.sample.amplification.is_finite() && self.sample.amplification != 0.0) {
            eyre::bail!("sample.amplification must be finite and non-zero");
        }
        if self.sample.file.is_empty() {
            eyre::bail!("sample.file must not be empty");
        }

        // Simulation
        if !(self.simulation.tau_s.is_finite() && self.simulation.tau_s > 0.0) {
            eyre::bail!("simulation.tau_s must be finite and > 0");
        }
        if self.simulation.noise_k.is_sign_negative() {
            eyre::bail!("simulation.noise_k must be >= 0");
        }

        Ok(())
    }
}

impl Program {
    pub fn validate(&self) -> eyre::Result<()> {
        if !(self.setpoint_k.is_finite() && self.setpoint_k > 0.0) {
            eyre::bail!("program.setpoint_k must be finite and > 0");
        }
        if !(self.temp_tolerance_k.is_finite() && self.temp_tolerance_k > 0.0) {
            eyre::bail!("program.temp_tolerance_k must be finite and > 0");
        }
        if !(self.stable_tolerance_s.is_finite() && self.stable_tolerance_s >= 0.0) {
            eyre::bail!("program.stable_tolerance_s must be finite and >= 0");
        }
        if self.stable_tolerance_s > 3600.0 {
            eyre::bail!("program.stable_tolerance_s is unreasonably large (>1h)");
        }
        if !(self.integration_s.is_finite() && self.integration_s > 0.0) {
            eyre::bail!("program.integration_s must be finite and > 0");
        }
        if self.integration_s > 24.0 * 3600.0 {
            eyre::bail!("program.integration_s is unreasonably large (>24h)");
        }
        if !self.ramp_k_per_min.is_finite() {
            eyre::bail!("program.ramp_k_per_min must be finite");
        }
        Ok(())
    }
}

/// A rejected free-text entry and the default substituted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryWarning {
    pub field: &'static str,
    pub entry: String,
    pub default: f64,
}

impl std::fmt::Display for EntryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "non-numeric {} entry {:?}; using default {}",
            self.field, self.entry, self.default
        )
    }
}

/// Free-text program entries as typed into the presentation layer.
///
/// `resolve()` never fails: each entry that does not parse as a number is
/// replaced by its documented default and reported as an [`EntryWarning`].
#[derive(Debug, Clone, Default)]
pub struct RawProgram {
    pub setpoint: String,
    pub ramp: String,
    pub integration: String,
    pub temp_tolerance: String,
    pub stable_tolerance: String,
}

impl RawProgram {
    pub fn resolve(&self) -> (Program, Vec<EntryWarning>) {
        let mut warnings = Vec::new();
        let mut field = |name: &'static str, entry: &str, default: f64| -> f64 {
            match entry.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    warnings.push(EntryWarning {
                        field: name,
                        entry: entry.to_string(),
                        default,
                    });
                    default
                }
            }
        };
        let program = Program {
            setpoint_k: field("setpoint", &self.setpoint, DEFAULT_SETPOINT_K),
            ramp_k_per_min: field("ramp", &self.ramp, DEFAULT_RAMP_K_PER_MIN),
            integration_s: field("integration", &self.integration, DEFAULT_INTEGRATION_S),
            temp_tolerance_k: field(
                "temp_tolerance",
                &self.temp_tolerance,
                DEFAULT_TEMP_TOLERANCE_K,
            ),
            stable_tolerance_s: field(
                "stable_tolerance",
                &self.stable_tolerance,
                DEFAULT_STABLE_TOLERANCE_S,
            ),
        };
        (program, warnings)
    }
}
