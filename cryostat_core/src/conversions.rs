//! `From` implementations bridging `cryostat_config` types to
//! `cryostat_core` types.
//!
//! Schema durations are float seconds; the core keeps all timing in integer
//! milliseconds.

use crate::config::{PollingCfg, RunParameters, SampleInfo};
use crate::util::secs_to_ms;

impl From<&cryostat_config::Program> for RunParameters {
    fn from(p: &cryostat_config::Program) -> Self {
        Self {
            setpoint_k: p.setpoint_k,
            temp_tolerance_k: p.temp_tolerance_k,
            stable_ms: secs_to_ms(p.stable_tolerance_s),
            integration_ms: secs_to_ms(p.integration_s),
        }
    }
}

impl From<&cryostat_config::Polling> for PollingCfg {
    fn from(p: &cryostat_config::Polling) -> Self {
        Self {
            temperature_hz: p.temperature_hz,
            signal_hz: p.signal_hz,
            tick_ms: p.tick_ms,
            plot_every_s: p.plot_every_s,
            read_timeout_ms: p.read_timeout_ms,
        }
    }
}

impl From<&cryostat_config::Sample> for SampleInfo {
    fn from(s: &cryostat_config::Sample) -> Self {
        Self {
            sample: s.name.clone(),
            user: s.user.clone(),
            material: s.material.clone(),
            reference_resistor_ohm: s.reference_resistor_ohm,
            amplification: s.amplification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_seconds_become_milliseconds() {
        let program = cryostat_config::Program {
            setpoint_k: 77.4,
            ramp_k_per_min: 1.0,
            integration_s: 10.0,
            temp_tolerance_k: 0.5,
            stable_tolerance_s: 2.5,
        };
        let params = RunParameters::from(&program);
        assert_eq!(params.stable_ms, 2_500);
        assert_eq!(params.integration_ms, 10_000);
        assert_eq!(params.setpoint_k, 77.4);
    }
}
