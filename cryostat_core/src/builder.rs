//! Builder assembling a [`Session`](crate::session::Session) from its
//! instrument ports and configuration.

use std::sync::{Arc, Mutex};

use cryostat_traits::clock::{Clock, MonotonicClock};
use cryostat_traits::{LockIn, Thermometer, Voltmeter};

use crate::config::{PollingCfg, RunParameters, SampleInfo};
use crate::cycle::CycleCore;
use crate::error::{BuildError, Result};
use crate::poller::{self, Shared};
use crate::results::ResistanceScaling;
use crate::session::Session;

pub struct SessionBuilder {
    thermometer: Option<Box<dyn Thermometer + Send>>,
    voltmeter: Option<Box<dyn Voltmeter + Send>>,
    lockin: Option<Box<dyn LockIn + Send>>,
    params: RunParameters,
    polling: PollingCfg,
    info: SampleInfo,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            thermometer: None,
            voltmeter: None,
            lockin: None,
            params: RunParameters::default(),
            polling: PollingCfg::default(),
            info: SampleInfo::default(),
            clock: None,
        }
    }

    pub fn with_thermometer(mut self, t: impl Thermometer + Send + 'static) -> Self {
        self.thermometer = Some(Box::new(t));
        self
    }

    pub fn with_voltmeter(mut self, v: impl Voltmeter + Send + 'static) -> Self {
        self.voltmeter = Some(Box::new(v));
        self
    }

    pub fn with_lockin(mut self, l: impl LockIn + Send + 'static) -> Self {
        self.lockin = Some(Box::new(l));
        self
    }

    pub fn with_params(mut self, params: RunParameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_polling(mut self, polling: PollingCfg) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_sample_info(mut self, info: SampleInfo) -> Self {
        self.info = info;
        self
    }

    /// Override the clock, mainly for deterministic tests.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Validate the configuration, spin up the cycle core and the three
    /// pollers, and hand back the assembled session.
    pub fn build(self) -> Result<Session> {
        let thermometer = self
            .thermometer
            .ok_or_else(|| eyre::Report::new(BuildError::MissingThermometer))?;
        let voltmeter = self
            .voltmeter
            .ok_or_else(|| eyre::Report::new(BuildError::MissingVoltmeter))?;
        let lockin = self
            .lockin
            .ok_or_else(|| eyre::Report::new(BuildError::MissingLockIn))?;
        self.params.validate().map_err(eyre::Report::new)?;
        if self.polling.temperature_hz == 0 || self.polling.signal_hz == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "poll rates must be > 0",
            )));
        }
        if !(self.info.amplification.is_finite() && self.info.amplification != 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "amplification must be finite and non-zero",
            )));
        }
        if !(self.info.reference_resistor_ohm.is_finite() && self.info.reference_resistor_ohm > 0.0)
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "reference resistor must be finite and > 0",
            )));
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let scaling = ResistanceScaling {
            reference_resistor_ohm: self.info.reference_resistor_ohm,
            amplification: self.info.amplification,
        };
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let shared = Arc::new(Shared {
            cycle: Mutex::new(CycleCore::new(self.params, scaling, clock.clone())),
            events: events_tx,
        });

        let pollers = vec![
            poller::spawn_timekeeper(shared.clone(), self.polling, clock.clone()),
            poller::spawn_temperature(shared.clone(), thermometer, self.polling, clock.clone()),
            poller::spawn_signal(shared.clone(), voltmeter, lockin, self.polling, clock),
        ];

        Ok(Session::from_parts(shared, events_rx, pollers, self.info))
    }
}
