//! Test and helper mocks for cryostat_core.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cryostat_traits::clock::Clock;
use cryostat_traits::{LockIn, Signal, Thermometer, Voltmeter};

/// A thermometer that always errors on read; useful when driving the cycle
/// directly via `on_temperature`.
pub struct NoopThermometer;

impl Thermometer for NoopThermometer {
    fn read_temperature(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop thermometer")))
    }
}

/// A voltmeter that returns a constant reading.
pub struct ConstVoltmeter(pub f64);

impl Voltmeter for ConstVoltmeter {
    fn read_voltage(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}

/// A lock-in that returns a constant signal pair.
pub struct ConstLockIn(pub Signal);

impl LockIn for ConstLockIn {
    fn read_signal(
        &mut self,
        _timeout: Duration,
    ) -> Result<Signal, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}

/// Deterministic clock whose time is advanced manually. `sleep` advances
/// virtual time instead of blocking, so paced loops spin freely in tests.
#[derive(Clone)]
pub struct ManualClock {
    origin: Instant,
    ms: Arc<AtomicU64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.ms.load(Ordering::Relaxed))
    }

    fn sleep(&self, d: Duration) {
        let add = d.as_millis() as u64;
        if add > 0 {
            self.advance_ms(add);
        }
    }
}
