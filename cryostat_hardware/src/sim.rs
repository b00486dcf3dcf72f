//! Simulated instrument backends for development and CLI runs without a
//! GPIB bus attached.
//!
//! The cryostat model relaxes exponentially toward a retargetable setpoint;
//! the meters return a level plus noise after a configurable read latency,
//! standing in for the real instruments' query round-trip.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use cryostat_traits::{LockIn, Signal, Thermometer, Voltmeter};
use rand::Rng;

struct CryostatState {
    target_k: f64,
    from_k: f64,
    retargeted_at: Instant,
    tau: Duration,
}

impl CryostatState {
    fn temperature_k(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.retargeted_at).as_secs_f64();
        let tau = self.tau.as_secs_f64().max(1e-9);
        self.target_k + (self.from_k - self.target_k) * (-elapsed / tau).exp()
    }
}

/// Shared simulated cryostat. Clones refer to the same cryostat, so the
/// run controller can hold one handle for retargeting while the simulated
/// thermometer holds another for reading.
#[derive(Clone)]
pub struct SimCryostat {
    state: Arc<Mutex<CryostatState>>,
}

impl SimCryostat {
    /// Cryostat resting at `initial_k`, approaching future setpoints with
    /// time constant `tau`.
    pub fn new(initial_k: f64, tau: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CryostatState {
                target_k: initial_k,
                from_k: initial_k,
                retargeted_at: Instant::now(),
                tau,
            })),
        }
    }

    /// Command a new setpoint; the approach restarts from the current
    /// temperature.
    pub fn set_target(&self, target_k: f64) {
        let mut state = self.lock();
        let now = Instant::now();
        state.from_k = state.temperature_k(now);
        state.retargeted_at = now;
        state.target_k = target_k;
        tracing::debug!(target_k, from_k = state.from_k, "sim cryostat retargeted");
    }

    pub fn temperature_k(&self) -> f64 {
        self.lock().temperature_k(Instant::now())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CryostatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Simulated thermometer reading the shared cryostat with additive noise.
pub struct SimThermometer {
    cryostat: SimCryostat,
    noise_k: f64,
    latency: Duration,
}

impl SimThermometer {
    pub fn new(cryostat: SimCryostat, noise_k: f64, latency: Duration) -> Self {
        Self {
            cryostat,
            noise_k,
            latency,
        }
    }
}

impl Thermometer for SimThermometer {
    fn read_temperature(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(self.latency);
        let noise = self.noise_k * rand::thread_rng().r#gen::<f64>();
        Ok(self.cryostat.temperature_k() + noise)
    }
}

/// Simulated reference voltmeter: a fixed level with symmetric noise.
pub struct SimVoltmeter {
    level_v: f64,
    noise_v: f64,
    latency: Duration,
}

impl SimVoltmeter {
    pub fn new(level_v: f64, noise_v: f64, latency: Duration) -> Self {
        Self {
            level_v,
            noise_v,
            latency,
        }
    }
}

impl Default for SimVoltmeter {
    fn default() -> Self {
        Self::new(1.0, 0.01, Duration::from_millis(50))
    }
}

impl Voltmeter for SimVoltmeter {
    fn read_voltage(
        &mut self,
        _timeout: Duration,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(self.latency);
        let jitter = self.noise_v * (rand::thread_rng().r#gen::<f64>() - 0.5);
        Ok(self.level_v + jitter)
    }
}

/// Simulated lock-in amplifier returning a noisy signal pair.
pub struct SimLockIn {
    signal: Signal,
    noise_v: f64,
    latency: Duration,
}

impl SimLockIn {
    pub fn new(signal: Signal, noise_v: f64, latency: Duration) -> Self {
        Self {
            signal,
            noise_v,
            latency,
        }
    }
}

impl Default for SimLockIn {
    fn default() -> Self {
        Self::new(Signal::new(0.5, 0.005), 0.05, Duration::from_millis(50))
    }
}

impl LockIn for SimLockIn {
    fn read_signal(
        &mut self,
        _timeout: Duration,
    ) -> Result<Signal, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(self.latency);
        let mut rng = rand::thread_rng();
        let jitter = |rng: &mut rand::rngs::ThreadRng| self.noise_v * (rng.r#gen::<f64>() - 0.5);
        Ok(Signal::new(
            self.signal.in_phase_v + jitter(&mut rng),
            self.signal.quadrature_v + jitter(&mut rng),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cryostat_relaxes_toward_target() {
        let cryo = SimCryostat::new(300.0, Duration::from_millis(20));
        cryo.set_target(250.0);
        std::thread::sleep(Duration::from_millis(200));
        let t = cryo.temperature_k();
        assert!(
            (t - 250.0).abs() < 1.0,
            "expected near 250 K after 10 tau, got {t}"
        );
    }

    #[test]
    fn retarget_rebases_from_current_temperature() {
        let cryo = SimCryostat::new(300.0, Duration::from_secs(1000));
        cryo.set_target(4.2);
        // With a huge tau the temperature has barely moved, so a second
        // retarget must depart from ~300 K, not from 4.2 K.
        cryo.set_target(77.0);
        let t = cryo.temperature_k();
        assert!(t > 250.0, "approach must restart from current temp, got {t}");
    }

    #[test]
    fn thermometer_reads_cryostat_with_bounded_noise() {
        let cryo = SimCryostat::new(250.0, Duration::from_secs(1));
        let mut thermometer =
            SimThermometer::new(cryo, 0.05, Duration::from_millis(1));
        let t = thermometer
            .read_temperature(Duration::from_millis(10))
            .expect("read");
        assert!((250.0..=250.1).contains(&t), "got {t}");
    }

    #[test]
    fn lockin_returns_signal_pair() {
        let mut lockin = SimLockIn::new(Signal::new(0.5, 0.0), 0.0, Duration::ZERO);
        let s = lockin.read_signal(Duration::from_millis(10)).expect("read");
        assert_eq!(s.in_phase_v, 0.5);
        assert_eq!(s.quadrature_v, 0.0);
    }
}
