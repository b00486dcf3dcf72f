//! Property tests: averaging round-trip, tolerance-excursion resets, and
//! stop idempotence under arbitrary inputs.

use std::sync::Arc;

use cryostat_core::mocks::ManualClock;
use cryostat_core::{
    CycleCore, Phase, ResistanceScaling, RunParameters, Sample, SampleBuffer,
};
use cryostat_traits::Signal;
use proptest::prelude::*;

prop_compose! {
    fn sample_strategy()(
        t in 1.0f64..400.0,
        x in -1.0f64..1.0,
        y in -1.0f64..1.0,
        vref in 0.1f64..2.0,
    ) -> (f64, f64, f64, f64) {
        (t, x, y, vref)
    }
}

proptest! {
    #[test]
    fn reduce_matches_arithmetic_mean(raw in prop::collection::vec(sample_strategy(), 1..200)) {
        let mut buf = SampleBuffer::new();
        buf.open();
        for (i, &(t, x, y, vref)) in raw.iter().enumerate() {
            buf.push(Sample {
                elapsed_ms: i as u64 * 100,
                temperature_k: t,
                signal: Signal::new(x, y),
                reference_v: vref,
            });
        }
        let n = raw.len() as f64;
        let rec = buf.reduce(12_345).expect("non-empty buffer reduces");

        let mean = |f: fn(&(f64, f64, f64, f64)) -> f64| raw.iter().map(f).sum::<f64>() / n;
        prop_assert!((rec.temperature_k - mean(|s| s.0)).abs() < 1e-9);
        prop_assert!((rec.signal.in_phase_v - mean(|s| s.1)).abs() < 1e-9);
        prop_assert!((rec.signal.quadrature_v - mean(|s| s.2)).abs() < 1e-9);
        prop_assert!((rec.reference_v - mean(|s| s.3)).abs() < 1e-9);
        prop_assert_eq!(rec.elapsed_ms, 12_345);
    }

    #[test]
    fn out_of_band_always_resets_trackers(
        setpoint in 4.0f64..350.0,
        tolerance in 0.01f64..5.0,
        offset in 0.0f64..100.0,
        above in any::<bool>(),
    ) {
        // Any reading strictly outside the band must land in Cooling or
        // Heating with both elapsed trackers at zero.
        let params = RunParameters {
            setpoint_k: setpoint,
            temp_tolerance_k: tolerance,
            stable_ms: 0,
            integration_ms: 10_000,
        };
        let clock = ManualClock::new();
        let mut core = CycleCore::new(
            params,
            ResistanceScaling::default(),
            Arc::new(clock.clone()),
        );
        core.begin();

        // Work the machine into Acquiring first so both trackers are live.
        clock.advance_ms(1_000);
        core.on_temperature(setpoint);
        clock.advance_ms(1_000);
        core.on_temperature(setpoint);
        prop_assert_eq!(core.phase(), Phase::Acquiring);

        let excursion = tolerance + 0.01 + offset;
        let t = if above { setpoint + excursion } else { setpoint - excursion };
        clock.advance_ms(1_000);
        let phase = core.on_temperature(t).phase;

        prop_assert!(phase == Phase::Cooling || phase == Phase::Heating);
        prop_assert_eq!(phase, if above { Phase::Cooling } else { Phase::Heating });
        let state = core.snapshot();
        prop_assert_eq!(state.dwell_elapsed_s, 0.0);
        prop_assert_eq!(state.acquire_elapsed_s, 0.0);
    }

    #[test]
    fn halt_is_idempotent(setpoint in 4.0f64..350.0, readings in prop::collection::vec(4.0f64..350.0, 0..20)) {
        let params = RunParameters {
            setpoint_k: setpoint,
            ..RunParameters::default()
        };
        let clock = ManualClock::new();
        let mut core = CycleCore::new(
            params,
            ResistanceScaling::default(),
            Arc::new(clock.clone()),
        );
        core.begin();
        for t in readings {
            clock.advance_ms(500);
            core.on_temperature(t);
        }

        core.halt();
        let first = core.snapshot();
        core.halt();
        let second = core.snapshot();

        prop_assert_eq!(first.phase, Phase::Idle);
        prop_assert_eq!(second.phase, Phase::Idle);
        prop_assert_eq!(first.is_running, second.is_running);
        prop_assert_eq!(first.dwell_elapsed_s, second.dwell_elapsed_s);
        prop_assert_eq!(first.acquire_elapsed_s, second.acquire_elapsed_s);
        prop_assert_eq!(first.run_elapsed_s, second.run_elapsed_s);
    }
}
