//! Reduced measurements and the derived sample resistance.

use crate::sample::AveragedRecord;

/// Constants converting a lock-in voltage pair into a sample resistance.
#[derive(Debug, Clone, Copy)]
pub struct ResistanceScaling {
    pub reference_resistor_ohm: f64,
    pub amplification: f64,
}

impl Default for ResistanceScaling {
    fn default() -> Self {
        Self {
            reference_resistor_ohm: 1.0e4,
            amplification: 1.0e2,
        }
    }
}

impl ResistanceScaling {
    /// R_sample = Vsig / amplification * R_ref / Vref.
    ///
    /// A vanishing or non-finite reference voltage yields NaN (logged, never
    /// fatal): the row is still recorded so the time series stays contiguous.
    pub fn resistance_ohm(&self, record: &AveragedRecord) -> f64 {
        let r = record.signal.in_phase_v / self.amplification * self.reference_resistor_ohm
            / record.reference_v;
        if r.is_finite() {
            r
        } else {
            tracing::warn!(
                reference_v = record.reference_v,
                signal_v = record.signal.in_phase_v,
                "non-finite resistance; recording NaN"
            );
            f64::NAN
        }
    }
}

/// One completed averaging window with its derived resistance.
#[derive(Debug, Clone, Copy)]
pub struct ResultRow {
    pub record: AveragedRecord,
    pub resistance_ohm: f64,
}

/// Append-only sequence of completed windows for the lifetime of a run.
/// Survives `stop()`; discarded only when the session is torn down.
#[derive(Debug, Default)]
pub struct ResultLog {
    rows: Vec<ResultRow>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the resistance and append one row, returning a copy of it.
    pub fn push(&mut self, record: AveragedRecord, scaling: &ResistanceScaling) -> ResultRow {
        let row = ResultRow {
            record,
            resistance_ohm: scaling.resistance_ohm(&record),
        };
        self.rows.push(row);
        row
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&ResultRow> {
        self.rows.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryostat_traits::Signal;

    fn record(signal_v: f64, reference_v: f64) -> AveragedRecord {
        AveragedRecord {
            elapsed_ms: 0,
            temperature_k: 250.0,
            signal: Signal::scalar(signal_v),
            reference_v,
        }
    }

    #[test]
    fn resistance_follows_reference_divider() {
        // Vsig 0.5 V through gain 100 across Rr 10 kOhm at Vref 1 V -> 50 Ohm.
        let scaling = ResistanceScaling::default();
        let r = scaling.resistance_ohm(&record(0.5, 1.0));
        assert!((r - 50.0).abs() < 1e-9);
    }

    #[test]
    fn zero_reference_voltage_records_nan() {
        let scaling = ResistanceScaling::default();
        assert!(scaling.resistance_ohm(&record(0.5, 0.0)).is_nan());
    }

    #[test]
    fn log_appends_and_keeps_order() {
        let scaling = ResistanceScaling::default();
        let mut log = ResultLog::new();
        log.push(record(0.1, 1.0), &scaling);
        log.push(record(0.2, 1.0), &scaling);
        assert_eq!(log.len(), 2);
        assert!(log.rows()[0].resistance_ohm < log.rows()[1].resistance_ohm);
    }
}
