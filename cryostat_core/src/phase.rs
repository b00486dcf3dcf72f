//! Cycle phase reported after each temperature tick.

/// Current state of the acquisition cycle.
///
/// `Continue` is terminal for a window: the machine latches there until the
/// external controller re-arms it with the next setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No run in progress.
    Idle,
    /// Above the tolerance band; waiting for the cryostat to cool.
    Cooling,
    /// Below the tolerance band; waiting for the cryostat to heat.
    Heating,
    /// In-band; dwelling until the temperature is considered stable.
    Stabilizing,
    /// Averaging window open; samples are being collected.
    Acquiring,
    /// Window complete; waiting for the next setpoint.
    Continue,
}

impl Phase {
    /// True for every phase except `Idle`.
    pub fn is_active(self) -> bool {
        self != Phase::Idle
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Idle => "Idle",
            Phase::Cooling => "Cooling",
            Phase::Heating => "Heating",
            Phase::Stabilizing => "Stabilizing",
            Phase::Acquiring => "Acquiring",
            Phase::Continue => "Continue",
        };
        f.write_str(s)
    }
}
