//! Maps `Box<dyn Error>` from the instrument trait boundaries to typed
//! `ControllerError`.
//!
//! The traits in `cryostat_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for
//! `cryostat_hardware::InstrumentError` downcasting.

use crate::error::ControllerError;

/// Map a trait-boundary error to a typed `ControllerError`.
///
/// Attempts to downcast known instrument error types first, then falls back
/// to string-based heuristics.
pub fn map_instrument_error(e: &(dyn std::error::Error + 'static)) -> ControllerError {
    #[cfg(feature = "hardware-errors")]
    {
        use cryostat_hardware::error::InstrumentError;
        if let Some(hw) = e.downcast_ref::<InstrumentError>() {
            return match hw {
                InstrumentError::Timeout => ControllerError::Timeout,
                other => ControllerError::Instrument(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ControllerError::Timeout
    } else {
        ControllerError::Instrument(s)
    }
}
