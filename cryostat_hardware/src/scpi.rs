//! GPIB command formatting and reply parsing for the supported instruments.
//!
//! Pure string work: the controller side of each exchange and the parsing of
//! the numeric replies. Opening and owning the bus connection is the
//! caller's concern.

use crate::error::InstrumentError;

/// Identification query understood by every instrument on the bus.
pub const IDENTIFY: &str = "*IDN?";

/// HP 3478A AC-voltage program string:
/// F2 (AC volts), RA (autorange), Z1 (autozero on), N4 (4.5 digits).
/// Sending it triggers one measurement and the meter replies with the value.
pub const ACV_MEASURE: &str = "F2RAZ1N4";

/// VISA resource name for a device at a GPIB primary address.
pub fn gpib_resource(address: u8) -> String {
    format!("GPIB0::{address}::INSTR")
}

/// Lakeshore 331 Kelvin-reading query for an input channel ("A" or "B").
pub fn kelvin_query(channel: &str) -> String {
    format!("KRDG? {channel}")
}

/// Parse a plain numeric reply. Instruments answer queries with a single
/// ASCII float; anything else is a malformed reply, reported as such so the
/// poller can drop the tick instead of propagating garbage.
pub fn parse_reply(raw: &str) -> Result<f64, InstrumentError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InstrumentError::MalformedReply(trimmed.to_string()))
}
