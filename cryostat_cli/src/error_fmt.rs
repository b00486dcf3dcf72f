//! Human-readable error descriptions and structured JSON error formatting.

use cryostat_core::{BuildError, ControllerError};

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingThermometer => {
                "What happened: No thermometer was provided to the session.\nLikely causes: The temperature port failed to initialize or was not wired into the builder.\nHow to fix: Ensure the thermometer backend is created successfully and passed via with_thermometer(...).".to_string()
            }
            BuildError::MissingVoltmeter => {
                "What happened: No reference voltmeter was provided to the session.\nLikely causes: The voltmeter port failed to initialize or was not wired into the builder.\nHow to fix: Ensure the voltmeter backend is created successfully and passed via with_voltmeter(...).".to_string()
            }
            BuildError::MissingLockIn => {
                "What happened: No lock-in was provided to the session.\nLikely causes: The signal port failed to initialize or was not wired into the builder.\nHow to fix: Ensure the lock-in backend is created successfully and passed via with_lockin(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControllerError>() {
        return match ce {
            ControllerError::Timeout => {
                "What happened: An instrument read timed out.\nLikely causes: Port unplugged, bus hung, or polling.read_timeout_ms too low.\nHow to fix: Check the instrument connections and consider raising polling.read_timeout_ms in the config.".to_string()
            }
            ControllerError::Config(msg) => format!(
                "What happened: Configuration was rejected ({msg}).\nLikely causes: Out-of-range setpoint, tolerance, or integration time.\nHow to fix: Correct the value and rerun; defaults are documented in the sample config."
            ),
            ControllerError::State(msg) => format!(
                "What happened: Command refused in the current state ({msg}).\nLikely causes: Configuring during a run, or re-arming outside the Continue phase.\nHow to fix: Stop the run first, or wait for the current window to finish."
            ),
            ControllerError::EmptyWindow => {
                "What happened: An averaging window closed without any samples.\nLikely causes: Integration time shorter than one signal poll period, or the lock-in failing on every tick.\nHow to fix: Increase program.integration_s or the signal poll rate.".to_string()
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error class; non-typed errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if let Some(ce) = err.downcast_ref::<ControllerError>() {
        return match ce {
            ControllerError::Config(_) => 2,
            ControllerError::Timeout => 3,
            ControllerError::Instrument(_) => 4,
            ControllerError::State(_) => 5,
            ControllerError::Io(_) | ControllerError::EmptyWindow => 1,
        };
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(ce) = err.downcast_ref::<ControllerError>() {
        match ce {
            ControllerError::Timeout => "Timeout",
            ControllerError::Instrument(_) => "Instrument",
            ControllerError::Config(_) => "Config",
            ControllerError::State(_) => "State",
            ControllerError::Io(_) => "Io",
            ControllerError::EmptyWindow => "EmptyWindow",
        }
    } else if err.downcast_ref::<BuildError>().is_some() {
        "Build"
    } else {
        "Error"
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
