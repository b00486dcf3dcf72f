use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ControllerError {
    #[error("instrument error: {0}")]
    Instrument(String),
    #[error("timeout waiting for instrument")]
    Timeout,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("acquisition window closed with no samples")]
    EmptyWindow,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing thermometer")]
    MissingThermometer,
    #[error("missing reference voltmeter")]
    MissingVoltmeter,
    #[error("missing lock-in")]
    MissingLockIn,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
