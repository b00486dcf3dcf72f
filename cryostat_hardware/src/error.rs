use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("instrument read timeout")]
    Timeout,
    #[error("instrument disconnected")]
    Disconnected,
    #[error("malformed instrument reply: {0:?}")]
    MalformedReply(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InstrumentError>;
