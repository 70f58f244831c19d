use crate::config::{ConfigError, PlcId};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure category of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Resolution,
    Encoding,
    Connection,
    Write,
    Config,
}

#[derive(Debug, Error)]
pub enum SetError {
    #[error("{0}")]
    Usage(String),
    #[error("Invalid PLC ID.")]
    InvalidPlc(PlcId),
    #[error("Invalid Sensor option. Valid options are: {valid}")]
    InvalidSensor { sensor: String, valid: String },
    #[error("value {0} is out of range for a 16-bit signed integer")]
    ValueOutOfRange(i64),
    #[error("Failed to connect to PLC at {address}")]
    NotConnected { address: String },
    #[error("Failed to connect to PLC at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: BoxError,
    },
    #[error("Failed to write to PLC at {address}: {source}")]
    Write {
        address: String,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage(_) => ErrorKind::Usage,
            Self::InvalidPlc(_) | Self::InvalidSensor { .. } => ErrorKind::Resolution,
            Self::ValueOutOfRange(_) => ErrorKind::Encoding,
            Self::NotConnected { .. } | Self::Connect { .. } => ErrorKind::Connection,
            Self::Write { .. } => ErrorKind::Write,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}
