//! Error types for the game model.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The single failure kind surfaced to callers of the model.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad input shape or value: NaN radius, out-of-range direction,
    /// malformed name, unbound program variable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted in a state that forbids it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
