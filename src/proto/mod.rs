use std::{io, num::ParseFloatError, time::Duration};
use thiserror::Error;

pub mod codec;
pub mod command;
pub mod response;

#[cfg(test)]
pub(crate) mod fake;

pub type Result<T> = std::result::Result<T, ProtoError>;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No response within {0:?}")]
    Timeout(Duration),
    #[error("Connection to device closed")]
    Abort,
    #[error("Unexpected response: {0:?}")]
    Unexpected(String),
}

/// Failure to obtain one reading. Everything except [`ReadError::Proto`]
/// only costs the current sample.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Empty response")]
    Empty,
    #[error("Unparsable response {line:?}: {source}")]
    Parse {
        line: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("Measurement overload")]
    Overload,
    #[error(transparent)]
    Proto(#[from] ProtoError),
}
