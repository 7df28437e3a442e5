use std::io;
use thiserror::Error;

/// Errors produced by the host side of the native messaging bridge.
#[derive(Error, Debug)]
pub enum NmError {
    /// Reading from or writing to the stdio transport failed.
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The single frame writer has stopped, so nothing more can be sent.
    #[error("frame writer is gone, the browser side has disconnected")]
    Disconnected,

    /// An incoming payload was not the expected JSON envelope.
    #[error("unable to decode incoming JSON: {0}")]
    DeserializeJson(#[source] serde_json::Error),

    /// An outgoing message could not be turned into JSON.
    #[error("unable to encode outgoing JSON: {0}")]
    SerializeJson(#[source] serde_json::Error),

    /// Host → browser frames are capped; the browser drops anything larger.
    #[error("outgoing message of {len} bytes exceeds the {max} byte limit")]
    OutgoingTooLarge { len: usize, max: usize },

    /// Log sink or filter could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl NmError {
    /// True for errors that end the stdio loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NmError::Io(_) | NmError::Disconnected)
    }
}
