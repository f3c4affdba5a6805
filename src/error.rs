use thiserror::Error;

/// Errors raised while finding or talking to a serial device
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No port matched the configured identifier; the controller is left out
    #[error("no device matching '{0}' found")]
    NotFound(String),

    /// More than one port matched; the first one is used
    #[error("{count} devices match '{pattern}'")]
    Ambiguous { pattern: String, count: usize },

    /// The sink went away mid-session
    #[error("write failed: {0}")]
    WriteFailure(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}
