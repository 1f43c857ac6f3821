//! Error handling for the sysdash telemetry aggregator.

/// A specialized `Result` type for sysdash operations.
pub type Result<T> = std::result::Result<T, SystemError>;

/// The main error type for sysdash operations.
///
/// Errors are `Clone` so that a failed source reading can sit in the TTL
/// cache and be handed out again while the entry is fresh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SystemError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(String),

    /// System information parsing failed
    #[error("Failed to parse system information: {0}")]
    ParseError(String),

    /// The source does not exist on this host (missing sensor, unsupported platform)
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with a value that cannot be used (NaN, out of range)
    #[error("Malformed reading: {0}")]
    Malformed(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for SystemError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SystemError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl SystemError {
    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a new unavailable-source error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a new malformed-reading error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
