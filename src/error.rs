// for error definitions
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FailoverError {
    /// The device has no usable network path, so no host was attempted
    #[error("No network connectivity available")]
    NoConnectivity,

    /// The final attempt of a dispatch failed below the HTTP layer
    #[error("Transport failure: {0}")]
    Transport(TransportError),

    /// Errors related to the state storage backend
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A server profile could not be applied to a request URL
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Response body could not be decoded into the requested type
    #[error("Decode error: {0}")]
    Decode(String),

    /// An HTTP error status the caller asked to treat as an error
    #[error("Upstream returned HTTP {status}")]
    Upstream { status: u16, body: Vec<u8> },

    /// Unexpected or internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FailoverError {
    /// Returns the transport error if this is a transport failure
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            FailoverError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// What went wrong while executing a single network attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connect, read or overall request timeout
    Timeout,
    /// Host name could not be resolved
    Dns,
    /// Connection refused, reset or otherwise not established
    Connect,
    /// Any other I/O failure on the wire
    Io,
    /// The caller abandoned the attempt
    Cancelled,
    /// The request could not be built or sent as given
    InvalidRequest,
    /// Headers were received but the body could not be read
    Body,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Io => "io",
            TransportErrorKind::Cancelled => "cancelled",
            TransportErrorKind::InvalidRequest => "invalid request",
            TransportErrorKind::Body => "body",
        };
        f.write_str(name)
    }
}

/// Error reported by a `Transport` for one attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    pub fn dns(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Dns, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Cancelled, message)
    }

    /// Whether this failure may be cured by talking to the other server.
    ///
    /// Only failures below the HTTP layer qualify. A cancelled attempt, a
    /// malformed request or a broken body after the response head arrived
    /// never trigger failover.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Timeout
                | TransportErrorKind::Dns
                | TransportErrorKind::Connect
                | TransportErrorKind::Io
        )
    }
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem errors from a durable backend
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// Data serialization/deserialization errors
    #[error("Data serialization error: {0}")]
    Serialization(String),

    /// A stored value exists but cannot be interpreted
    #[error("Corrupt value for key: {0}")]
    Corrupt(String),

    /// The backend cannot serve requests right now
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StorageError> for FailoverError {
    fn from(err: StorageError) -> Self {
        FailoverError::Storage(err)
    }
}

impl From<TransportError> for FailoverError {
    fn from(err: TransportError) -> Self {
        FailoverError::Transport(err)
    }
}

impl From<std::io::Error> for FailoverError {
    fn from(err: std::io::Error) -> Self {
        FailoverError::Storage(StorageError::Io(err.to_string()))
    }
}

// implement conversions from serde_json::Error to FailoverError
impl From<serde_json::Error> for FailoverError {
    fn from(err: serde_json::Error) -> Self {
        FailoverError::Storage(StorageError::Serialization(err.to_string()))
    }
}

impl From<url::ParseError> for FailoverError {
    fn from(err: url::ParseError) -> Self {
        FailoverError::InvalidTarget(err.to_string())
    }
}

// define a Result type alias for convenience
pub type Result<T> = std::result::Result<T, FailoverError>;
