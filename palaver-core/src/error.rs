//! Error types for transport exchanges

use std::error::Error as StdError;
use std::fmt;

/// The error returned by a [`Transport`](crate::Transport) exchange
///
/// The conversation loop propagates these unchanged; it never retries them.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Network-related errors
    Network {
        /// Error message
        message: String,
        /// Underlying error if available
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// The server answered with a non-success status
    Http {
        /// URL of the failed request
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// Serialization/deserialization errors
    Serialization {
        /// Error message
        message: String,
        /// Underlying error if available
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// A request or response hook rejected the exchange
    Hook(String),

    /// Configuration errors
    Configuration(String),

    /// Timeout errors
    Timeout,

    /// The exchange was cancelled through its context
    Cancelled,
}

impl Error {
    /// Whether a retry of the same exchange could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network { .. } | Error::Timeout => true,
            Error::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Network { message, .. } => write!(f, "Network error: {}", message),
            Error::Http { url, status, body } => {
                if body.is_empty() {
                    write!(f, "HTTP {} from {}", status, url)
                } else {
                    write!(f, "HTTP {} from {}: {}", status, url, body)
                }
            }
            Error::Serialization { message, .. } => write!(f, "Serialization error: {}", message),
            Error::Hook(msg) => write!(f, "Hook error: {}", msg),
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::Timeout => write!(f, "Operation timed out"),
            Error::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Network { source, .. } | Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn StdError + 'static)),
            _ => None,
        }
    }
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Network {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
