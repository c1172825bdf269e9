//! Conversions from HTTP and JSON failures to core errors

use palaver_core::Error as CoreError;

/// Convert a reqwest error to a core error
///
/// Timeouts keep their own variant so retry policies can tell them apart.
pub fn network_error(error: reqwest::Error) -> CoreError {
    if error.is_timeout() {
        return CoreError::Timeout;
    }
    CoreError::Network {
        message: error.to_string(),
        source: Some(Box::new(error)),
    }
}

/// Convert a serde_json error to a core error
pub fn serialization_error(error: serde_json::Error) -> CoreError {
    CoreError::Serialization {
        message: error.to_string(),
        source: Some(Box::new(error)),
    }
}

/// A non-success status with whatever body the server sent
pub fn http_error(url: impl Into<String>, status: u16, body: impl Into<String>) -> CoreError {
    CoreError::Http {
        url: url.into(),
        status,
        body: body.into(),
    }
}
