//! Device gateway error types

use thiserror::Error;

/// Errors that stop a request from reaching the device
///
/// A response with a non-2xx status is not an error, the gateway only logs it.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid device URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DeviceError {
    /// Wrap a transport failure for `url`
    pub fn transport(url: impl Into<String>, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        DeviceError::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Check if the request never completed a round trip
    pub fn is_transport(&self) -> bool {
        matches!(self, DeviceError::Transport { .. })
    }
}
