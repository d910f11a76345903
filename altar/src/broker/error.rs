//! Broker construction errors

use thiserror::Error;

/// Errors raised before the broker starts cycling
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to initialise broker: no routines were provided")]
    NoRoutines,

    #[error("failed to initialise broker: '{address}' is not a valid IP address")]
    InvalidAddress { address: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
