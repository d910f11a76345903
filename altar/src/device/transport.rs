//! HTTP transport seam between the gateway and the network

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use super::DeviceError;

/// A single POST to the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    pub url: Url,
    /// JSON body, `None` for bodiless commands such as reboot
    pub body: Option<Vec<u8>>,
}

impl DeviceRequest {
    pub fn new(url: Url, body: Option<Vec<u8>>) -> Self {
        Self { url, body }
    }

    /// Value of a query parameter, if present
    pub fn query(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// What came back from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceResponse {
    pub status: u16,
}

impl DeviceResponse {
    pub fn new(status: u16) -> Self {
        Self { status }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one request round trip
///
/// Only failures to complete the round trip are errors; any status code the
/// device answers with is returned as a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: DeviceRequest) -> Result<DeviceResponse, DeviceError>;
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Requests are bounded by whatever timeout `http` was built with
    pub fn from_client(http: Client) -> Self {
        debug!("HttpTransport::from_client: called");
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        debug!(url = %request.url, has_body = request.body.is_some(), "HttpTransport::post: called");
        let url = request.url.to_string();

        let mut builder = self.http.post(request.url);
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(|e| DeviceError::transport(url, e))?;
        Ok(DeviceResponse::new(response.status().as_u16()))
    }
}

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use super::*;

    /// In-memory transport that records every request it is given
    pub struct RecordingTransport {
        requests: Mutex<Vec<DeviceRequest>>,
        status: u16,
        fail_paths: Vec<String>,
    }

    impl Default for RecordingTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::with_status(200)
        }

        /// Answer every request with `status`
        pub fn with_status(status: u16) -> Self {
            debug!(status, "RecordingTransport::with_status: called");
            Self {
                requests: Mutex::new(Vec::new()),
                status,
                fail_paths: Vec::new(),
            }
        }

        /// Fail requests whose path ends with `path` at the transport level
        pub fn failing_on(mut self, path: impl Into<String>) -> Self {
            self.fail_paths.push(path.into());
            self
        }

        pub fn requests(&self) -> Vec<DeviceRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// Recorded requests whose path ends with `path`
        pub fn requests_to(&self, path: &str) -> Vec<DeviceRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.url.path().ends_with(path))
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn post(&self, request: DeviceRequest) -> Result<DeviceResponse, DeviceError> {
            debug!(url = %request.url, "RecordingTransport::post: called");
            let fails = self.fail_paths.iter().any(|p| request.url.path().ends_with(p.as_str()));
            let url = request.url.to_string();
            self.requests.lock().unwrap().push(request);

            if fails {
                return Err(DeviceError::transport(url, "connection refused"));
            }
            Ok(DeviceResponse::new(self.status))
        }
    }
}
