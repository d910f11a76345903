//! Client for the admin command endpoint, used by `altar stop`

use std::net::IpAddr;
use std::time::Duration;

use eyre::{Result, eyre};
use tracing::debug;

use super::messages::AdminRequest;
use super::server::ADMIN_PATH;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    url: String,
}

impl AdminClient {
    /// Client for the admin server at `host:port`
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let host = match host.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{ip}]"),
            _ => host.to_string(),
        };
        let url = format!("http://{host}:{port}{ADMIN_PATH}");
        debug!(%url, "AdminClient::new: called");

        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask the broker to exit
    ///
    /// The broker exits without answering, so a connection dropped after the
    /// request went out counts as success. A refused connection means no
    /// broker is listening.
    pub async fn shutdown(&self) -> Result<()> {
        debug!(url = %self.url, "AdminClient::shutdown: called");
        match self.http.post(&self.url).json(&AdminRequest::shutdown()).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                Err(eyre!("Admin server rejected shutdown ({status}): {text}"))
            }
            Err(e) if e.is_connect() => Err(eyre!("Broker not running at {}: {e}", self.url)),
            Err(e) => {
                debug!(error = %e, "Connection closed after shutdown request, treating as success");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = AdminClient::new("127.0.0.1", 25827).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:25827/admin/command");

        let client = AdminClient::new("::1", 9000).unwrap();
        assert_eq!(client.url(), "http://[::1]:9000/admin/command");

        let client = AdminClient::new("localhost", 9000).unwrap();
        assert_eq!(client.url(), "http://localhost:9000/admin/command");
    }

    #[tokio::test]
    async fn test_shutdown_without_broker_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = AdminClient::new("127.0.0.1", port).unwrap();
        let err = client.shutdown().await.unwrap_err();
        assert!(err.to_string().contains("Broker not running"));
    }
}
