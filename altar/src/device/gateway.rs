//! The three device operations the broker uses

use std::net::IpAddr;
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use super::{DeviceError, DeviceRequest, DeviceResponse, Transport};
use crate::awtrix::DisplayConfig;
use crate::routine::Routine;

const SETTINGS_PATH: &str = "api/settings";
const REBOOT_PATH: &str = "api/reboot";

/// Single-attempt POSTs to one Awtrix device
///
/// A non-2xx answer is logged as a warning and treated as delivered. Only a
/// request that cannot be built or cannot complete its round trip is an error.
#[derive(Clone)]
pub struct DeviceGateway {
    address: IpAddr,
    port: Option<u16>,
    transport: Arc<dyn Transport>,
}

impl DeviceGateway {
    pub fn new(address: IpAddr, transport: Arc<dyn Transport>) -> Self {
        debug!(%address, "DeviceGateway::new: called");
        Self {
            address,
            port: None,
            transport,
        }
    }

    /// Target a non-standard port, e.g. a local request logger
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = transport;
    }

    /// Root URL of the device, e.g. `http://192.168.0.10/`
    pub fn base_url(&self) -> Result<Url, DeviceError> {
        let host = match self.address {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{ip}]"),
        };
        let base = match self.port {
            Some(port) => format!("http://{host}:{port}/"),
            None => format!("http://{host}/"),
        };
        Ok(Url::parse(&base)?)
    }

    /// POST the display configuration to the settings endpoint
    pub async fn send_config(&self, config: &DisplayConfig) -> Result<(), DeviceError> {
        debug!(?config, "DeviceGateway::send_config: called");
        let body = serde_json::to_vec(config).map_err(|source| DeviceError::Serialize {
            what: "display config".to_string(),
            source,
        })?;
        let url = self.base_url()?.join(SETTINGS_PATH)?;

        let response = self.post(DeviceRequest::new(url, Some(body))).await?;
        self.check("settings", response);
        Ok(())
    }

    /// POST a routine's current payload to the endpoint for its kind
    pub async fn push_routine(&self, routine: &dyn Routine) -> Result<(), DeviceError> {
        let name = routine.name();
        let kind = routine.kind();
        debug!(routine = %name, %kind, "DeviceGateway::push_routine: called");

        let body = routine.payload().map_err(|source| DeviceError::Serialize {
            what: format!("payload of {name}"),
            source,
        })?;

        let mut url = self.base_url()?.join(kind.path())?;
        if kind.addressed_by_name() {
            url.query_pairs_mut().append_pair("name", name);
        }

        let response = self.post(DeviceRequest::new(url, Some(body))).await?;
        self.check(name, response);
        Ok(())
    }

    /// Ask the device to restart so it applies new settings
    pub async fn reboot(&self) -> Result<(), DeviceError> {
        debug!("DeviceGateway::reboot: called");
        let url = self.base_url()?.join(REBOOT_PATH)?;

        let response = self.post(DeviceRequest::new(url, None)).await?;
        self.check("reboot", response);
        if response.is_success() {
            info!(address = %self.address, "Device reboot requested");
        }
        Ok(())
    }

    async fn post(&self, request: DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        self.transport.post(request).await
    }

    fn check(&self, target: &str, response: DeviceResponse) {
        if !response.is_success() {
            warn!(
                target_name = %target,
                status = response.status,
                address = %self.address,
                "Device answered with a non-2xx status"
            );
        }
    }
}

impl std::fmt::Debug for DeviceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceGateway")
            .field("address", &self.address)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}
