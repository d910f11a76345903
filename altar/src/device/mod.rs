//! Everything that talks to the display device

mod error;
mod gateway;
mod transport;

pub use error::DeviceError;
pub use gateway::DeviceGateway;
pub use transport::{DeviceRequest, DeviceResponse, HttpTransport, Transport};

#[cfg(test)]
pub use transport::mock;
