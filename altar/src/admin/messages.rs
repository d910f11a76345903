//! Admin command wire format
//!
//! A single JSON object per request: `{"command": "DOWN", "data": "..."}`.

use serde::{Deserialize, Serialize};

/// Commands the admin server recognises
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdminCommand {
    /// Terminate the broker process
    #[serde(rename = "DOWN")]
    Shutdown,
}

/// Body of a request to the admin command endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminRequest {
    pub command: AdminCommand,

    /// Free-form argument, unused by current commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl AdminRequest {
    pub fn shutdown() -> Self {
        Self {
            command: AdminCommand::Shutdown,
            data: None,
        }
    }
}
