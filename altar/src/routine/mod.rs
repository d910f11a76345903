//! Routines - independently scheduled units that fetch data for the display
//!
//! The broker only sees the [`Routine`] trait. [`Widget`] is the stock
//! implementation: it owns a poll schedule, the payload last rendered, and a
//! [`Fetcher`] that refreshes it.

use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;

use crate::awtrix::DisplayConfig;

mod schedule;
mod widget;

pub use schedule::{DEFAULT_POLL_RATE, PollSchedule};
pub use widget::{Application, Fetcher, Notifier, Widget, WidgetState};

/// Which device endpoint a routine's payload is posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    /// Persistent custom app, addressed by the routine name
    CustomApp,
    /// One-off notification
    Notification,
}

impl RoutineKind {
    /// Path of the endpoint, relative to the device root
    pub fn path(self) -> &'static str {
        match self {
            RoutineKind::CustomApp => "api/custom",
            RoutineKind::Notification => "api/notify",
        }
    }

    /// Whether the routine name is sent as the `name` query parameter
    pub fn addressed_by_name(self) -> bool {
        matches!(self, RoutineKind::CustomApp)
    }
}

impl std::fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutineKind::CustomApp => write!(f, "custom-app"),
            RoutineKind::Notification => write!(f, "notification"),
        }
    }
}

/// A unit of work the broker polls and pushes
///
/// `fetch` is called once per broker cycle. Implementations are expected to
/// return immediately without doing anything when their own poll rate has not
/// elapsed yet; the broker cycles at the pace of the fastest routine.
#[async_trait]
pub trait Routine: Send + Sync {
    /// Name used in logs and as the custom app name on the device
    fn name(&self) -> &str;

    fn kind(&self) -> RoutineKind;

    /// How often this routine wants to be fetched
    fn poll_rate(&self) -> Duration;

    /// Whether the current payload should be pushed this cycle
    fn should_push(&self) -> bool;

    /// Global settings this routine wants applied to the device
    fn global_config(&self) -> &DisplayConfig;

    /// Current payload as JSON
    fn payload(&self) -> Result<Vec<u8>, serde_json::Error>;

    /// Refresh the routine's data
    async fn fetch(&mut self, client: &reqwest::Client) -> Result<()>;
}
