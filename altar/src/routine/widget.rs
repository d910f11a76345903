//! Stock routine implementation shared by custom apps and notifications

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use tracing::debug;

use super::schedule::PollSchedule;
use super::{Routine, RoutineKind};
use crate::awtrix::{AppData, DisplayConfig, NotificationData, Payload};

/// A custom app pushed to `/api/custom`
pub type Application = Widget<AppData>;

/// A notification pushed to `/api/notify`
pub type Notifier = Widget<NotificationData>;

/// What a fetcher is allowed to change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetState<P> {
    /// Payload pushed to the device
    pub data: P,

    /// Global settings requested from the broker
    pub global_config: DisplayConfig,

    /// Set before every fetch that runs; clear it to skip the next push
    pub push_on_next_call: bool,
}

/// Refreshes a widget's state
#[async_trait]
pub trait Fetcher<P: Send>: Send + Sync {
    async fn fetch(&self, state: &mut WidgetState<P>, client: &reqwest::Client) -> Result<()>;
}

/// Adapter so plain closures can be used as fetchers
struct FnFetcher<F>(F);

#[async_trait]
impl<P, F> Fetcher<P> for FnFetcher<F>
where
    P: Send + 'static,
    F: Fn(&mut WidgetState<P>, &reqwest::Client) -> Result<()> + Send + Sync,
{
    async fn fetch(&self, state: &mut WidgetState<P>, client: &reqwest::Client) -> Result<()> {
        (self.0)(state, client)
    }
}

/// A named routine rendering payload `P` on its own poll schedule
pub struct Widget<P: Payload> {
    name: String,
    schedule: PollSchedule,
    state: WidgetState<P>,
    fetcher: Arc<dyn Fetcher<P>>,
}

impl<P: Payload> Widget<P> {
    /// Create a widget driven by `fetcher`
    pub fn new(name: impl Into<String>, fetcher: impl Fetcher<P> + 'static) -> Self {
        let name = name.into();
        debug!(%name, kind = %P::KIND, "Widget::new: called");
        Self {
            name,
            schedule: PollSchedule::default(),
            state: WidgetState::default(),
            fetcher: Arc::new(fetcher),
        }
    }

    /// Create a widget from a synchronous closure
    pub fn from_fn<F>(name: impl Into<String>, fetcher: F) -> Self
    where
        F: Fn(&mut WidgetState<P>, &reqwest::Client) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(name, FnFetcher(fetcher))
    }

    pub fn with_poll_rate(mut self, poll_rate: Duration) -> Self {
        self.schedule.set_poll_rate(poll_rate);
        self
    }

    /// Poll as fast as an allowance of `requests` per `per` permits
    pub fn with_rate_limit(mut self, requests: u32, per: Duration) -> Self {
        self.schedule.set_rate_limit(requests, per);
        self
    }

    /// Seed the payload shown before the first successful fetch
    pub fn with_data(mut self, data: P) -> Self {
        self.state.data = data;
        self
    }

    /// Box for handing to the broker
    pub fn boxed(self) -> Box<dyn Routine> {
        Box::new(self)
    }
}

#[async_trait]
impl<P: Payload> Routine for Widget<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RoutineKind {
        P::KIND
    }

    fn poll_rate(&self) -> Duration {
        self.schedule.poll_rate()
    }

    fn should_push(&self) -> bool {
        self.state.push_on_next_call
    }

    fn global_config(&self) -> &DisplayConfig {
        &self.state.global_config
    }

    fn payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.state.data)
    }

    async fn fetch(&mut self, client: &reqwest::Client) -> Result<()> {
        let since_last = self.schedule.since_last_poll();
        if !self.schedule.should_fetch() {
            debug!(routine = %self.name, ?since_last, poll_rate = ?self.schedule.poll_rate(), "Skipping fetch, not due");
            return Ok(());
        }

        debug!(routine = %self.name, ?since_last, poll_rate = ?self.schedule.poll_rate(), "Fetching");
        self.schedule.mark_polled();

        // Work on a copy; a failed fetch leaves payload and push flag as they were
        let mut next = self.state.clone();
        next.push_on_next_call = true;

        let fetcher = Arc::clone(&self.fetcher);
        fetcher.fetch(&mut next, client).await?;

        self.state = next;
        Ok(())
    }
}
