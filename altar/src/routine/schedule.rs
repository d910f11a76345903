//! Per-routine poll bookkeeping

use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Poll rate used when a routine does not choose one
pub const DEFAULT_POLL_RATE: Duration = Duration::from_secs(10);

/// Tracks how often a routine wants to be polled and when it last was
#[derive(Debug, Clone)]
pub struct PollSchedule {
    poll_rate: Duration,
    last_polled: Option<Instant>,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_RATE)
    }
}

impl PollSchedule {
    pub fn new(poll_rate: Duration) -> Self {
        Self {
            poll_rate,
            last_polled: None,
        }
    }

    pub fn poll_rate(&self) -> Duration {
        self.poll_rate
    }

    pub fn set_poll_rate(&mut self, poll_rate: Duration) {
        self.poll_rate = poll_rate;
    }

    /// Derive the poll rate from an API allowance of `requests` per `per`
    ///
    /// A zero allowance leaves the current rate untouched.
    pub fn set_rate_limit(&mut self, requests: u32, per: Duration) {
        debug!(requests, ?per, "PollSchedule::set_rate_limit: called");
        match per.checked_div(requests) {
            Some(rate) => self.poll_rate = rate,
            None => warn!(?per, "Ignoring rate limit of zero requests, keeping {:?}", self.poll_rate),
        }
    }

    /// True if never polled or the poll rate has elapsed since the last poll
    pub fn should_fetch(&self) -> bool {
        self.should_fetch_at(Instant::now())
    }

    fn should_fetch_at(&self, now: Instant) -> bool {
        match self.last_polled {
            Some(last) => now.saturating_duration_since(last) > self.poll_rate,
            None => true,
        }
    }

    pub fn mark_polled(&mut self) {
        self.last_polled = Some(Instant::now());
    }

    /// Time since the last poll, if there was one
    pub fn since_last_poll(&self) -> Option<Duration> {
        self.last_polled.map(|last| last.elapsed())
    }
}
