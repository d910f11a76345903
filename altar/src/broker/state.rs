//! State shared by the fetch tasks of one cycle

use std::time::Duration;

use tracing::debug;

use crate::awtrix::DisplayConfig;
use crate::routine::DEFAULT_POLL_RATE;

/// Starting value for the fastest interval of a cycle, far above any real poll rate
pub const UNBOUNDED_INTERVAL: Duration = Duration::from_secs(9000 * 60 * 60);

/// The merged display configuration plus this cycle's poll-rate accumulator
///
/// One instance lives behind a single mutex for the broker's lifetime. The
/// configuration persists across cycles; the accumulator is reset by
/// [`CycleState::begin_cycle`].
#[derive(Debug, Clone)]
pub struct CycleState {
    pub config: DisplayConfig,
    fastest_interval: Duration,
    merged: usize,
}

impl CycleState {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            config,
            fastest_interval: UNBOUNDED_INTERVAL,
            merged: 0,
        }
    }

    /// Reset the per-cycle accumulator
    pub fn begin_cycle(&mut self) {
        self.fastest_interval = UNBOUNDED_INTERVAL;
        self.merged = 0;
    }

    /// Fold one routine's requested settings and poll rate into the cycle
    pub fn fold(&mut self, delta: &DisplayConfig, poll_rate: Duration) {
        debug!(?poll_rate, "CycleState::fold: called");
        self.config.merge(delta);
        if poll_rate < self.fastest_interval {
            self.fastest_interval = poll_rate;
        }
        self.merged += 1;
    }

    /// Fastest poll rate folded this cycle
    pub fn fastest_interval(&self) -> Duration {
        self.fastest_interval
    }

    /// How long the cycle should last
    ///
    /// Falls back to the default poll rate when no routine got as far as
    /// merging, so a cycle where every fetch panicked does not stall for the
    /// sentinel interval.
    pub fn cycle_interval(&self) -> Duration {
        if self.merged == 0 {
            DEFAULT_POLL_RATE
        } else {
            self.fastest_interval
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awtrix::Overlay;

    #[test]
    fn test_fold_tracks_fastest_interval() {
        let mut state = CycleState::new(DisplayConfig::default());
        state.fold(&DisplayConfig::default(), Duration::from_secs(30));
        state.fold(&DisplayConfig::default(), Duration::from_secs(5));
        state.fold(&DisplayConfig::default(), Duration::from_secs(60));

        assert_eq!(state.fastest_interval(), Duration::from_secs(5));
        assert_eq!(state.cycle_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_begin_cycle_resets_interval_but_keeps_config() {
        let mut state = CycleState::new(DisplayConfig::default());
        let delta = DisplayConfig {
            overlay: Some(Overlay::Frost),
            ..Default::default()
        };
        state.fold(&delta, Duration::from_secs(1));

        state.begin_cycle();

        assert_eq!(state.fastest_interval(), UNBOUNDED_INTERVAL);
        assert_eq!(state.config.overlay, Some(Overlay::Frost));
    }

    #[test]
    fn test_no_merges_falls_back_to_default_poll_rate() {
        let state = CycleState::new(DisplayConfig::default());
        assert_eq!(state.fastest_interval(), UNBOUNDED_INTERVAL);
        assert_eq!(state.cycle_interval(), DEFAULT_POLL_RATE);
    }

    #[test]
    fn test_fold_merges_non_overlapping_fields() {
        let mut state = CycleState::new(DisplayConfig::default());
        state.fold(
            &DisplayConfig {
                time_app: Some(false),
                ..Default::default()
            },
            Duration::from_secs(10),
        );
        state.fold(
            &DisplayConfig {
                overlay: Some(Overlay::Rain),
                ..Default::default()
            },
            Duration::from_secs(10),
        );

        let json = serde_json::to_string(&state.config).unwrap();
        assert_eq!(json, r#"{"TIM":false,"OVERLAY":"rain"}"#);
    }
}
