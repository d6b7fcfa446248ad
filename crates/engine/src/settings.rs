//! Engine tuning

use std::time::Duration;

use crate::poll::PollPolicy;

/// Timeouts, intervals and stability windows used by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSettings {
    /// Waiting for the first option after opening an overlay
    pub overlay_open: PollPolicy,

    /// Reading options until the set stops growing
    pub overlay_read: PollPolicy,

    /// Consecutive unchanged option counts required before the set is final
    pub option_stability_window: usize,

    /// Waiting for a validation signal after clearing a field
    pub required_validation: PollPolicy,

    /// Discovering field hosts on a page
    pub index: PollPolicy,

    /// Consecutive unchanged host counts required before the index is final
    pub index_stability_window: usize,

    /// Sleep between attempts of an awaited check
    pub await_interval: Duration,

    /// Characters of overlay markup kept in diagnostics
    pub overlay_html_len: usize,

    /// Characters of container markup kept in diagnostics
    pub container_html_len: usize,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            overlay_open: PollPolicy::new(Duration::from_secs(20), Duration::from_millis(100)),
            overlay_read: PollPolicy::new(Duration::from_secs(20), Duration::from_millis(150)),
            option_stability_window: 2,
            required_validation: PollPolicy::new(Duration::from_secs(5), Duration::from_millis(100)),
            index: PollPolicy::new(Duration::from_secs(30), Duration::from_millis(250)),
            index_stability_window: 4,
            await_interval: Duration::from_millis(250),
            overlay_html_len: 800,
            container_html_len: 1200,
        }
    }
}

impl CheckSettings {
    /// Use `timeout` for every overlay wait
    pub fn with_overlay_timeout(mut self, timeout: Duration) -> Self {
        self.overlay_open = self.overlay_open.with_timeout(timeout);
        self.overlay_read = self.overlay_read.with_timeout(timeout);
        self
    }
}
