//! Configuration for fleet status orchestration.

use std::time::Duration;

/// Timing knobs for the status polling loop.
///
/// The daemon advances the fleet on a cadence of tens of seconds to minutes,
/// so the manager polls at a coarse fixed interval with no backoff growth.
/// Tests substitute virtual time by running under tokio's paused clock; the
/// values themselves stay injectable for environments with a different
/// daemon cadence.
#[derive(Debug, Clone)]
pub struct FleetStatusConfig {
    /// Seconds between consecutive status reads while waiting.
    pub poll_interval_seconds: u64,
    /// How long to wait for the daemon to pick a request up (seconds).
    pub request_timeout_seconds: u64,
    /// How long to wait for an in-progress transition to complete (seconds).
    pub in_progress_timeout_seconds: u64,
}

impl Default for FleetStatusConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 15,
            request_timeout_seconds: 180,      // 3 minutes
            in_progress_timeout_seconds: 600,  // 10 minutes
        }
    }
}

impl FleetStatusConfig {
    /// The polling interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// The request-phase timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// The in-progress-phase timeout as a [`Duration`].
    #[must_use]
    pub const fn in_progress_timeout(&self) -> Duration {
        Duration::from_secs(self.in_progress_timeout_seconds)
    }
}
