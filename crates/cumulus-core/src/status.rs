//! Compute fleet lifecycle states.
//!
//! The compute fleet moves through a small, closed set of states. Clients only
//! ever write the `*_REQUESTED` states; the fleet daemon owns every other
//! transition:
//!
//! ```text
//!   STOPPED ──▶ START_REQUESTED ──▶ STARTING ──▶ RUNNING
//!   RUNNING ──▶ STOP_REQUESTED  ──▶ STOPPING ──▶ STOPPED
//! ```
//!
//! `PROTECTED` is written by the daemon when it detects consistent bootstrap
//! failures and keeps the fleet up without scheduling onto the affected
//! partitions. `UNKNOWN` is a read-side sentinel and is never persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of a cluster's compute fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComputeFleetStatus {
    /// Fleet is stopped, partitions are inactive.
    Stopped,
    /// Fleet is running, partitions are active.
    Running,
    /// The daemon is handling a stop request.
    Stopping,
    /// The daemon is handling a start request.
    Starting,
    /// A request to stop the fleet has been submitted.
    StopRequested,
    /// A request to start the fleet has been submitted.
    StartRequested,
    /// The daemon detected consistent bootstrap failures and keeps the fleet
    /// running with the affected partitions inactive.
    Protected,
    /// The fleet status could not be determined. Never persisted.
    Unknown,
}

impl ComputeFleetStatus {
    /// The canonical string form of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Starting => "STARTING",
            Self::StopRequested => "STOP_REQUESTED",
            Self::StartRequested => "START_REQUESTED",
            Self::Protected => "PROTECTED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns true if the status is any of the start ones.
    #[must_use]
    pub const fn is_start_status(self) -> bool {
        matches!(
            self,
            Self::StartRequested | Self::Starting | Self::Running | Self::Protected
        )
    }

    /// Returns true if the status is any of the stop ones.
    #[must_use]
    pub const fn is_stop_status(self) -> bool {
        matches!(self, Self::StopRequested | Self::Stopping | Self::Stopped)
    }

    /// Returns true if a start is requested or in progress.
    #[must_use]
    pub const fn is_start_in_progress(self) -> bool {
        matches!(self, Self::StartRequested | Self::Starting)
    }

    /// Returns true if a stop is requested or in progress.
    #[must_use]
    pub const fn is_stop_in_progress(self) -> bool {
        matches!(self, Self::StopRequested | Self::Stopping)
    }
}

impl fmt::Display for ComputeFleetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComputeFleetStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOPPED" => Ok(Self::Stopped),
            "RUNNING" => Ok(Self::Running),
            "STOPPING" => Ok(Self::Stopping),
            "STARTING" => Ok(Self::Starting),
            "STOP_REQUESTED" => Ok(Self::StopRequested),
            "START_REQUESTED" => Ok(Self::StartRequested),
            "PROTECTED" => Ok(Self::Protected),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized fleet status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized compute fleet status: {0}")]
pub struct ParseStatusError(pub String);
