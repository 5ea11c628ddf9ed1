//! Core types and utilities for cumulus.
//!
//! This crate provides the foundational types used throughout the cumulus platform:
//!
//! - **Fleet status**: the [`ComputeFleetStatus`] lifecycle states and their
//!   classification predicates
//! - **Identifiers**: the validated [`ClusterName`] cluster identifier
//!
//! # Example
//!
//! ```
//! use cumulus_core::{ClusterName, ComputeFleetStatus};
//!
//! // Parse a cluster name
//! let cluster: ClusterName = "hpc-prod-01".parse().unwrap();
//!
//! // Classify a fleet status
//! let status = ComputeFleetStatus::StartRequested;
//! assert!(status.is_start_status());
//! assert!(status.is_start_in_progress());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cluster;
pub mod status;

pub use cluster::{ClusterName, ClusterNameError};
pub use status::{ComputeFleetStatus, ParseStatusError};
