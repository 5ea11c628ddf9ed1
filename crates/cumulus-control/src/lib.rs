//! Compute fleet status orchestration for cumulus.
//!
//! This crate implements the request/observe protocol for starting and
//! stopping a cluster's compute fleet. A caller submits a transition request
//! through [`ComputeFleetStatusManager`]; the fleet daemon on the cluster
//! picks the request up and advances the shared status record through the
//! in-progress state to completion. Safety under concurrent callers rests on
//! the store's conditional write: the manager never overwrites a value it has
//! not read.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cumulus_control::ComputeFleetStatusManager;
//! use cumulus_store::MemoryStatusStore;
//! use semver::Version;
//!
//! async fn start_fleet() -> cumulus_control::Result<()> {
//!     let store = Arc::new(MemoryStatusStore::new());
//!     let manager = ComputeFleetStatusManager::with_defaults(store, &Version::new(2, 0, 0));
//!
//!     // Submit the start request and wait for the fleet to come up.
//!     manager.request_start(true).await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod manager;
pub mod types;

pub use error::{FleetStatusError, Result};
pub use manager::ComputeFleetStatusManager;
pub use types::FleetStatusConfig;
