//! In-memory status store.
//!
//! This implementation backs tests and local development. A single lock
//! serializes writes, so the read-compare-swap of `put_conditional` is atomic
//! and reads are linearizable per key by construction.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::record::StatusRecord;
use crate::StatusStore;

/// An in-process [`StatusStore`] backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    records: RwLock<HashMap<String, StatusRecord>>,
}

impl MemoryStatusStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally set the record at `key`.
    ///
    /// This models provisioning-time record creation, which in production is
    /// performed by the cluster infrastructure rather than through the
    /// conditional-write path.
    pub fn insert(&self, key: impl Into<String>, record: StatusRecord) {
        self.records.write().insert(key.into(), record);
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn get(&self, key: &str) -> Result<StatusRecord> {
        self.records
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put_conditional(
        &self,
        key: &str,
        next: StatusRecord,
        expected_value: &str,
    ) -> Result<()> {
        let mut records = self.records.write();
        // An absent record cannot equal any expected value.
        let matches = records
            .get(key)
            .is_some_and(|current| current.value == expected_value);
        if matches {
            records.insert(key.to_string(), next);
            Ok(())
        } else {
            Err(StoreError::ConditionMismatch(key.to_string()))
        }
    }
}
