//! The persisted status record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single keyed record in the status store.
///
/// The `value` holds the fleet status serialized by whichever codec version
/// applies to the cluster; `last_updated` records when the status last
/// changed. Conditional writes compare `value` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// The encoded status value.
    pub value: String,
    /// When the status was last written, if the writer recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StatusRecord {
    /// Create a record with no timestamp.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            last_updated: None,
        }
    }

    /// Create a record stamped with the given update time.
    #[must_use]
    pub fn with_timestamp(value: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            last_updated: Some(last_updated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_omitted_when_absent() {
        let json = serde_json::to_string(&StatusRecord::new("RUNNING")).unwrap();
        assert_eq!(json, "{\"value\":\"RUNNING\"}");
    }

    #[test]
    fn serde_roundtrip_with_timestamp() {
        let record = StatusRecord::with_timestamp("STOPPED", Utc::now());
        let json = serde_json::to_string(&record).unwrap();
        let back: StatusRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
