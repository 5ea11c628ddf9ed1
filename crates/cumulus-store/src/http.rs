//! HTTP client for the durable store's REST facade.
//!
//! Cluster state lives in an external strongly-consistent store fronted by a
//! small REST service on the cluster's control endpoint. This client maps the
//! facade's responses onto the [`StatusStore`] contract: `404` on read means
//! the record does not exist, `409` on write means the conditional check
//! failed, and anything else is a transient service failure.

use std::time::Duration;

use async_trait::async_trait;
use cumulus_core::ClusterName;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::record::StatusRecord;
use crate::StatusStore;

/// HTTP implementation of [`StatusStore`].
#[derive(Debug, Clone)]
pub struct HttpStatusStore {
    client: reqwest::Client,
    base_url: String,
    cluster: ClusterName,
}

impl HttpStatusStore {
    /// Create a new client for the given cluster.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the store facade (e.g., "http://head-node:8448")
    /// * `cluster` - The cluster whose records this client addresses
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created.
    #[must_use]
    pub fn new(base_url: impl Into<String>, cluster: ClusterName) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self::with_client(client, base_url, cluster)
    }

    /// Create a new client with a custom reqwest client.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        cluster: ClusterName,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            cluster,
        }
    }

    /// The base URL of the store facade.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, key: &str) -> String {
        format!(
            "{}/v1/clusters/{}/records/{}",
            self.base_url, self.cluster, key
        )
    }
}

/// Request body for a conditional record replacement.
#[derive(Debug, Serialize)]
struct ConditionalPutRequest<'a> {
    record: &'a StatusRecord,
    expected_value: &'a str,
}

/// Error response from the store facade.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[allow(dead_code)]
    code: u16,
}

async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    response
        .json::<ErrorResponse>()
        .await
        .map(|e| e.error)
        .unwrap_or_else(|_| format!("store facade returned status {status}"))
}

#[async_trait]
impl StatusStore for HttpStatusStore {
    async fn get(&self, key: &str) -> Result<StatusRecord> {
        let url = self.record_url(key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Transient(format!("store request failed: {e}")))?;

        if response.status().is_success() {
            response
                .json::<StatusRecord>()
                .await
                .map_err(|e| StoreError::Serialization(e.to_string()))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Err(StoreError::NotFound(key.to_string()))
        } else {
            Err(StoreError::Transient(error_body(response).await))
        }
    }

    async fn put_conditional(
        &self,
        key: &str,
        next: StatusRecord,
        expected_value: &str,
    ) -> Result<()> {
        let url = self.record_url(key);

        let request = ConditionalPutRequest {
            record: &next,
            expected_value,
        };

        let response = self
            .client
            .put(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Transient(format!("store request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(key = %key, cluster = %self.cluster, "Replaced store record");
            Ok(())
        } else if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::NOT_FOUND
        {
            // The facade reports a missing record as 404; the contract folds
            // absence into a failed condition.
            Err(StoreError::ConditionMismatch(key.to_string()))
        } else {
            let error = error_body(response).await;
            tracing::error!(
                key = %key,
                cluster = %self.cluster,
                status = %status,
                error = %error,
                "Conditional write failed"
            );
            Err(StoreError::Transient(error))
        }
    }
}
