//! Remote collection endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{StoreError, StoreResult};
use crate::models::Patient;

/// Source of the full patient collection.
#[async_trait]
pub trait PatientSource: Send + Sync {
    /// Short tag used in log output.
    fn source_tag(&self) -> &'static str;

    /// Read the whole collection in one call.
    async fn fetch_all(&self) -> StoreResult<Vec<Patient>>;
}

/// Unauthenticated JSON GET against a configured URL.
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PatientSource for HttpSource {
    fn source_tag(&self) -> &'static str {
        "http"
    }

    #[instrument(name = "patients_http_fetch", skip(self))]
    async fn fetch_all(&self) -> StoreResult<Vec<Patient>> {
        debug!(url = %self.url, "fetching patient collection");
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Api {
                message: format!(
                    "Failed to fetch patients: {}",
                    status.canonical_reason().unwrap_or("unexpected status")
                ),
                status: Some(status.as_u16()),
            });
        }
        let patients = response.json::<Vec<Patient>>().await?;
        Ok(patients)
    }
}

/// Source used when no endpoint is configured. Every read fails, so the
/// store serves its cache or the bundled sample data.
#[derive(Debug, Default)]
pub struct OfflineSource;

#[async_trait]
impl PatientSource for OfflineSource {
    fn source_tag(&self) -> &'static str {
        "offline"
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Patient>> {
        Err(StoreError::Network("No patient endpoint configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_source_is_network_error() {
        let err = OfflineSource.fetch_all().await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Port 9 on loopback refuses connections on typical hosts.
        let source = HttpSource::new("http://127.0.0.1:9/patients", Duration::from_secs(2));
        let err = source.fetch_all().await.unwrap_err();
        assert!(err.is_network() || matches!(err, StoreError::Api { .. }));
    }
}
