//! Record store: the single owner of the patient collection.
//!
//! The store reads the full collection from a [`PatientSource`] and keeps an
//! in-process cache that becomes the source of truth after the first load.
//! Writes are local-only and never reach the remote endpoint.

mod remote;
mod sample;

pub use remote::*;
pub use sample::*;

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::DashboardConfig;
use crate::models::{Patient, PatientFormData};

/// Resource name carried by not-found errors.
pub const PATIENT_RESOURCE: &str = "Patient";

/// Prefix of ids minted locally, keeping them apart from server ids.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Store errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{resource} with id {id} not found")]
    NotFound { resource: String, id: String },

    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Api { message: String, status: Option<u16> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn patient_not_found(id: &str) -> Self {
        StoreError::NotFound {
            resource: PATIENT_RESOURCE.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, StoreError::Network(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            StoreError::Api {
                message: e.to_string(),
                status: Some(status.as_u16()),
            }
        } else if e.is_decode() {
            StoreError::Other(format!("Invalid patient payload: {e}"))
        } else {
            StoreError::Network(format!("Unable to reach the patient service: {e}"))
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Other(format!("JSON error: {e}"))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Data access operations the state manager depends on.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<Patient>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Patient>;

    async fn create(&self, data: PatientFormData) -> StoreResult<Patient>;

    async fn update(&self, id: &str, data: PatientFormData) -> StoreResult<Patient>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// In-process patient store with remote read and sample-data fallback.
pub struct RecordStore {
    source: Box<dyn PatientSource>,
    cache: Mutex<Vec<Patient>>,
}

impl RecordStore {
    /// Create a store reading from the given source.
    pub fn new(source: impl PatientSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: Mutex::new(Vec::new()),
        }
    }

    /// Create a store with no remote endpoint.
    pub fn offline() -> Self {
        Self::new(OfflineSource)
    }

    /// Create a store for the configured endpoint, or an offline one.
    pub fn from_config(config: &DashboardConfig) -> Self {
        match &config.api_url {
            Some(url) => Self::new(HttpSource::new(url.clone(), config.request_timeout)),
            None => Self::offline(),
        }
    }

    /// Tag of the underlying source.
    pub fn source_tag(&self) -> &'static str {
        self.source.source_tag()
    }

    /// Copy of the cached collection.
    pub fn snapshot(&self) -> Vec<Patient> {
        self.cache().clone()
    }

    // A panic while holding the lock leaves the Vec intact, so a poisoned
    // cache is still usable.
    fn cache(&self) -> MutexGuard<'_, Vec<Patient>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn fallback(&self, cause: &StoreError) -> Vec<Patient> {
        let mut cache = self.cache();
        if !cache.is_empty() {
            warn!(error = %cause, count = cache.len(), "patient fetch failed, serving cached records");
            return cache.clone();
        }

        warn!(error = %cause, "patient fetch failed, seeding cache with sample data");
        let sample = sample_patients().unwrap_or_else(|e| {
            error!(error = %e, "bundled sample data is unreadable");
            Vec::new()
        });
        *cache = sample.clone();
        sample
    }

    fn validated(data: PatientFormData) -> StoreResult<PatientFormData> {
        let data = data.normalized();
        data.validate().map_err(|errors| {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            StoreError::InvalidInput(joined)
        })?;
        Ok(data)
    }

    fn next_local_id(cache: &[Patient]) -> String {
        loop {
            let id = format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4());
            if !cache.iter().any(|p| p.id == id) {
                return id;
            }
        }
    }
}

#[async_trait]
impl PatientRepository for RecordStore {
    /// Never fails: falls back to the cache, then to the sample dataset.
    async fn get_all(&self) -> StoreResult<Vec<Patient>> {
        match self.source.fetch_all().await {
            Ok(patients) => {
                info!(source = self.source.source_tag(), count = patients.len(), "patients loaded");
                *self.cache() = patients.clone();
                Ok(patients)
            }
            Err(e) => Ok(self.fallback(&e)),
        }
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Patient> {
        let patients = self.get_all().await?;
        patients
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::patient_not_found(id))
    }

    async fn create(&self, data: PatientFormData) -> StoreResult<Patient> {
        let data = Self::validated(data)?;
        let mut cache = self.cache();
        let patient = Patient::from_form(Self::next_local_id(&cache), data);
        cache.push(patient.clone());
        debug!(id = %patient.id, "patient created locally");
        Ok(patient)
    }

    async fn update(&self, id: &str, data: PatientFormData) -> StoreResult<Patient> {
        let mut cache = self.cache();
        let slot = cache
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::patient_not_found(id))?;
        let data = Self::validated(data)?;
        let updated = slot.merged_with(&data);
        *slot = updated.clone();
        debug!(id, "patient updated");
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut cache = self.cache();
        let before = cache.len();
        cache.retain(|p| p.id != id);
        if cache.len() == before {
            return Err(StoreError::patient_not_found(id));
        }
        debug!(id, "patient deleted");
        Ok(())
    }
}
