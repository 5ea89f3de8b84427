//! Patient state manager.
//!
//! Wraps a [`PatientRepository`] with an observable `{records, is_loading, error}`
//! state and mutation operations that apply their effect locally before the
//! repository confirms it.
//!
//! No operation returns an error. Failures are routed to the [`Notifier`] and
//! mirrored into [`PatientState::error`]; callers inspect the returned value
//! (`None` / `false`) to learn that an operation failed.
//!
//! Two overlapping mutations of the same id are not sequenced: whichever
//! repository call resolves last determines the final record.

mod notify;

pub use notify::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::{Patient, PatientFormData};
use crate::store::{PatientRepository, StoreError};

/// Observable snapshot of the manager.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientState {
    pub records: Vec<Patient>,
    pub is_loading: bool,
    pub error: Option<StoreError>,
}

/// Owns the observable patient list and its mutation surface.
pub struct PatientManager<R: PatientRepository> {
    repo: Arc<R>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<PatientState>,
    fetch_in_flight: AtomicBool,
    auto_fetch_fired: AtomicBool,
}

impl<R: PatientRepository> PatientManager<R> {
    pub fn new(repo: Arc<R>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(PatientState::default());
        Self {
            repo,
            notifier,
            state,
            fetch_in_flight: AtomicBool::new(false),
            auto_fetch_fired: AtomicBool::new(false),
        }
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<PatientState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> PatientState {
        self.state.borrow().clone()
    }

    pub fn records(&self) -> Vec<Patient> {
        self.state.borrow().records.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<StoreError> {
        self.state.borrow().error.clone()
    }

    /// Initial load for a session. Only the first call fetches.
    pub async fn mount(&self) {
        if self.auto_fetch_fired.swap(true, Ordering::AcqRel) {
            debug!("initial fetch already performed");
            return;
        }
        self.fetch_patients().await;
    }

    /// Load the full collection. No-op while another fetch is in flight.
    ///
    /// Existing records are kept when the load fails.
    pub async fn fetch_patients(&self) {
        if self.fetch_in_flight.swap(true, Ordering::AcqRel) {
            debug!("fetch already in flight, skipping");
            return;
        }
        let _guard = FetchGuard {
            in_flight: &self.fetch_in_flight,
            state: &self.state,
        };

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.repo.get_all().await {
            Ok(records) => {
                info!(count = records.len(), "patient list refreshed");
                self.state.send_modify(|s| s.records = records);
            }
            Err(e) => self.surface(e, "Failed to fetch patients"),
        }
    }

    /// Create a patient and append it to the list.
    pub async fn add_patient(&self, data: PatientFormData) -> Option<Patient> {
        self.state.send_modify(|s| s.error = None);

        match self.repo.create(data).await {
            Ok(patient) => {
                info!(id = %patient.id, "patient added");
                let added = patient.clone();
                self.state.send_modify(|s| s.records.push(added));
                Some(patient)
            }
            Err(e) => {
                self.surface(e, "Failed to add patient");
                None
            }
        }
    }

    /// Apply an edit locally, then confirm it with the repository.
    ///
    /// Only a not-found failure restores the previous list. Any other failure
    /// leaves the optimistic record in place.
    pub async fn update_patient(&self, id: &str, data: PatientFormData) -> Option<Patient> {
        let previous = self.records();
        self.state.send_modify(|s| {
            s.error = None;
            if let Some(slot) = s.records.iter_mut().find(|p| p.id == id) {
                *slot = slot.merged_with(&data);
            }
        });

        match self.repo.update(id, data).await {
            Ok(updated) => {
                let confirmed = updated.clone();
                self.state.send_modify(|s| {
                    for patient in s.records.iter_mut().filter(|p| p.id == id) {
                        *patient = confirmed.clone();
                    }
                });
                info!(id, "patient updated");
                Some(updated)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.state.send_modify(|s| s.records = previous);
                }
                self.surface(e, &format!("Failed to update patient {id}"));
                None
            }
        }
    }

    /// Remove a patient locally, then confirm with the repository.
    /// Any failure restores the full previous list.
    pub async fn delete_patient(&self, id: &str) -> bool {
        let previous = self.records();
        self.state.send_modify(|s| {
            s.error = None;
            s.records.retain(|p| p.id != id);
        });

        match self.repo.delete(id).await {
            Ok(()) => {
                info!(id, "patient deleted");
                true
            }
            Err(e) => {
                self.state.send_modify(|s| s.records = previous);
                self.surface(e, &format!("Failed to delete patient {id}"));
                false
            }
        }
    }

    /// Look up a patient in the current list.
    pub fn get_patient(&self, id: &str) -> Option<Patient> {
        self.state.borrow().records.iter().find(|p| p.id == id).cloned()
    }

    fn surface(&self, err: StoreError, fallback: &str) {
        warn!(error = %err, "{fallback}");
        self.notifier.notify(Notification::from_error(&err, fallback));
        self.state.send_modify(|s| s.error = Some(err));
    }
}

/// Ends a fetch when dropped, including when the fetch future is cancelled.
struct FetchGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a watch::Sender<PatientState>,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_loading = false);
        self.in_flight.store(false, Ordering::Release);
    }
}
