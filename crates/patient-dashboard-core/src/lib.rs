//! Patient Dashboard Core Library
//!
//! Client-side patient record management: list, search, sort, paginate,
//! create, edit and delete patients, backed by a remote collection endpoint
//! with a fallback to bundled sample data.
//!
//! # Architecture
//!
//! ```text
//!   Presentation (native UI / CLI)
//!        │ reads ViewState            │ calls add/update/delete
//!        ▼                            ▼
//!   FilterEngine  ◄── records ──  PatientManager ── notifications ──► toasts
//!   (debounce, sort,                  │ optimistic apply, rollback
//!    pages, URL)                      ▼
//!                                RecordStore (cache)
//!                                     │ GET full collection
//!                                     ▼
//!                          remote endpoint ─(fails)─► sample data
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, PatientFormData, FilterForm, etc.)
//! - [`store`]: Record store with remote read and local writes
//! - [`state`]: Observable patient state with optimistic mutations
//! - [`filter`]: Filter/sort/pagination engine and URL sync
//! - [`config`]: Startup configuration

pub mod config;
pub mod filter;
pub mod models;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use config::{DashboardConfig, FilterTimings};
pub use filter::{EngineEvent, FilterEngine, PageItem, ViewState};
pub use models::{FilterForm, Patient, PatientFormData, SortDirection, SortKey, ViewportClass};
pub use state::{ChannelNotifier, Notification, NotificationKind, Notifier, PatientManager, PatientState};
pub use store::{HttpSource, PatientRepository, PatientSource, RecordStore, StoreError, StoreResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DashboardError {
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("State error: {0}")]
    StateError(String),
}

impl From<std::io::Error> for DashboardError {
    fn from(e: std::io::Error) -> Self {
        DashboardError::RuntimeError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DashboardError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DashboardError::StateError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a dashboard against `api_url`, or on sample data when it is absent.
///
/// `location_query` is the URL query string the view was opened with.
#[uniffi::export]
pub fn open_dashboard(
    api_url: Option<String>,
    viewport_width: u32,
    location_query: String,
) -> Result<Arc<DashboardCore>, DashboardError> {
    let config = DashboardConfig::with_api_url(api_url);
    DashboardCore::with_config(config, viewport_width, &location_query).map(Arc::new)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe dashboard wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DashboardCore {
    runtime: tokio::runtime::Runtime,
    manager: PatientManager<RecordStore>,
    engine: Mutex<FilterEngine>,
    notifications: Mutex<mpsc::UnboundedReceiver<Notification>>,
}

impl DashboardCore {
    /// Build a dashboard from resolved configuration.
    pub fn with_config(
        config: DashboardConfig,
        viewport_width: u32,
        location_query: &str,
    ) -> Result<Self, DashboardError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (notifier, notifications) = ChannelNotifier::channel();
        let store = Arc::new(RecordStore::from_config(&config));
        let engine = FilterEngine::from_location(config.filter, location_query, viewport_width);

        Ok(Self {
            runtime,
            manager: PatientManager::new(store, Arc::new(notifier)),
            engine: Mutex::new(engine),
            notifications: Mutex::new(notifications),
        })
    }

    /// The underlying state manager.
    pub fn manager(&self) -> &PatientManager<RecordStore> {
        &self.manager
    }
}

#[uniffi::export]
impl DashboardCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Initial load; only the first call fetches.
    pub fn mount(&self) {
        self.runtime.block_on(self.manager.mount());
    }

    /// Reload the full collection.
    pub fn fetch_patients(&self) {
        self.runtime.block_on(self.manager.fetch_patients());
    }

    /// Create a patient. `None` means the failure was reported as a notification.
    pub fn add_patient(&self, form: FfiPatientForm) -> Option<FfiPatient> {
        self.runtime
            .block_on(self.manager.add_patient(form.into()))
            .map(Into::into)
    }

    /// Edit a patient. `None` means the failure was reported as a notification.
    pub fn update_patient(&self, id: String, form: FfiPatientForm) -> Option<FfiPatient> {
        self.runtime
            .block_on(self.manager.update_patient(&id, form.into()))
            .map(Into::into)
    }

    /// Delete a patient. `false` means the failure was reported as a notification.
    pub fn delete_patient(&self, id: String) -> bool {
        self.runtime.block_on(self.manager.delete_patient(&id))
    }

    pub fn get_patient(&self, id: String) -> Option<FfiPatient> {
        self.manager.get_patient(&id).map(Into::into)
    }

    pub fn is_loading(&self) -> bool {
        self.manager.is_loading()
    }

    /// Message of the last surfaced failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.manager.error().map(|e| e.to_string())
    }

    /// Notifications produced since the last call.
    pub fn drain_notifications(&self) -> Result<Vec<FfiNotification>, DashboardError> {
        let mut rx = self.notifications.lock()?;
        let mut drained = Vec::new();
        while let Ok(notification) = rx.try_recv() {
            drained.push(notification.into());
        }
        Ok(drained)
    }

    // =========================================================================
    // Filter Operations
    // =========================================================================

    pub fn set_search_query(&self, query: String) -> Result<(), DashboardError> {
        self.engine.lock()?.set_search_query(query);
        Ok(())
    }

    pub fn clear_search(&self) -> Result<(), DashboardError> {
        self.engine.lock()?.clear_search();
        Ok(())
    }

    /// Set the sort key from its query-parameter value (`name`, `createdAt`, `id`).
    pub fn set_sort_by(&self, key: String) -> Result<(), DashboardError> {
        let key = SortKey::from_param(&key)
            .ok_or_else(|| DashboardError::InvalidInput(format!("unknown sort key: {key}")))?;
        self.engine.lock()?.set_sort_by(key);
        Ok(())
    }

    /// Set the direction from its query-parameter value (`asc`, `desc`).
    pub fn set_sort_direction(&self, direction: String) -> Result<(), DashboardError> {
        let direction = SortDirection::from_param(&direction).ok_or_else(|| {
            DashboardError::InvalidInput(format!("unknown sort direction: {direction}"))
        })?;
        self.engine.lock()?.set_sort_direction(direction);
        Ok(())
    }

    pub fn toggle_sort_direction(&self) -> Result<(), DashboardError> {
        self.engine.lock()?.toggle_sort_direction();
        Ok(())
    }

    pub fn reset_filters(&self) -> Result<(), DashboardError> {
        self.engine.lock()?.reset();
        Ok(())
    }

    pub fn set_page(&self, page: u32) -> Result<(), DashboardError> {
        self.engine.lock()?.set_page(page as usize);
        Ok(())
    }

    /// Returns whether more records were revealed.
    pub fn load_more(&self) -> Result<bool, DashboardError> {
        let records = self.manager.records();
        Ok(self.engine.lock()?.load_more(&records))
    }

    pub fn set_viewport_width(&self, width: u32) -> Result<(), DashboardError> {
        self.engine.lock()?.set_viewport_width(width);
        Ok(())
    }

    /// Advance the engine clock; the host calls this from its frame/timer loop.
    pub fn advance(&self, elapsed_ms: u64) -> Result<Vec<FfiEngineEvent>, DashboardError> {
        let events = self
            .engine
            .lock()?
            .advance(Duration::from_millis(elapsed_ms));
        Ok(events.into_iter().map(Into::into).collect())
    }

    /// Milliseconds until the next engine timer fires, if any is pending.
    pub fn next_deadline_ms(&self) -> Result<Option<u64>, DashboardError> {
        let engine = self.engine.lock()?;
        Ok(engine.next_deadline().map(|d| d.as_millis() as u64))
    }

    /// Current URL query string.
    pub fn location(&self) -> Result<String, DashboardError> {
        Ok(self.engine.lock()?.location().to_string())
    }

    /// Snapshot of the displayed list.
    pub fn view(&self) -> Result<FfiViewState, DashboardError> {
        let records = self.manager.records();
        let view = self.engine.lock()?.view(&records);
        Ok(view.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub initials: String,
    pub avatar: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
    pub last_updated: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            display_name: patient.display_name().to_string(),
            initials: patient.initials(),
            id: patient.id,
            name: patient.name,
            avatar: patient.avatar,
            description: patient.description,
            website: patient.website,
            created_at: patient.created_at,
            last_updated: patient.last_updated,
        }
    }
}

/// FFI-safe patient form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientForm {
    pub name: String,
    pub avatar: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

impl From<FfiPatientForm> for PatientFormData {
    fn from(form: FfiPatientForm) -> Self {
        PatientFormData {
            name: form.name,
            avatar: form.avatar,
            description: form.description,
            website: form.website,
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub kind: String,
    pub message: String,
}

impl From<Notification> for FfiNotification {
    fn from(n: Notification) -> Self {
        let kind = match n.kind {
            NotificationKind::NotFound => "not_found",
            NotificationKind::Network => "network",
            NotificationKind::Api => "api",
            NotificationKind::Generic => "generic",
        };
        Self {
            kind: kind.to_string(),
            message: n.message,
        }
    }
}

/// FFI-safe engine event.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiEngineEvent {
    SearchCommitted { query: String },
    FilteringChanged { is_filtering: bool },
    UrlReplaced { query: String },
}

impl From<EngineEvent> for FfiEngineEvent {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::SearchCommitted(query) => FfiEngineEvent::SearchCommitted { query },
            EngineEvent::FilteringChanged(is_filtering) => {
                FfiEngineEvent::FilteringChanged { is_filtering }
            }
            EngineEvent::UrlReplaced(query) => FfiEngineEvent::UrlReplaced { query },
        }
    }
}

/// FFI-safe page strip entry.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiPageItem {
    Page { number: u32 },
    Ellipsis,
}

impl From<PageItem> for FfiPageItem {
    fn from(item: PageItem) -> Self {
        match item {
            PageItem::Page(number) => FfiPageItem::Page {
                number: number as u32,
            },
            PageItem::Ellipsis => FfiPageItem::Ellipsis,
        }
    }
}

/// FFI-safe view snapshot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiViewState {
    pub patients: Vec<FfiPatient>,
    pub filtered_count: u32,
    pub current_page: u32,
    pub total_pages: u32,
    pub is_filtering: bool,
    pub is_mobile: bool,
    pub has_more: bool,
    pub debounced_query: String,
    pub summary: Option<String>,
    pub pages: Vec<FfiPageItem>,
}

impl From<ViewState> for FfiViewState {
    fn from(view: ViewState) -> Self {
        Self {
            summary: view.summary(),
            filtered_count: view.filtered_patients.len() as u32,
            current_page: view.current_page as u32,
            total_pages: view.total_pages as u32,
            is_filtering: view.is_filtering,
            is_mobile: view.viewport.is_mobile(),
            has_more: view.has_more,
            debounced_query: view.debounced_query,
            patients: view.paginated_patients.into_iter().map(Into::into).collect(),
            pages: view.pages.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_offline_flow() {
        let core = open_dashboard(None, 1280, "sort=id".into()).unwrap();
        core.mount();

        let view = core.view().unwrap();
        assert!(view.filtered_count > 0);
        assert_eq!(view.patients[0].id, "1");

        let added = core
            .add_patient(FfiPatientForm {
                name: "Zora Quinn".into(),
                avatar: None,
                description: None,
                website: None,
            })
            .unwrap();
        assert!(added.id.starts_with(store::LOCAL_ID_PREFIX));
        assert_eq!(added.initials, "ZQ");

        assert!(!core.delete_patient("missing".into()));
        let notes = core.drain_notifications().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, "not_found");
    }

    #[test]
    fn test_unknown_sort_key_rejected() {
        let core = open_dashboard(None, 1280, String::new()).unwrap();
        assert!(matches!(
            core.set_sort_by("species".into()),
            Err(DashboardError::InvalidInput(_))
        ));
        core.set_sort_by("createdAt".into()).unwrap();
        assert_eq!(core.location().unwrap(), "sort=createdAt");
    }
}
