//! Runtime configuration.
//!
//! Resolved once at startup and passed into the store and filter engine.
//! Core services never read environment variables themselves.

use std::time::Duration;

/// Environment variable holding the patient collection URL.
pub const API_URL_ENV: &str = "PATIENTS_API_URL";
/// Environment variable holding the request timeout in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "PATIENTS_REQUEST_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Timing and sizing constants of the filter engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTimings {
    /// Settle window before a typed query is applied
    pub search_debounce: Duration,
    /// Smoothing applied to the "is filtering" flag
    pub filtering_smoothing: Duration,
    /// How long a sort change asserts the filtering flag
    pub sort_pulse: Duration,
    /// Query length at which the filtering flag starts to show
    pub indicator_min_chars: usize,
    /// Page size, and the mobile load-more increment
    pub items_per_page: usize,
    /// Widths at or below this are mobile
    pub mobile_breakpoint: u32,
}

impl Default for FilterTimings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            filtering_smoothing: Duration::from_millis(150),
            sort_pulse: Duration::from_millis(250),
            indicator_min_chars: 3,
            items_per_page: 12,
            mobile_breakpoint: 768,
        }
    }
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Collection endpoint. `None` runs on bundled sample data.
    pub api_url: Option<String>,
    pub request_timeout: Duration,
    pub filter: FilterTimings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            filter: FilterTimings::default(),
        }
    }
}

impl DashboardConfig {
    pub fn with_api_url(api_url: Option<String>) -> Self {
        Self {
            api_url: api_url.filter(|u| !u.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let request_timeout = lookup(REQUEST_TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self {
            request_timeout,
            ..Self::with_api_url(lookup(API_URL_ENV))
        }
    }
}
