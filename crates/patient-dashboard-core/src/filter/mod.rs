//! Filter, sort and pagination engine.
//!
//! [`FilterEngine`] owns the filter form, the debounced query, the transient
//! "is filtering" flag, pagination position and the URL query string.
//! It never holds records: [`FilterEngine::view`] derives the displayed
//! subset from whatever list the caller passes in, so it can be re-run
//! whenever records, form state or viewport change.
//!
//! Time is logical. The host calls [`FilterEngine::advance`] with elapsed
//! time and receives the resulting [`EngineEvent`]s.

mod pages;
mod query;
mod timer;
mod view;

pub use pages::*;
pub use query::*;
pub use timer::*;
pub use view::*;

use std::time::Duration;

use tracing::{debug, trace};

use crate::config::FilterTimings;
use crate::models::{FilterForm, Patient, SortDirection, SortKey, ViewportClass};

/// Timers owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterTimer {
    /// Search debounce settled
    CommitSearch,
    /// Smoothed value of the search-driven filtering flag
    SmoothFiltering(bool),
    /// End of the filtering window asserted by a sort change
    EndSortPulse,
}

/// Observable changes produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The debounced query changed and now drives filtering
    SearchCommitted(String),
    /// The published "is filtering" flag flipped
    FilteringChanged(bool),
    /// The URL query string was replaced in place
    UrlReplaced(String),
}

/// Everything the presentation layer needs to render the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub filtered_patients: Vec<Patient>,
    pub paginated_patients: Vec<Patient>,
    pub current_page: usize,
    pub total_pages: usize,
    pub is_filtering: bool,
    pub debounced_query: String,
    pub viewport: ViewportClass,
    /// Mobile mode has records beyond the current display limit
    pub has_more: bool,
    /// Desktop page strip; empty in mobile mode
    pub pages: Vec<PageItem>,
}

impl ViewState {
    /// Result-count line, e.g. `Showing 12 of 25 patients for "jo"`.
    pub fn summary(&self) -> Option<String> {
        let total = self.filtered_patients.len();
        if total == 0 {
            return None;
        }

        let noun = if total == 1 { "patient" } else { "patients" };
        let shown = self.paginated_patients.len();
        let mut line = if self.viewport.is_mobile() {
            format!("Showing {shown} {noun}")
        } else {
            format!("Showing {shown} of {total} {noun}")
        };
        if !self.debounced_query.is_empty() {
            line.push_str(&format!(" for \"{}\"", self.debounced_query));
        }
        Some(line)
    }
}

/// Stateful filter engine.
#[derive(Debug)]
pub struct FilterEngine {
    timings: FilterTimings,
    form: FilterForm,
    debounced_query: String,
    viewport: ViewportClass,
    current_page: usize,
    display_limit: usize,
    search_filtering: bool,
    sort_pulse: bool,
    is_filtering: bool,
    location: String,
    timers: TimerQueue<FilterTimer>,
    search_timer: Option<TimerToken>,
    smoothing_timer: Option<TimerToken>,
    /// Value the pending smoothing timer will publish
    smoothing_target: bool,
    pulse_timer: Option<TimerToken>,
    outbox: Vec<EngineEvent>,
}

impl FilterEngine {
    /// Engine with default form state.
    pub fn new(timings: FilterTimings, viewport_width: u32) -> Self {
        Self::from_location(timings, "", viewport_width)
    }

    /// Engine whose form state is read from a URL query string.
    ///
    /// The query from the URL is applied immediately, without debounce.
    pub fn from_location(timings: FilterTimings, query: &str, viewport_width: u32) -> Self {
        let form = form_from_query(query);
        Self {
            viewport: ViewportClass::from_width(viewport_width, timings.mobile_breakpoint),
            display_limit: timings.items_per_page,
            debounced_query: form.search_query.clone(),
            form,
            timings,
            current_page: 1,
            search_filtering: false,
            sort_pulse: false,
            is_filtering: false,
            location: query.trim_start_matches('?').to_string(),
            timers: TimerQueue::new(),
            search_timer: None,
            smoothing_timer: None,
            smoothing_target: false,
            pulse_timer: None,
            outbox: Vec::new(),
        }
    }

    pub fn form(&self) -> &FilterForm {
        &self.form
    }

    pub fn debounced_query(&self) -> &str {
        &self.debounced_query
    }

    pub fn viewport(&self) -> ViewportClass {
        self.viewport
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn display_limit(&self) -> usize {
        self.display_limit
    }

    pub fn is_filtering(&self) -> bool {
        self.is_filtering
    }

    /// Current URL query string (no leading `?`).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Time until the next pending timer fires.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    // =========================================================================
    // Form input
    // =========================================================================

    /// Record a keystroke. Filtering follows once the debounce window settles.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query == self.form.search_query {
            return;
        }
        self.form.search_query = query;

        self.timers.rearm(
            &mut self.search_timer,
            FilterTimer::CommitSearch,
            self.timings.search_debounce,
        );

        let pending = self.form.search_query.chars().count() >= self.timings.indicator_min_chars
            && self.form.search_query != self.debounced_query;
        self.smooth_filtering(pending);
    }

    /// Empty the search box and drop the filtering flag at once.
    pub fn clear_search(&mut self) {
        self.form.search_query.clear();
        if let Some(token) = self.smoothing_timer.take() {
            self.timers.cancel(token);
        }
        self.search_filtering = false;
        self.publish_filtering();
        self.timers.rearm(
            &mut self.search_timer,
            FilterTimer::CommitSearch,
            self.timings.search_debounce,
        );
    }

    pub fn set_sort_by(&mut self, key: SortKey) {
        if key != self.form.sort_by {
            self.form.sort_by = key;
            self.sort_changed();
        }
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        if direction != self.form.sort_direction {
            self.form.sort_direction = direction;
            self.sort_changed();
        }
    }

    pub fn toggle_sort_direction(&mut self) {
        self.set_sort_direction(self.form.sort_direction.toggled());
    }

    /// Restore defaults, clear the URL filter parameters and the filtering flag.
    pub fn reset(&mut self) {
        self.form = FilterForm::default();
        self.debounced_query.clear();
        self.timers.cancel_all();
        self.search_timer = None;
        self.smoothing_timer = None;
        self.pulse_timer = None;
        self.search_filtering = false;
        self.sort_pulse = false;
        self.publish_filtering();
        self.reset_paging();
        self.sync_url();
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Jump to a page (desktop). Out-of-range pages are clamped when deriving.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Show one more batch of `records` (mobile).
    ///
    /// Does nothing on desktop or once every matching record is displayed.
    /// Returns whether the display limit grew.
    pub fn load_more(&mut self, records: &[Patient]) -> bool {
        if !self.viewport.is_mobile() {
            return false;
        }
        let matching = filter_by_name(records, &self.debounced_query).len();
        if self.display_limit >= matching {
            return false;
        }
        self.display_limit += self.timings.items_per_page;
        true
    }

    pub fn set_viewport_width(&mut self, width: u32) {
        let viewport = ViewportClass::from_width(width, self.timings.mobile_breakpoint);
        if viewport != self.viewport {
            debug!(?viewport, width, "viewport class changed");
            self.viewport = viewport;
        }
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// Advance the logical clock, firing due timers one at a time.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<EngineEvent> {
        let target = self.timers.now() + elapsed;
        loop {
            match self.timers.next_deadline() {
                Some(wait) if self.timers.now() + wait <= target => {
                    for (token, timer) in self.timers.advance(wait) {
                        self.fire(token, timer);
                    }
                }
                _ => {
                    let rest = target.saturating_sub(self.timers.now());
                    self.timers.advance(rest);
                    break;
                }
            }
        }
        self.drain_events()
    }

    /// Take events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.outbox)
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Derive the displayed subset of `records` from the current state.
    pub fn view(&self, records: &[Patient]) -> ViewState {
        let derived = derive_view(
            records,
            &ViewInputs {
                query: &self.debounced_query,
                sort_by: Some(self.form.sort_by),
                sort_direction: self.form.sort_direction,
                viewport: self.viewport,
                current_page: self.current_page,
                display_limit: self.display_limit,
                items_per_page: self.timings.items_per_page,
            },
        );

        let has_more =
            self.viewport.is_mobile() && derived.filtered.len() > derived.paginated.len();
        let pages = match self.viewport {
            ViewportClass::Desktop => page_window(derived.current_page, derived.total_pages),
            ViewportClass::Mobile => Vec::new(),
        };

        ViewState {
            filtered_patients: derived.filtered,
            paginated_patients: derived.paginated,
            current_page: derived.current_page,
            total_pages: derived.total_pages,
            is_filtering: self.is_filtering,
            debounced_query: self.debounced_query.clone(),
            viewport: self.viewport,
            has_more,
            pages,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn fire(&mut self, token: TimerToken, timer: FilterTimer) {
        trace!(?timer, "timer fired");
        match timer {
            FilterTimer::CommitSearch => {
                clear_if(&mut self.search_timer, token);
                self.commit_search();
            }
            FilterTimer::SmoothFiltering(value) => {
                clear_if(&mut self.smoothing_timer, token);
                self.search_filtering = value;
                self.publish_filtering();
            }
            FilterTimer::EndSortPulse => {
                clear_if(&mut self.pulse_timer, token);
                self.sort_pulse = false;
                self.publish_filtering();
            }
        }
    }

    fn commit_search(&mut self) {
        if self.form.search_query != self.debounced_query {
            self.debounced_query = self.form.search_query.clone();
            debug!(query = %self.debounced_query, "search committed");
            self.reset_paging();
            self.outbox
                .push(EngineEvent::SearchCommitted(self.debounced_query.clone()));
            self.sync_url();
        }

        // The debounced query has caught up with the input.
        self.smooth_filtering(false);
    }

    /// Debounce the search-driven flag on its value: the smoothing window
    /// restarts only when the raw value flips, not on every keystroke.
    fn smooth_filtering(&mut self, pending: bool) {
        let target = match self.smoothing_timer {
            Some(_) => self.smoothing_target,
            None => self.search_filtering,
        };
        if pending == target {
            return;
        }
        self.smoothing_target = pending;
        self.timers.rearm(
            &mut self.smoothing_timer,
            FilterTimer::SmoothFiltering(pending),
            self.timings.filtering_smoothing,
        );
    }

    fn sort_changed(&mut self) {
        self.reset_paging();
        self.sort_pulse = true;
        self.publish_filtering();
        self.timers.rearm(
            &mut self.pulse_timer,
            FilterTimer::EndSortPulse,
            self.timings.sort_pulse,
        );
        self.sync_url();
    }

    fn reset_paging(&mut self) {
        self.current_page = 1;
        self.display_limit = self.timings.items_per_page;
    }

    fn publish_filtering(&mut self) {
        let value = self.search_filtering || self.sort_pulse;
        if value != self.is_filtering {
            self.is_filtering = value;
            self.outbox.push(EngineEvent::FilteringChanged(value));
        }
    }

    fn sync_url(&mut self) {
        let settled = FilterForm {
            search_query: self.debounced_query.clone(),
            ..self.form.clone()
        };
        let location = merge_query(&self.location, &settled);
        if location != self.location {
            debug!(%location, "url query replaced");
            self.location = location.clone();
            self.outbox.push(EngineEvent::UrlReplaced(location));
        }
    }
}

fn clear_if(slot: &mut Option<TimerToken>, token: TimerToken) {
    if *slot == Some(token) {
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn engine() -> FilterEngine {
        FilterEngine::new(FilterTimings::default(), 1280)
    }

    #[test]
    fn test_short_query_never_flags() {
        let mut engine = engine();
        engine.set_search_query("jo");
        let events = engine.advance(ms(1000));
        assert!(!events.contains(&EngineEvent::FilteringChanged(true)));
        assert_eq!(engine.debounced_query(), "jo");
    }

    #[test]
    fn test_sort_pulse() {
        let mut engine = engine();
        engine.set_sort_by(SortKey::Id);
        assert!(engine.is_filtering());
        assert_eq!(engine.location(), "sort=id");

        engine.advance(ms(249));
        assert!(engine.is_filtering());
        engine.advance(ms(1));
        assert!(!engine.is_filtering());
    }

    #[test]
    fn test_same_sort_is_noop() {
        let mut engine = engine();
        engine.set_sort_by(SortKey::Name);
        assert!(!engine.is_filtering());
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_flag_raised_while_typing() {
        let mut engine = engine();
        engine.set_search_query("j");
        engine.advance(ms(100));
        engine.set_search_query("jo");
        engine.advance(ms(100));
        engine.set_search_query("joh");
        engine.advance(ms(100));
        assert!(!engine.is_filtering());

        // Further keystrokes keep the flag's smoothing window running.
        engine.set_search_query("john");
        engine.advance(ms(49));
        assert!(!engine.is_filtering());
        engine.advance(ms(1));
        assert!(engine.is_filtering());
        engine.advance(ms(50));

        let mut typed = String::from("john");
        for c in "nyappleseed".chars() {
            typed.push(c);
            engine.set_search_query(typed.clone());
            engine.advance(ms(100));
            assert!(engine.is_filtering(), "flag dropped after {typed:?}");
        }
        assert_eq!(engine.debounced_query(), "");

        engine.advance(ms(200));
        assert_eq!(engine.debounced_query(), "johnnyappleseed");
        assert!(engine.is_filtering());
        engine.advance(ms(150));
        assert!(!engine.is_filtering());
    }

    #[test]
    fn test_clear_search() {
        let mut engine = engine();
        engine.set_search_query("johnny");
        engine.advance(ms(200));
        assert!(engine.is_filtering());

        engine.clear_search();
        assert!(!engine.is_filtering());
        assert_eq!(engine.form().search_query, "");
        engine.advance(ms(300));
        assert_eq!(engine.debounced_query(), "");
    }

    #[test]
    fn test_from_location() {
        let engine = FilterEngine::from_location(FilterTimings::default(), "?q=ann&dir=desc", 400);
        assert_eq!(engine.debounced_query(), "ann");
        assert_eq!(engine.form().sort_direction, SortDirection::Desc);
        assert_eq!(engine.viewport(), ViewportClass::Mobile);
        assert_eq!(engine.location(), "q=ann&dir=desc");
    }
}
