//! Filter engine integration tests.

use std::time::Duration;

use patient_dashboard_core::config::FilterTimings;
use patient_dashboard_core::filter::{
    filter_by_name, sort_patients, EngineEvent, FilterEngine, PageItem,
};
use patient_dashboard_core::models::{Patient, SortDirection, SortKey, ViewportClass};
use proptest::prelude::*;

const DESKTOP: u32 = 1280;
const MOBILE: u32 = 390;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn make_patient(id: usize, name: &str) -> Patient {
    Patient {
        id: id.to_string(),
        name: name.to_string(),
        avatar: None,
        description: None,
        website: None,
        created_at: format!("2024-01-{:02}T08:00:00Z", (id % 28) + 1),
        last_updated: None,
    }
}

/// 25 patients whose names all contain "patient".
fn twenty_five() -> Vec<Patient> {
    (1..=25)
        .map(|i| make_patient(i, &format!("Patient {i:02}")))
        .collect()
}

fn committed(events: &[EngineEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::SearchCommitted(q) => Some(q.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_typing_commits_once_with_final_value() {
    let mut engine = FilterEngine::new(FilterTimings::default(), DESKTOP);
    let mut events = Vec::new();

    engine.set_search_query("j");
    events.extend(engine.advance(ms(100)));
    engine.set_search_query("jo");
    events.extend(engine.advance(ms(100)));
    engine.set_search_query("joh");
    events.extend(engine.advance(ms(299)));
    assert!(committed(&events).is_empty());
    assert_eq!(engine.debounced_query(), "");

    events.extend(engine.advance(ms(1)));
    assert_eq!(committed(&events), vec!["joh".to_string()]);
    assert_eq!(engine.debounced_query(), "joh");

    events.extend(engine.advance(ms(1000)));
    assert_eq!(committed(&events).len(), 1);
}

#[test]
fn test_filtering_flag_is_smoothed() {
    let mut engine = FilterEngine::new(FilterTimings::default(), DESKTOP);

    engine.set_search_query("john");
    engine.advance(ms(149));
    assert!(!engine.is_filtering());

    let events = engine.advance(ms(1));
    assert!(engine.is_filtering());
    assert_eq!(events, vec![EngineEvent::FilteringChanged(true)]);

    // Commit at 300ms, then the flag clears after another smoothing window.
    engine.advance(ms(150));
    assert_eq!(engine.debounced_query(), "john");
    assert!(engine.is_filtering());
    engine.advance(ms(150));
    assert!(!engine.is_filtering());
}

#[test]
fn test_url_reflects_settled_state() {
    let mut engine = FilterEngine::from_location(FilterTimings::default(), "tab=all", DESKTOP);

    engine.set_search_query("mary ann");
    assert_eq!(engine.location(), "tab=all");

    let events = engine.advance(ms(300));
    assert!(events.contains(&EngineEvent::UrlReplaced("tab=all&q=mary+ann".to_string())));

    engine.set_sort_by(SortKey::CreatedAt);
    engine.toggle_sort_direction();
    assert_eq!(engine.location(), "tab=all&q=mary+ann&sort=createdAt&dir=desc");

    engine.set_sort_by(SortKey::Name);
    engine.toggle_sort_direction();
    assert_eq!(engine.location(), "tab=all&q=mary+ann");
}

#[test]
fn test_reset() {
    let mut engine = FilterEngine::from_location(FilterTimings::default(), "q=ann&sort=id", DESKTOP);
    engine.set_search_query("annabel");
    engine.advance(ms(200));
    engine.set_sort_direction(SortDirection::Desc);
    engine.set_page(3);
    assert!(engine.is_filtering());

    engine.reset();
    assert_eq!(engine.form().search_query, "");
    assert_eq!(engine.form().sort_by, SortKey::Name);
    assert_eq!(engine.debounced_query(), "");
    assert_eq!(engine.location(), "");
    assert!(!engine.is_filtering());
    assert_eq!(engine.current_page(), 1);
    assert_eq!(engine.next_deadline(), None);
}

#[test]
fn test_desktop_pagination() {
    let records = twenty_five();
    let mut engine = FilterEngine::new(FilterTimings::default(), DESKTOP);

    let view = engine.view(&records);
    assert_eq!(view.viewport, ViewportClass::Desktop);
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.paginated_patients.len(), 12);
    assert_eq!(view.pages, vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]);
    assert_eq!(view.summary().as_deref(), Some("Showing 12 of 25 patients"));

    engine.set_page(3);
    let view = engine.view(&records);
    assert_eq!(view.current_page, 3);
    assert_eq!(view.paginated_patients.len(), 1);
    assert_eq!(view.paginated_patients[0].name, "Patient 25");
}

#[test]
fn test_query_and_sort_changes_reset_page() {
    let records = twenty_five();
    let mut engine = FilterEngine::new(FilterTimings::default(), DESKTOP);

    engine.set_page(2);
    engine.set_search_query("patient");
    engine.advance(ms(300));
    assert_eq!(engine.current_page(), 1);

    engine.set_page(3);
    engine.set_sort_direction(SortDirection::Desc);
    let view = engine.view(&records);
    assert_eq!(view.current_page, 1);
    assert_eq!(view.paginated_patients[0].name, "Patient 25");
    assert_eq!(
        view.summary().as_deref(),
        Some("Showing 12 of 25 patients for \"patient\"")
    );
}

#[test]
fn test_mobile_load_more() {
    let records = twenty_five();
    let mut engine = FilterEngine::new(FilterTimings::default(), MOBILE);

    let view = engine.view(&records);
    assert_eq!(view.paginated_patients.len(), 12);
    assert!(view.has_more);
    assert!(view.pages.is_empty());

    assert!(engine.load_more(&records));
    assert_eq!(engine.view(&records).paginated_patients.len(), 24);

    assert!(engine.load_more(&records));
    let view = engine.view(&records);
    assert_eq!(view.paginated_patients.len(), 25);
    assert!(!view.has_more);
    assert_eq!(view.summary().as_deref(), Some("Showing 25 patients"));
    assert!(!engine.load_more(&records));
    assert_eq!(engine.display_limit(), 36);

    engine.set_sort_by(SortKey::Id);
    assert_eq!(engine.display_limit(), 12);
    assert_eq!(engine.view(&records).paginated_patients.len(), 12);
}

#[test]
fn test_load_more_ignored_on_desktop() {
    let records: Vec<Patient> = (1..=40).map(|i| make_patient(i, &format!("P {i}"))).collect();
    let mut engine = FilterEngine::new(FilterTimings::default(), DESKTOP);

    assert!(!engine.load_more(&records));
    assert!(!engine.load_more(&records));
    assert_eq!(engine.display_limit(), 12);

    engine.set_viewport_width(MOBILE);
    assert_eq!(engine.view(&records).paginated_patients.len(), 12);
}

#[test]
fn test_load_more_stops_at_end_of_list() {
    let few: Vec<Patient> = (1..=5).map(|i| make_patient(i, &format!("P {i}"))).collect();
    let mut engine = FilterEngine::new(FilterTimings::default(), MOBILE);

    for _ in 0..3 {
        assert!(!engine.load_more(&few));
    }
    assert_eq!(engine.display_limit(), 12);

    // More records arriving later reveal one batch, not the extra calls.
    let many: Vec<Patient> = (1..=40).map(|i| make_patient(i, &format!("P {i}"))).collect();
    assert_eq!(engine.view(&many).paginated_patients.len(), 12);
    assert!(engine.load_more(&many));
    assert_eq!(engine.view(&many).paginated_patients.len(), 24);
}

#[test]
fn test_viewport_switch() {
    let records = twenty_five();
    let mut engine = FilterEngine::new(FilterTimings::default(), DESKTOP);
    engine.set_viewport_width(768);
    assert_eq!(engine.view(&records).viewport, ViewportClass::Mobile);
    engine.set_viewport_width(769);
    assert_eq!(engine.view(&records).viewport, ViewportClass::Desktop);
}

#[test]
fn test_search_case_insensitive_through_engine() {
    let records = vec![make_patient(1, "John Doe"), make_patient(2, "Ann Smith")];
    let mut engine = FilterEngine::new(FilterTimings::default(), DESKTOP);
    engine.set_search_query("john");
    engine.advance(ms(300));

    let view = engine.view(&records);
    assert_eq!(view.filtered_patients.len(), 1);
    assert_eq!(view.filtered_patients[0].name, "John Doe");
    assert_eq!(view.summary().as_deref(), Some("Showing 1 of 1 patient for \"john\""));
}

fn names_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[A-Za-z]{1,8}( [A-Za-z]{1,8})?", 0..40)
        .prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_filter_is_idempotent(names in names_strategy(), query in "[a-z]{0,3}") {
        let records: Vec<Patient> = names
            .iter()
            .enumerate()
            .map(|(i, n)| make_patient(i + 1, n))
            .collect();

        let once = filter_by_name(&records, &query);
        let twice = filter_by_name(&records, &query);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(filter_by_name(&once, &query), once);
    }

    #[test]
    fn prop_desc_is_reverse_of_asc(names in names_strategy()) {
        let mut seen = std::collections::HashSet::new();
        let records: Vec<Patient> = names
            .iter()
            .filter(|n| seen.insert(n.to_lowercase()))
            .enumerate()
            .map(|(i, n)| make_patient(i + 1, n))
            .collect();

        let mut asc = records.clone();
        sort_patients(&mut asc, Some(SortKey::Name), SortDirection::Asc);
        let mut desc = records;
        sort_patients(&mut desc, Some(SortKey::Name), SortDirection::Desc);

        desc.reverse();
        prop_assert_eq!(asc, desc);
    }
}
