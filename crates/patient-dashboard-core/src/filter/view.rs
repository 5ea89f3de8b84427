//! Pure derivation of the displayed patient subset.

use std::cmp::Ordering;

use crate::models::{Patient, SortDirection, SortKey, ViewportClass};

/// Inputs that determine the displayed subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInputs<'a> {
    /// Settled (debounced) search text
    pub query: &'a str,
    /// `None` keeps the incoming order
    pub sort_by: Option<SortKey>,
    pub sort_direction: SortDirection,
    pub viewport: ViewportClass,
    pub current_page: usize,
    pub display_limit: usize,
    pub items_per_page: usize,
}

/// Result of [`derive_view`].
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView {
    /// Every record matching the query, in display order
    pub filtered: Vec<Patient>,
    /// The slice to render for the active pagination mode
    pub paginated: Vec<Patient>,
    /// Requested page clamped into `1..=total_pages`
    pub current_page: usize,
    pub total_pages: usize,
}

/// Case-insensitive substring match on the name. An empty query matches all.
pub fn filter_by_name(records: &[Patient], query: &str) -> Vec<Patient> {
    if query.is_empty() {
        return records.to_vec();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

fn compare_names(a: &Patient, b: &Patient) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

fn compare_created(a: &Patient, b: &Patient) -> Ordering {
    match (a.created_at_parsed(), b.created_at_parsed()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.created_at.cmp(&b.created_at),
    }
}

// Ids that are not integers (e.g. locally minted ones) sort after numeric ids.
fn compare_ids(a: &Patient, b: &Patient) -> Ordering {
    match (a.id.parse::<i64>(), b.id.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.id.cmp(&b.id),
    }
}

/// Sort in place ascending by `key`, then reverse for descending order.
pub fn sort_patients(patients: &mut [Patient], key: Option<SortKey>, direction: SortDirection) {
    let Some(key) = key else {
        return;
    };

    match key {
        SortKey::Name => patients.sort_by(compare_names),
        SortKey::CreatedAt => patients.sort_by(compare_created),
        SortKey::Id => patients.sort_by(compare_ids),
    }

    if direction == SortDirection::Desc {
        patients.reverse();
    }
}

/// Number of pages needed for `count` items.
pub fn total_pages(count: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    count.div_ceil(per_page)
}

/// Filter, sort and paginate `records`.
pub fn derive_view(records: &[Patient], inputs: &ViewInputs<'_>) -> DerivedView {
    let mut filtered = filter_by_name(records, inputs.query);
    sort_patients(&mut filtered, inputs.sort_by, inputs.sort_direction);

    let total_pages = total_pages(filtered.len(), inputs.items_per_page);
    let current_page = inputs.current_page.clamp(1, total_pages.max(1));

    let paginated = match inputs.viewport {
        ViewportClass::Desktop => {
            let start = (current_page - 1) * inputs.items_per_page;
            let end = (start + inputs.items_per_page).min(filtered.len());
            filtered.get(start..end).map(<[Patient]>::to_vec).unwrap_or_default()
        }
        ViewportClass::Mobile => {
            let end = inputs.display_limit.min(filtered.len());
            filtered[..end].to_vec()
        }
    };

    DerivedView {
        filtered,
        paginated,
        current_page,
        total_pages,
    }
}
