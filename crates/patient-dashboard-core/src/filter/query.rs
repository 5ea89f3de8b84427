//! Mapping between [`FilterForm`] and URL query parameters.
//!
//! `q`, `sort` and `dir` carry the search text, sort key and direction.
//! Parameters equal to their default are omitted; absent or unrecognized
//! values read back as the default.

use url::form_urlencoded;

use crate::models::{FilterForm, SortDirection, SortKey};

pub const QUERY_PARAM: &str = "q";
pub const SORT_PARAM: &str = "sort";
pub const DIR_PARAM: &str = "dir";

const FILTER_PARAMS: [&str; 3] = [QUERY_PARAM, SORT_PARAM, DIR_PARAM];

fn pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes()).into_owned()
}

/// Read filter state from a query string (with or without a leading `?`).
pub fn form_from_query(query: &str) -> FilterForm {
    let mut form = FilterForm::default();
    for (key, value) in pairs(query) {
        match key.as_str() {
            QUERY_PARAM => form.search_query = value,
            SORT_PARAM => form.sort_by = SortKey::from_param(&value).unwrap_or_default(),
            DIR_PARAM => {
                form.sort_direction = SortDirection::from_param(&value).unwrap_or_default()
            }
            _ => {}
        }
    }
    form
}

fn append_filter_params(serializer: &mut form_urlencoded::Serializer<'_, String>, form: &FilterForm) {
    if !form.search_query.is_empty() {
        serializer.append_pair(QUERY_PARAM, &form.search_query);
    }
    if form.sort_by != SortKey::default() {
        serializer.append_pair(SORT_PARAM, form.sort_by.as_param());
    }
    if form.sort_direction != SortDirection::default() {
        serializer.append_pair(DIR_PARAM, form.sort_direction.as_param());
    }
}

/// Encode filter state, omitting defaults. All-default state encodes as `""`.
pub fn form_to_query(form: &FilterForm) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    append_filter_params(&mut serializer, form);
    serializer.finish()
}

/// Rewrite the filter parameters of `existing`, keeping every other parameter.
pub fn merge_query(existing: &str, form: &FilterForm) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs(existing) {
        if !FILTER_PARAMS.contains(&key.as_str()) {
            serializer.append_pair(&key, &value);
        }
    }
    append_filter_params(&mut serializer, form);
    serializer.finish()
}
