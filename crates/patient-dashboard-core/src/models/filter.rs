//! Filter form state and the enums it is built from.

use serde::{Deserialize, Serialize};

/// Field used to order the patient list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Lexicographic by name
    #[default]
    Name,
    /// Chronological by creation timestamp
    CreatedAt,
    /// Numeric by id
    Id,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Name, SortKey::CreatedAt, SortKey::Id];

    /// Value used in the `sort` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::CreatedAt => "createdAt",
            SortKey::Id => "id",
        }
    }

    /// Parse a query parameter value. Unknown values yield `None`.
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_param() == value)
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Value used in the `dir` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// User-controlled filter inputs. Mirrored into the `q`, `sort` and `dir` query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterForm {
    pub search_query: String,
    pub sort_by: SortKey,
    pub sort_direction: SortDirection,
}

/// Coarse responsive mode selecting the pagination strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewportClass {
    /// Incremental "load more" list
    Mobile,
    /// Numbered pages (also used for tablets)
    Desktop,
}

impl ViewportClass {
    /// Classify a viewport width. Widths up to and including `breakpoint` are mobile.
    pub fn from_width(width: u32, breakpoint: u32) -> Self {
        if width <= breakpoint {
            ViewportClass::Mobile
        } else {
            ViewportClass::Desktop
        }
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self, ViewportClass::Mobile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_params() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::from_param(key.as_param()), Some(key));
        }
        assert_eq!(SortKey::from_param("species"), None);
    }

    #[test]
    fn test_direction_toggle() {
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled(), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("DESC"), None);
    }

    #[test]
    fn test_viewport_breakpoint() {
        assert_eq!(ViewportClass::from_width(768, 768), ViewportClass::Mobile);
        assert_eq!(ViewportClass::from_width(769, 768), ViewportClass::Desktop);
        assert_eq!(ViewportClass::from_width(320, 768), ViewportClass::Mobile);
    }
}
