//! Patient models.

use serde::{Deserialize, Serialize};

/// Placeholder shown for patients whose name is blank.
pub const UNNAMED_PATIENT: &str = "Unnamed Patient";

/// A patient record as held by the record store and rendered by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Unique, stable once assigned. Remote records carry server ids, local ones are prefixed.
    pub id: String,
    /// Patient name
    pub name: String,
    /// Avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Website URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Creation timestamp (RFC 3339), immutable
    pub created_at: String,
    /// Last mutation timestamp (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Editable fields of a patient. System-managed fields (id, timestamps) are excluded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientFormData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl PatientFormData {
    /// Form data with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Patient {
    /// Build a new record from form data with a fresh creation timestamp.
    pub fn from_form(id: String, data: PatientFormData) -> Self {
        Self {
            id,
            name: data.name,
            avatar: data.avatar,
            description: data.description,
            website: data.website,
            created_at: chrono::Utc::now().to_rfc3339(),
            last_updated: None,
        }
    }

    /// Merge form data over this record and stamp `last_updated`.
    ///
    /// `id` and `created_at` are carried over untouched.
    pub fn merged_with(&self, data: &PatientFormData) -> Self {
        Self {
            id: self.id.clone(),
            name: data.name.clone(),
            avatar: data.avatar.clone(),
            description: data.description.clone(),
            website: data.website.clone(),
            created_at: self.created_at.clone(),
            last_updated: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Name to display, falling back to a placeholder for blank names.
    pub fn display_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            UNNAMED_PATIENT
        } else {
            trimmed
        }
    }

    /// Uppercased initials of the first and last words of the display name.
    pub fn initials(&self) -> String {
        let words: Vec<&str> = self.display_name().split_whitespace().collect();
        let first = words.first().and_then(|w| w.chars().next());
        let last = if words.len() > 1 {
            words.last().and_then(|w| w.chars().next())
        } else {
            None
        };

        first
            .into_iter()
            .chain(last)
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Parse `created_at` as a timestamp, if it is valid RFC 3339.
    pub fn created_at_parsed(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        chrono::DateTime::parse_from_rfc3339(&self.created_at).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(name: &str) -> Patient {
        Patient::from_form("1".into(), PatientFormData::named(name))
    }

    #[test]
    fn test_from_form_sets_created_at() {
        let p = patient("John Doe");
        assert_eq!(p.id, "1");
        assert!(p.created_at_parsed().is_some());
        assert!(p.last_updated.is_none());
    }

    #[test]
    fn test_merge_keeps_identity() {
        let p = patient("John Doe");
        let mut data = PatientFormData::named("Jane Doe");
        data.website = Some("https://example.com".into());

        let merged = p.merged_with(&data);
        assert_eq!(merged.id, p.id);
        assert_eq!(merged.created_at, p.created_at);
        assert_eq!(merged.name, "Jane Doe");
        assert_eq!(merged.website, Some("https://example.com".into()));
        assert!(merged.last_updated.is_some());
    }

    #[test]
    fn test_initials() {
        assert_eq!(patient("john ronald doe").initials(), "JD");
        assert_eq!(patient("Cher").initials(), "C");
        assert_eq!(patient("   ").initials(), "UP");
    }

    #[test]
    fn test_display_name_placeholder() {
        assert_eq!(patient("").display_name(), UNNAMED_PATIENT);
        assert_eq!(patient("  Max ").display_name(), "Max");
    }

    #[test]
    fn test_json_field_names() {
        let json = r#"{"id":"7","name":"Ann","createdAt":"2024-01-01T00:00:00Z","lastUpdated":"2024-02-01T00:00:00Z"}"#;
        let p: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(p.created_at, "2024-01-01T00:00:00Z");
        assert_eq!(p.last_updated.as_deref(), Some("2024-02-01T00:00:00Z"));
        assert!(p.avatar.is_none());

        let out = serde_json::to_value(&p).unwrap();
        assert!(out.get("createdAt").is_some());
        assert!(out.get("avatar").is_none());
    }
}
