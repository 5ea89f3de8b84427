//! Patient form validation.
//!
//! Mirrors the rules the edit/add forms enforce so the store rejects
//! the same inputs a form would.

use std::sync::OnceLock;

use regex::Regex;

use super::PatientFormData;

/// Maximum accepted name length, in characters.
pub const MAX_NAME_LEN: usize = 100;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9\s]+$").expect("valid name regex"))
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(https?://)([a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(/[-a-zA-Z0-9()@:%_+.~#?&=/]*)?$",
        )
        .expect("valid url regex")
    })
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a URL-valued optional field. Absent or blank values pass.
fn check_url(field: &'static str, value: Option<&str>, errors: &mut Vec<FieldError>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        if !url_pattern().is_match(v) {
            errors.push(FieldError {
                field,
                message: "Please enter a valid URL (e.g., https://example.com)",
            });
        }
    }
}

impl PatientFormData {
    /// Trim the name and turn blank optional fields into `None`.
    pub fn normalized(mut self) -> Self {
        fn blank_to_none(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        self.name = self.name.trim().to_string();
        self.avatar = blank_to_none(self.avatar);
        self.website = blank_to_none(self.website);
        self.description = self.description.filter(|s| !s.trim().is_empty());
        self
    }

    /// Validate all fields, collecting every failure.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = self.name.trim();

        if name.is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "Name is required",
            });
        } else if !name_pattern().is_match(name) {
            errors.push(FieldError {
                field: "name",
                message: "Name should only contain letters, numbers, and spaces",
            });
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.push(FieldError {
                field: "name",
                message: "Name is too long (maximum 100 characters)",
            });
        }

        check_url("website", self.website.as_deref(), &mut errors);
        check_url("avatar", self.avatar.as_deref(), &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
