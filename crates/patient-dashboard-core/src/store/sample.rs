//! Bundled sample dataset used when the endpoint is unreachable.

use super::StoreResult;
use crate::models::Patient;

const SAMPLE_PATIENTS_JSON: &str = include_str!("../../data/sample_patients.json");

/// Parse the bundled sample dataset.
pub fn sample_patients() -> StoreResult<Vec<Patient>> {
    Ok(serde_json::from_str(SAMPLE_PATIENTS_JSON)?)
}
