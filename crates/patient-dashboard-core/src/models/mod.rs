//! Domain models for the patient dashboard.

mod filter;
mod patient;
mod validation;

pub use filter::*;
pub use patient::*;
pub use validation::*;
