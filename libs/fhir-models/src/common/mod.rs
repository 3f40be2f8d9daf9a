//! Version-independent machinery
//!
//! Errors, the `[x]` choice-element codec and JSON rendering shared by every
//! FHIR version module.

pub mod choice;
pub mod error;
pub mod json;

// Re-export commonly used types
pub use choice::{ChoiceType, ChoiceValue};
pub use error::{Error, Result};
pub use json::FhirJson;
