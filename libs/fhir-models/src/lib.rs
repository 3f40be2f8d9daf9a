//! FHIR R4 data models
//!
//! Strongly-typed Rust structures for FHIR R4 resources and data types, with
//! JSON encoding that follows the FHIR JSON format.
//!
//! # Module Organization
//!
//! - `common`: Errors, the `[x]` choice-element codec and JSON helpers
//! - `r4`: R4 data types and resources
//!
//! # Conventions
//!
//! - **Optional and repeating elements** are `Option<T>` and `Option<Vec<T>>`;
//!   absent elements are never written.
//! - **Choice elements** (`onset[x]`) are enums whose JSON key is derived from
//!   the variant's FHIR type (`onsetDateTime`, `onsetPeriod`).
//! - **Resources** write `resourceType` first; [`r4::Resource`] decodes any
//!   supported resource by that key, including contained resources.
//! - **Modifier extensions** can be collected with their paths so that callers
//!   can refuse resources carrying modifiers they do not understand.
//!
//! # Example
//!
//! ```rust
//! use ferrum_r4::r4::resources::{Condition, ConditionOnset};
//! use ferrum_r4::FhirJson;
//! use serde_json::json;
//!
//! let condition = Condition::from_json_value(&json!({
//!     "resourceType": "Condition",
//!     "subject": {"reference": "Patient/example"},
//!     "onsetString": "childhood"
//! }))
//! .unwrap();
//!
//! assert_eq!(condition.onset, Some(ConditionOnset::String("childhood".to_string())));
//! assert!(condition.to_string().starts_with("{\n  \"resourceType\": \"Condition\""));
//! ```

pub mod common;
#[cfg(feature = "r4")]
pub mod r4;

// Re-export commonly used types
pub use common::*;
#[cfg(feature = "r4")]
pub use r4::{Resource, RESOURCE_TYPES};
