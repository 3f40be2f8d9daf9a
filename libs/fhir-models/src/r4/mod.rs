//! FHIR R4 (4.0.1) models
//!
//! - [`datatypes`]: primitive-backed and complex data types, `Extension`,
//!   `ElementDefinition` and the open `[x]` value type
//! - [`resources`]: resource structs and the polymorphic [`Resource`]

pub mod datatypes;
pub mod resources;

pub use datatypes::{AnyValue, Extension, HasExtensions};
pub use resources::{
    DomainResource, FhirResource, ModifierExtensionAt, ModifierExtensionWalk, Resource,
    RESOURCE_TYPES,
};

/// FHIR version implemented by this module
pub const FHIR_VERSION: &str = "4.0.1";
