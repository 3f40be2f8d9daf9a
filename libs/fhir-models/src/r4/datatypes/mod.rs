//! FHIR R4 data types
//!
//! Every complex type carries an optional `id` and an ordered `extension`
//! list. Backbone-derived types (`Timing`, `Dosage`, `ElementDefinition`) also
//! carry `modifierExtension`.

pub mod any_value;
pub mod element_definition;
pub mod extension;
pub mod general;
pub mod metadata;
pub mod special;

pub use any_value::AnyValue;
pub use element_definition::*;
pub use extension::{Extension, ExtensionValue, HasExtensions};
pub use general::*;
pub use metadata::*;
pub use special::*;

pub(crate) use extension::impl_has_extensions;
