//! FHIR R4 resources
//!
//! Each resource is a plain struct that serializes with `"resourceType"` as
//! its first key. [`Resource`] holds any one of them and dispatches on that
//! key when decoding, which is how `contained` resources, bundle entries and
//! `Parameters.parameter.resource` are represented.

pub mod account;
pub mod bundle;
pub mod code_system;
pub mod condition;
pub mod medication;
pub mod medication_request;
pub mod observation;
pub mod operation_outcome;
pub mod parameters;
pub mod patient;
pub mod structure_definition;
pub mod structure_map;
pub mod value_set;

pub use account::*;
pub use bundle::*;
pub use code_system::*;
pub use condition::*;
pub use medication::*;
pub use medication_request::*;
pub use observation::*;
pub use operation_outcome::*;
pub use parameters::*;
pub use patient::*;
pub use structure_definition::*;
pub use structure_map::*;
pub use value_set::*;

use crate::common::error::{Error, Result};
use crate::common::json::FhirJson;
use crate::r4::datatypes::{
    Dosage, ElementDefinition, Extension, HasExtensions, Meta, Narrative, Reference, Timing,
};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A modifier extension together with the path of the element carrying it,
/// e.g. `Account.coverage[0]`.
pub type ModifierExtensionAt<'a> = (String, &'a Extension);

/// Behaviour shared by every resource type
pub trait FhirResource: FhirJson + ModifierExtensionWalk {
    /// Value of `resourceType`
    const RESOURCE_TYPE: &'static str;

    /// Logical id of this artifact
    fn id(&self) -> Option<&str>;

    /// Metadata about the resource
    fn meta(&self) -> Option<&Meta>;

    /// Wrap into the polymorphic [`Resource`]
    fn into_resource(self) -> Resource;
}

/// A resource with narrative, extensions and contained resources
pub trait DomainResource: FhirResource + HasExtensions {
    /// Text summary of the resource, for human interpretation
    fn text(&self) -> Option<&Narrative>;

    /// Contained, inline resources
    fn contained(&self) -> &[Resource];

    /// Find a contained resource by its local id
    fn find_contained(&self, id: &str) -> Option<&Resource> {
        self.contained().iter().find(|r| r.id() == Some(id))
    }

    /// Resolve a local `#id` reference against the contained resources.
    ///
    /// References of any other form are resolved outside this crate and
    /// return `None`.
    fn resolve(&self, reference: &Reference) -> Option<&Resource> {
        reference.local_id().and_then(|id| self.find_contained(id))
    }
}

/// Walks an element tree collecting modifier extensions in document order.
pub trait ModifierExtensionWalk {
    /// Append every modifier extension at or below `self` to `out`, with
    /// paths rooted at `path`.
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>);
}

pub(crate) fn push_own<'a, T: HasExtensions>(
    element: &'a T,
    path: &str,
    out: &mut Vec<ModifierExtensionAt<'a>>,
) {
    out.extend(
        element
            .modifier_extensions()
            .iter()
            .map(|extension| (path.to_string(), extension)),
    );
}

pub(crate) fn walk_one<'a, T: ModifierExtensionWalk>(
    item: &'a Option<T>,
    path: &str,
    out: &mut Vec<ModifierExtensionAt<'a>>,
) {
    if let Some(item) = item {
        item.walk_modifier_extensions(path, out);
    }
}

pub(crate) fn walk_each<'a, T: ModifierExtensionWalk>(
    items: &'a Option<Vec<T>>,
    path: &str,
    out: &mut Vec<ModifierExtensionAt<'a>>,
) {
    for (index, item) in items.iter().flatten().enumerate() {
        item.walk_modifier_extensions(&format!("{}[{}]", path, index), out);
    }
}

/// Check that a JSON object is tagged as the resource type `expected`.
pub(crate) fn check_resource_type(value: &Value, expected: &str) -> Result<()> {
    match value.get("resourceType").and_then(Value::as_str) {
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(Error::InvalidResource(format!(
            "expected resourceType `{}`, found `{}`",
            expected, found
        ))),
        None => Err(Error::InvalidResource(format!(
            "missing resourceType, expected `{}`",
            expected
        ))),
    }
}

/// Contained resources first, then the resource's own modifier extensions.
pub(crate) fn walk_domain<'a, T: DomainResource>(
    resource: &'a T,
    path: &str,
    out: &mut Vec<ModifierExtensionAt<'a>>,
) {
    for (index, contained) in resource.contained().iter().enumerate() {
        contained.walk_modifier_extensions(&format!("{}.contained[{}]", path, index), out);
    }
    push_own(resource, path, out);
}

/// Backbone elements with no nested backbone elements.
macro_rules! walk_leaf {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::r4::resources::ModifierExtensionWalk for $ty {
                fn walk_modifier_extensions<'a>(
                    &'a self,
                    path: &str,
                    out: &mut Vec<$crate::r4::resources::ModifierExtensionAt<'a>>,
                ) {
                    $crate::r4::resources::push_own(self, path, out);
                }
            }
        )+
    };
}

/// Implement the resource traits from the standard Resource and
/// DomainResource fields.
macro_rules! impl_resource {
    (base: $($ty:ident),+ $(,)?) => {
        $(
            impl $crate::r4::resources::FhirResource for $ty {
                const RESOURCE_TYPE: &'static str = stringify!($ty);

                fn id(&self) -> Option<&str> {
                    self.id.as_deref()
                }

                fn meta(&self) -> Option<&$crate::r4::datatypes::Meta> {
                    self.meta.as_ref()
                }

                fn into_resource(self) -> $crate::r4::resources::Resource {
                    $crate::r4::resources::Resource::$ty(Box::new(self))
                }
            }

            // The struct derives with `remote = "Self"`; these wrap the
            // generated functions so that `resourceType` is checked on input.
            impl ::serde::Serialize for $ty {
                fn serialize<S: ::serde::Serializer>(
                    &self,
                    serializer: S,
                ) -> ::std::result::Result<S::Ok, S::Error> {
                    $ty::serialize(self, serializer)
                }
            }

            impl<'de> ::serde::Deserialize<'de> for $ty {
                fn deserialize<D: ::serde::Deserializer<'de>>(
                    deserializer: D,
                ) -> ::std::result::Result<Self, D::Error> {
                    let value = <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                    $crate::r4::resources::check_resource_type(&value, stringify!($ty))
                        .map_err(<D::Error as ::serde::de::Error>::custom)?;
                    $ty::deserialize(value).map_err(<D::Error as ::serde::de::Error>::custom)
                }
            }

            impl $crate::common::json::FhirJson for $ty {
                fn from_json_str(json: &str) -> $crate::common::error::Result<Self> {
                    let value: ::serde_json::Value = ::serde_json::from_str(json)?;
                    <Self as $crate::common::json::FhirJson>::from_json_value(&value)
                }

                fn from_json_value(value: &::serde_json::Value) -> $crate::common::error::Result<Self> {
                    $crate::r4::resources::check_resource_type(value, stringify!($ty))?;
                    Ok($ty::deserialize(value.clone())?)
                }
            }

            $crate::common::json::impl_fhir_json!(display: $ty);
        )+
    };
    (domain: $($ty:ident),+ $(,)?) => {
        $(
            $crate::r4::resources::impl_resource!(base: $ty);

            impl $crate::r4::resources::DomainResource for $ty {
                fn text(&self) -> Option<&$crate::r4::datatypes::Narrative> {
                    self.text.as_ref()
                }

                fn contained(&self) -> &[$crate::r4::resources::Resource] {
                    self.contained.as_deref().unwrap_or(&[])
                }
            }

            $crate::r4::datatypes::impl_has_extensions!(@slots $ty, modifier);
        )+
    };
}

pub(crate) use impl_resource;
pub(crate) use walk_leaf;

walk_leaf!(Timing, ElementDefinition);

impl ModifierExtensionWalk for Dosage {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        push_own(self, path, out);
        walk_one(&self.timing, &format!("{}.timing", path), out);
    }
}

macro_rules! resource_enum {
    (
        base: [$($base:ident),+ $(,)?],
        domain: [$($domain:ident),+ $(,)?] $(,)?
    ) => {
        /// Any FHIR R4 resource, discriminated by `resourceType`
        #[derive(Debug, Clone, PartialEq)]
        pub enum Resource {
            $( $base(Box<$base>), )+
            $( $domain(Box<$domain>), )+
        }

        /// Every `resourceType` that [`Resource`] can decode
        pub const RESOURCE_TYPES: &[&str] = &[
            $( stringify!($base), )+
            $( stringify!($domain), )+
        ];

        impl Resource {
            /// Value of `resourceType`
            pub fn resource_type(&self) -> &'static str {
                match self {
                    $( Self::$base(_) => stringify!($base), )+
                    $( Self::$domain(_) => stringify!($domain), )+
                }
            }

            /// Logical id of the resource
            pub fn id(&self) -> Option<&str> {
                match self {
                    $( Self::$base(r) => r.id.as_deref(), )+
                    $( Self::$domain(r) => r.id.as_deref(), )+
                }
            }

            pub fn meta(&self) -> Option<&Meta> {
                match self {
                    $( Self::$base(r) => r.meta.as_ref(), )+
                    $( Self::$domain(r) => r.meta.as_ref(), )+
                }
            }

            /// Whether this is a DomainResource (has text, contained and extensions)
            pub fn is_domain_resource(&self) -> bool {
                match self {
                    $( Self::$base(_) => false, )+
                    $( Self::$domain(_) => true, )+
                }
            }

            /// Narrative of a DomainResource
            pub fn text(&self) -> Option<&Narrative> {
                match self {
                    $( Self::$base(_) => None, )+
                    $( Self::$domain(r) => r.text.as_ref(), )+
                }
            }

            /// Contained resources; empty for Bundle and Parameters
            pub fn contained(&self) -> &[Resource] {
                match self {
                    $( Self::$base(_) => &[], )+
                    $( Self::$domain(r) => r.contained.as_deref().unwrap_or(&[]), )+
                }
            }

            /// Resource-level extensions; empty for Bundle and Parameters
            pub fn extensions(&self) -> &[Extension] {
                match self {
                    $( Self::$base(_) => &[], )+
                    $( Self::$domain(r) => r.extension.as_deref().unwrap_or(&[]), )+
                }
            }

            /// Resource-level modifier extensions; empty for Bundle and Parameters
            pub fn modifier_extensions(&self) -> &[Extension] {
                match self {
                    $( Self::$base(_) => &[], )+
                    $( Self::$domain(r) => r.modifier_extension.as_deref().unwrap_or(&[]), )+
                }
            }

            fn decode(resource_type: &str, value: Value) -> Option<serde_json::Result<Self>> {
                match resource_type {
                    $(
                        stringify!($base) => Some(
                            serde_json::from_value::<$base>(value).map(|r| Self::$base(Box::new(r))),
                        ),
                    )+
                    $(
                        stringify!($domain) => Some(
                            serde_json::from_value::<$domain>(value)
                                .map(|r| Self::$domain(Box::new(r))),
                        ),
                    )+
                    _ => None,
                }
            }
        }

        impl Serialize for Resource {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                match self {
                    $( Self::$base(r) => r.serialize(serializer), )+
                    $( Self::$domain(r) => r.serialize(serializer), )+
                }
            }
        }

        impl ModifierExtensionWalk for Resource {
            fn walk_modifier_extensions<'a>(
                &'a self,
                path: &str,
                out: &mut Vec<ModifierExtensionAt<'a>>,
            ) {
                match self {
                    $( Self::$base(r) => r.walk_modifier_extensions(path, out), )+
                    $( Self::$domain(r) => r.walk_modifier_extensions(path, out), )+
                }
            }
        }

        $(
            impl From<$base> for Resource {
                fn from(resource: $base) -> Self {
                    Self::$base(Box::new(resource))
                }
            }
        )+
        $(
            impl From<$domain> for Resource {
                fn from(resource: $domain) -> Self {
                    Self::$domain(Box::new(resource))
                }
            }
        )+
    };
}

resource_enum! {
    base: [Bundle, Parameters],
    domain: [
        Account,
        CodeSystem,
        Condition,
        Medication,
        MedicationRequest,
        Observation,
        OperationOutcome,
        Patient,
        StructureDefinition,
        StructureMap,
        ValueSet,
    ],
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let resource_type = value
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or_else(|| <D::Error as de::Error>::missing_field("resourceType"))?
            .to_string();

        debug!(resource_type = %resource_type, "decoding resource");
        match Resource::decode(&resource_type, value) {
            Some(decoded) => decoded.map_err(de::Error::custom),
            None => {
                warn!(resource_type = %resource_type, "unknown resource type");
                Err(de::Error::unknown_variant(&resource_type, RESOURCE_TYPES))
            }
        }
    }
}

crate::common::json::impl_fhir_json!(Resource);

impl Resource {
    /// Every modifier extension in the resource, its contained resources and,
    /// for a Bundle, its entry resources, in document order.
    pub fn collect_modifier_extensions(&self) -> Vec<ModifierExtensionAt<'_>> {
        let mut out = Vec::new();
        self.walk_modifier_extensions(self.resource_type(), &mut out);
        out
    }

    /// Modifier extensions whose url is not in `understood`
    pub fn unrecognized_modifier_extensions(&self, understood: &[&str]) -> Vec<ModifierExtensionAt<'_>> {
        self.collect_modifier_extensions()
            .into_iter()
            .filter(|(_, extension)| !understood.contains(&extension.url.as_str()))
            .collect()
    }

    /// Fail on the first modifier extension whose url is not in `understood`.
    ///
    /// A processor that cannot interpret a modifier extension must not treat
    /// the resource as if the extension were absent.
    pub fn ensure_modifiers_understood(&self, understood: &[&str]) -> Result<()> {
        match self.unrecognized_modifier_extensions(understood).into_iter().next() {
            Some((path, extension)) => {
                warn!(path = %path, url = %extension.url, "unrecognized modifier extension");
                Err(Error::UnrecognizedModifierExtension {
                    path,
                    url: extension.url.clone(),
                })
            }
            None => Ok(()),
        }
    }

    /// Find a contained resource by its local id
    pub fn find_contained(&self, id: &str) -> Option<&Resource> {
        self.contained().iter().find(|r| r.id() == Some(id))
    }

    /// Local `#id` references that match no contained resource.
    ///
    /// For a Bundle each entry resource is checked against its own contained
    /// resources.
    pub fn unresolved_local_references(&self) -> Result<Vec<String>> {
        if let Resource::Bundle(bundle) = self {
            let mut unresolved = Vec::new();
            for resource in bundle.resources() {
                unresolved.extend(resource.unresolved_local_references()?);
            }
            return Ok(unresolved);
        }

        let ids: HashSet<&str> = self.contained().iter().filter_map(Resource::id).collect();
        let mut references = Vec::new();
        collect_local_references(&self.to_json_value()?, &mut references);

        let unresolved: Vec<String> = references
            .into_iter()
            .filter(|reference| {
                let id = &reference[1..];
                !id.is_empty() && !ids.contains(id)
            })
            .collect();
        if !unresolved.is_empty() {
            debug!(
                resource_type = self.resource_type(),
                count = unresolved.len(),
                "unresolved local references"
            );
        }
        Ok(unresolved)
    }
}

fn collect_local_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::String(s) if key == "reference" && s.starts_with('#') => {
                        out.push(s.clone())
                    }
                    _ => collect_local_references(child, out),
                }
            }
        }
        Value::Array(items) => items
            .iter()
            .for_each(|item| collect_local_references(item, out)),
        _ => {}
    }
}
