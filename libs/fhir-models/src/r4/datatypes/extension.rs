//! Extensions and modifier extensions
//!
//! Every element can carry `extension` entries, which a consumer may ignore.
//! Backbone elements and domain resources can also carry `modifierExtension`
//! entries, which change the meaning of the element: a consumer that does not
//! understand one must not process the element as if it were absent.

use super::any_value::AnyValue;
use crate::common::choice::open_choice;
use crate::common::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// FHIR Extension
///
/// Additional content defined by implementations, identified by `url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    /// Unique id for inter-element referencing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Nested extensions (complex extension)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Identifies the meaning of the extension
    pub url: String,

    /// Value of extension
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub value: Option<ExtensionValue>,
}

open_choice! {
    /// `Extension.value[x]`
    pub struct ExtensionValue(AnyValue) = "value";
}

impl Extension {
    /// Create a simple extension holding a single value
    pub fn new(url: impl Into<String>, value: AnyValue) -> Self {
        Self {
            id: None,
            extension: None,
            url: url.into(),
            value: Some(ExtensionValue(value)),
        }
    }

    /// Create a complex extension made of nested extensions
    pub fn complex(url: impl Into<String>, extension: Vec<Extension>) -> Self {
        Self {
            id: None,
            extension: Some(extension),
            url: url.into(),
            value: None,
        }
    }

    /// The value, if this is a simple extension
    pub fn value(&self) -> Option<&AnyValue> {
        self.value.as_ref().map(ExtensionValue::value)
    }
}

/// Access to the extension slots of an element.
///
/// Extensions keep document order, since consumers may rely on meeting
/// modifier extensions in the order they were written.
pub trait HasExtensions {
    /// FHIR name of the element type, used in error paths.
    const TYPE_NAME: &'static str;

    fn extensions(&self) -> &[Extension];

    /// Elements without a `modifierExtension` slot report none.
    fn modifier_extensions(&self) -> &[Extension] {
        &[]
    }

    /// Extensions with the given url, in document order
    fn extensions_by_url(&self, url: &str) -> Vec<&Extension> {
        self.extensions().iter().filter(|e| e.url == url).collect()
    }

    /// First extension with the given url
    fn extension_by_url(&self, url: &str) -> Option<&Extension> {
        self.extensions().iter().find(|e| e.url == url)
    }

    /// Modifier extensions whose url is not in `understood`, in document order
    fn unrecognized_modifier_extensions(&self, understood: &[&str]) -> Vec<&Extension> {
        self.modifier_extensions()
            .iter()
            .filter(|e| !understood.contains(&e.url.as_str()))
            .collect()
    }

    /// Fail on the first modifier extension whose url is not in `understood`.
    fn ensure_modifiers_understood(&self, understood: &[&str]) -> Result<()> {
        match self.unrecognized_modifier_extensions(understood).first() {
            Some(extension) => Err(Error::UnrecognizedModifierExtension {
                path: Self::TYPE_NAME.to_string(),
                url: extension.url.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Implement [`HasExtensions`] from the standard `extension` /
/// `modifierExtension` fields, along with [`FhirJson`] and `Display`.
///
/// [`FhirJson`]: crate::common::FhirJson
macro_rules! impl_has_extensions {
    (@slots $ty:ident) => {
        impl $crate::r4::datatypes::HasExtensions for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn extensions(&self) -> &[$crate::r4::datatypes::Extension] {
                self.extension.as_deref().unwrap_or(&[])
            }
        }
    };
    (@slots $ty:ident, modifier) => {
        impl $crate::r4::datatypes::HasExtensions for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn extensions(&self) -> &[$crate::r4::datatypes::Extension] {
                self.extension.as_deref().unwrap_or(&[])
            }

            fn modifier_extensions(&self) -> &[$crate::r4::datatypes::Extension] {
                self.modifier_extension.as_deref().unwrap_or(&[])
            }
        }
    };
    (element: $($ty:ident),+ $(,)?) => {
        $(
            $crate::r4::datatypes::impl_has_extensions!(@slots $ty);
            $crate::common::json::impl_fhir_json!($ty);
        )+
    };
    (backbone: $($ty:ident),+ $(,)?) => {
        $(
            $crate::r4::datatypes::impl_has_extensions!(@slots $ty, modifier);
            $crate::common::json::impl_fhir_json!($ty);
        )+
    };
}

pub(crate) use impl_has_extensions;

impl_has_extensions!(element: Extension);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ChoiceValue, FhirJson};
    use crate::r4::datatypes::{CodeableConcept, Coding};
    use serde_json::json;

    #[test]
    fn test_simple_extension_key() {
        let ext = Extension::new(
            "http://example.org/fhir/StructureDefinition/nickname",
            AnyValue::String("Bobby".to_string()),
        );
        let json = serde_json::to_value(&ext).unwrap();
        assert_eq!(
            json,
            json!({
                "url": "http://example.org/fhir/StructureDefinition/nickname",
                "valueString": "Bobby"
            })
        );
    }

    #[test]
    fn test_complex_extension_round_trip() {
        let json = json!({
            "url": "http://hl7.org/fhir/StructureDefinition/patient-nationality",
            "extension": [
                {
                    "url": "code",
                    "valueCodeableConcept": {
                        "coding": [{"system": "urn:iso:std:iso:3166", "code": "NL"}]
                    }
                },
                {"url": "period", "valuePeriod": {"start": "2009-03-14"}}
            ]
        });

        let ext: Extension = serde_json::from_value(json.clone()).unwrap();
        assert!(ext.value.is_none());
        let nested = ext.extension.as_ref().unwrap();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].url, "code");
        assert_eq!(
            nested[0].value(),
            Some(&AnyValue::CodeableConcept(CodeableConcept {
                coding: Some(vec![Coding::new("urn:iso:std:iso:3166", "NL")]),
                ..Default::default()
            }))
        );
        assert_eq!(nested[1].value().map(|v| v.type_name()), Some("Period"));

        assert_eq!(serde_json::to_value(&ext).unwrap(), json);
    }

    #[test]
    fn test_extension_lookup_by_url() {
        let ext = Extension::complex(
            "http://example.org/outer",
            vec![
                Extension::new("a", AnyValue::Boolean(true)),
                Extension::new("b", AnyValue::Integer(3)),
                Extension::new("a", AnyValue::Boolean(false)),
            ],
        );
        let found = ext.extensions_by_url("a");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].value(), Some(&AnyValue::Boolean(false)));
        assert_eq!(
            ext.extension_by_url("b").and_then(Extension::value),
            Some(&AnyValue::Integer(3))
        );
        assert!(ext.modifier_extensions().is_empty());
    }

    #[test]
    fn test_mistyped_value_is_rejected() {
        let result = Extension::from_json_value(&json!({
            "url": "http://example.org/count",
            "valueInteger": "abc"
        }));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_two_values_are_rejected() {
        let err = Extension::from_json_value(&json!({
            "url": "http://example.org/flag",
            "valueBoolean": true,
            "valueString": "yes"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("more than one value for `value[x]`"));
    }

    #[test]
    fn test_extension_displays_as_indented_json() {
        let ext = Extension::new("http://example.org/flag", AnyValue::Boolean(true));
        let expected = "{\n  \"url\": \"http://example.org/flag\",\n  \"valueBoolean\": true\n}";
        assert_eq!(ext.to_display_string(), expected);
        assert_eq!(ext.to_string(), expected);

        let value = ext.value.as_ref().unwrap();
        assert_eq!(value.to_string(), "{\n  \"valueBoolean\": true\n}");
    }
}
