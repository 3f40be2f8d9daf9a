//! Polymorphic `[x]` elements
//!
//! A FHIR choice element holds exactly one value drawn from a fixed set of
//! types, and the JSON key carries the chosen type: `onset[x]` is written as
//! `onsetDateTime`, `onsetPeriod`, and so on. Each choice element is a Rust enum
//! with one variant per admitted type. The JSON key is always derived from the
//! element's base name and the variant's FHIR type name, never spelled out by
//! hand.
//!
//! Choice fields are flattened into their parent object. Optional ones decode
//! through [`optional`], so that a malformed or repeated element is an error
//! rather than an absent one:
//!
//! ```ignore
//! #[serde(
//!     flatten,
//!     skip_serializing_if = "Option::is_none",
//!     deserialize_with = "crate::common::choice::optional"
//! )]
//! pub onset: Option<ConditionOnset>,
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserializer, Serializer};

/// A value that is exactly one of an enumerated set of FHIR types.
pub trait ChoiceValue: Sized {
    /// FHIR type names admitted by this value, in their canonical casing
    /// (`dateTime`, `Period`, ...).
    const TYPES: &'static [&'static str];

    /// FHIR type name of the held value.
    fn type_name(&self) -> &'static str;

    /// Write the held value as a single map entry under `key`.
    fn serialize_entry<M: SerializeMap>(&self, key: &str, map: &mut M) -> Result<(), M::Error>;

    /// Read the pending map value as the variant for `type_name`.
    ///
    /// `type_name` is always one of [`ChoiceValue::TYPES`].
    fn deserialize_entry<'de, A: MapAccess<'de>>(
        type_name: &str,
        map: &mut A,
    ) -> Result<Self, A::Error>;
}

/// A choice value bound to a concrete element, e.g. `Condition.onset[x]`.
pub trait ChoiceType: ChoiceValue {
    /// Element name without the `[x]` suffix.
    const BASE_NAME: &'static str;

    /// JSON key for the held value (`onsetDateTime`).
    fn element_name(&self) -> String {
        element_name(Self::BASE_NAME, self.type_name())
    }

    /// Every JSON key this element may be written under.
    fn element_names() -> Vec<String> {
        Self::TYPES
            .iter()
            .map(|type_name| element_name(Self::BASE_NAME, type_name))
            .collect()
    }
}

/// Suffix a FHIR type contributes to a choice key: the type name with its
/// first letter upper-cased (`dateTime` -> `DateTime`).
pub fn fhir_type_suffix(type_name: &str) -> String {
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// JSON key for `base[x]` holding a value of `type_name`.
pub fn element_name(base: &str, type_name: &str) -> String {
    format!("{}{}", base, fhir_type_suffix(type_name))
}

/// Find the admitted type whose key suffix is `suffix`.
pub fn type_for_suffix(suffix: &str, types: &'static [&'static str]) -> Option<&'static str> {
    let first = suffix.chars().next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    let rest = &suffix[first.len_utf8()..];

    types.iter().copied().find(|type_name| {
        let mut chars = type_name.chars();
        chars.next().map(|c| c.to_ascii_uppercase()) == Some(first) && chars.as_str() == rest
    })
}

/// Serialize `value` as a one-entry map keyed by its element name.
pub fn serialize<T, S>(value: &T, base: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    T: ChoiceValue,
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(1))?;
    value.serialize_entry(&element_name(base, value.type_name()), &mut map)?;
    map.end()
}

/// Deserialize a choice value from the keys of the enclosing object.
///
/// Keys that do not belong to `base[x]` are skipped. More than one key for the
/// same element is rejected, and so is an object without one.
pub fn deserialize<'de, T, D>(base: &'static str, deserializer: D) -> Result<T, D::Error>
where
    T: ChoiceValue,
    D: Deserializer<'de>,
{
    deserializer
        .deserialize_map(ChoiceVisitor {
            base,
            marker: PhantomData,
        })?
        .ok_or_else(|| de::Error::missing_field(base))
}

/// `deserialize_with` target for an optional choice field flattened into its
/// parent.
///
/// No key for the element decodes to `None`. A repeated element or a value
/// that does not match its type is an error.
pub fn optional<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: ChoiceType,
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(ChoiceVisitor {
        base: T::BASE_NAME,
        marker: PhantomData,
    })
}

struct ChoiceVisitor<T> {
    base: &'static str,
    marker: PhantomData<T>,
}

impl<'de, T: ChoiceValue> Visitor<'de> for ChoiceVisitor<T> {
    type Value = Option<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "an object holding a `{}[x]` element", self.base)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut found: Option<T> = None;

        while let Some(key) = map.next_key::<String>()? {
            let type_name = key
                .strip_prefix(self.base)
                .and_then(|suffix| type_for_suffix(suffix, T::TYPES));

            match type_name {
                Some(type_name) => {
                    if found.is_some() {
                        return Err(de::Error::custom(format_args!(
                            "more than one value for `{}[x]`",
                            self.base
                        )));
                    }
                    found = Some(T::deserialize_entry(type_name, &mut map)?);
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(found)
    }
}

/// Declare the value enum of a choice element together with its FHIR type
/// table. Used directly for the shared open type and through
/// [`choice_type!`] for element-specific enums.
macro_rules! choice_value {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident($ty:ty) = $fhir:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant($ty), )+
        }

        impl $crate::common::choice::ChoiceValue for $name {
            const TYPES: &'static [&'static str] = &[$($fhir),+];

            fn type_name(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $fhir, )+
                }
            }

            fn serialize_entry<M: ::serde::ser::SerializeMap>(
                &self,
                key: &str,
                map: &mut M,
            ) -> ::std::result::Result<(), M::Error> {
                match self {
                    $( Self::$variant(value) => map.serialize_entry(key, value), )+
                }
            }

            fn deserialize_entry<'de, A: ::serde::de::MapAccess<'de>>(
                type_name: &str,
                map: &mut A,
            ) -> ::std::result::Result<Self, A::Error> {
                match type_name {
                    $( $fhir => map.next_value().map(Self::$variant), )+
                    other => Err(::serde::de::Error::unknown_variant(
                        other,
                        <Self as $crate::common::choice::ChoiceValue>::TYPES,
                    )),
                }
            }
        }
    };
}

/// Implement `Serialize`/`Deserialize` and [`FhirJson`](crate::common::FhirJson)
/// for a choice element named `$base[x]`.
macro_rules! choice_serde {
    ($name:ident, $base:literal) => {
        impl $crate::common::choice::ChoiceType for $name {
            const BASE_NAME: &'static str = $base;
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                $crate::common::choice::serialize(self, $base, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                $crate::common::choice::deserialize($base, deserializer)
            }
        }

        $crate::common::json::impl_fhir_json!($name);
    };
}

/// Declare a closed choice element.
///
/// ```ignore
/// choice_type! {
///     /// Estimated or actual date, date-time, or age
///     pub enum ConditionOnset("onset") {
///         DateTime(String) = "dateTime",
///         Age(Age) = "Age",
///     }
/// }
/// ```
macro_rules! choice_type {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($base:literal) { $($body:tt)* }
    ) => {
        $crate::common::choice::choice_value! {
            $(#[$meta])*
            $vis enum $name { $($body)* }
        }

        $crate::common::choice::choice_serde!($name, $base);
    };
}

/// Declare an element whose `[x]` admits the open type (any data type).
///
/// The generated newtype wraps the shared open value enum and only adds the
/// element's base name.
macro_rules! open_choice {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($inner:ty) = $base:literal;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name(pub $inner);

        impl $name {
            /// The wrapped value.
            pub fn value(&self) -> &$inner {
                &self.0
            }

            pub fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl $crate::common::choice::ChoiceValue for $name {
            const TYPES: &'static [&'static str] =
                <$inner as $crate::common::choice::ChoiceValue>::TYPES;

            fn type_name(&self) -> &'static str {
                <$inner as $crate::common::choice::ChoiceValue>::type_name(&self.0)
            }

            fn serialize_entry<M: ::serde::ser::SerializeMap>(
                &self,
                key: &str,
                map: &mut M,
            ) -> ::std::result::Result<(), M::Error> {
                <$inner as $crate::common::choice::ChoiceValue>::serialize_entry(&self.0, key, map)
            }

            fn deserialize_entry<'de, A: ::serde::de::MapAccess<'de>>(
                type_name: &str,
                map: &mut A,
            ) -> ::std::result::Result<Self, A::Error> {
                <$inner as $crate::common::choice::ChoiceValue>::deserialize_entry(type_name, map)
                    .map(Self)
            }
        }

        $crate::common::choice::choice_serde!($name, $base);
    };
}

pub(crate) use choice_serde;
pub(crate) use choice_type;
pub(crate) use choice_value;
pub(crate) use open_choice;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    choice_type! {
        /// Test element admitting a primitive and a complex type.
        enum Sample("sample") {
            DateTime(String) = "dateTime",
            Flag(bool) = "boolean",
            Pair(Pair) = "Pair",
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Pair {
        left: i32,
        right: i32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Holder {
        name: String,
        #[serde(
            flatten,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "crate::common::choice::optional"
        )]
        sample: Option<Sample>,
    }

    #[test]
    fn test_type_suffix() {
        assert_eq!(fhir_type_suffix("dateTime"), "DateTime");
        assert_eq!(fhir_type_suffix("Period"), "Period");
        assert_eq!(fhir_type_suffix(""), "");
        assert_eq!(element_name("onset", "dateTime"), "onsetDateTime");
    }

    #[test]
    fn test_type_for_suffix() {
        const TYPES: &[&str] = &["dateTime", "Period", "string"];
        assert_eq!(type_for_suffix("DateTime", TYPES), Some("dateTime"));
        assert_eq!(type_for_suffix("Period", TYPES), Some("Period"));
        assert_eq!(type_for_suffix("String", TYPES), Some("string"));
        assert_eq!(type_for_suffix("dateTime", TYPES), None);
        assert_eq!(type_for_suffix("Range", TYPES), None);
        assert_eq!(type_for_suffix("", TYPES), None);
    }

    #[test]
    fn test_element_names_follow_type_table() {
        assert_eq!(
            Sample::element_names(),
            vec!["sampleDateTime", "sampleBoolean", "samplePair"]
        );
        let value = Sample::Flag(true);
        assert_eq!(value.type_name(), "boolean");
        assert_eq!(value.element_name(), "sampleBoolean");
    }

    #[test]
    fn test_flattened_serialization() {
        let holder = Holder {
            name: "x".to_string(),
            sample: Some(Sample::Pair(Pair { left: 1, right: 2 })),
        };
        let json = serde_json::to_value(&holder).unwrap();
        assert_eq!(
            json,
            json!({"name": "x", "samplePair": {"left": 1, "right": 2}})
        );

        let back: Holder = serde_json::from_value(json).unwrap();
        assert_eq!(back, holder);
    }

    #[test]
    fn test_absent_choice_is_none() {
        let holder = Holder {
            name: "x".to_string(),
            sample: None,
        };
        let json = serde_json::to_value(&holder).unwrap();
        assert_eq!(json, json!({"name": "x"}));

        let back: Holder = serde_json::from_value(json!({"name": "x", "other": 1})).unwrap();
        assert_eq!(back.sample, None);
    }

    #[test]
    fn test_optional_choice_rejects_two_values() {
        let err = serde_json::from_value::<Holder>(json!({
            "name": "x",
            "sampleDateTime": "2020-01-01",
            "sampleBoolean": true
        }))
        .unwrap_err();
        assert!(err.to_string().contains("more than one value for `sample[x]`"));
    }

    #[test]
    fn test_optional_choice_rejects_mistyped_value() {
        let err = serde_json::from_value::<Holder>(json!({
            "name": "x",
            "samplePair": {"left": "one", "right": 2}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("invalid type"));
    }

    #[test]
    fn test_standalone_choice_rejects_two_values() {
        let err = serde_json::from_value::<Sample>(json!({
            "sampleDateTime": "2020-01-01",
            "sampleBoolean": true
        }))
        .unwrap_err();
        assert!(err.to_string().contains("more than one value"));
    }

    #[test]
    fn test_standalone_choice_displays_as_single_entry() {
        let value = Sample::Flag(false);
        assert_eq!(value.to_string(), "{\n  \"sampleBoolean\": false\n}");
        assert_eq!(
            Sample::from_json_str(r#"{"sampleBoolean": false}"#).unwrap(),
            value
        );
    }

    #[test]
    fn test_standalone_choice_requires_value() {
        let err = serde_json::from_value::<Sample>(json!({"other": 1})).unwrap_err();
        assert!(err.to_string().contains("sample"));
    }
}
