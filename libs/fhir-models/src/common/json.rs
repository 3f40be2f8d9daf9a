//! JSON encoding shared by every model type

use super::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// JSON conversions for FHIR model types.
///
/// Parsing and encoding return [`Result`]. [`FhirJson::to_display_string`] is
/// the exception: a well-formed in-memory value always encodes, so a failure
/// there is a broken invariant and panics.
pub trait FhirJson: Serialize + DeserializeOwned {
    /// Parse from a JSON string
    fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }

    /// Parse from JSON Value
    fn from_json_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(Error::from)
    }

    /// Convert to JSON Value
    fn to_json_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::from)
    }

    /// Compact JSON text
    fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::from)
    }

    /// Indented JSON text
    fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }

    /// Indented JSON text for logs and debugging.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be encoded.
    fn to_display_string(&self) -> String {
        match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(err) => panic!(
                "{} could not be encoded as JSON: {}",
                std::any::type_name::<Self>(),
                err
            ),
        }
    }
}

/// Implement [`FhirJson`] and an indented-JSON `Display` for model types.
///
/// `display:` emits only the `Display` impl, for types with their own
/// [`FhirJson`] impl.
macro_rules! impl_fhir_json {
    (display: $($ty:ty),+ $(,)?) => {
        $(
            impl ::std::fmt::Display for $ty {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    let json = ::serde_json::to_string_pretty(self).map_err(|_| ::std::fmt::Error)?;
                    f.write_str(&json)
                }
            }
        )+
    };
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::common::json::FhirJson for $ty {}
        )+
        $crate::common::json::impl_fhir_json!(display: $($ty),+);
    };
}

pub(crate) use impl_fhir_json;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serializer};
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        #[serde(skip_serializing_if = "Option::is_none")]
        given_name: Option<String>,
        count: u32,
    }

    impl_fhir_json!(Sample);

    #[derive(Debug, Deserialize)]
    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to encode"))
        }
    }

    impl FhirJson for Unencodable {}

    #[test]
    fn test_display_string_is_indented() {
        let sample = Sample {
            given_name: Some("Ada".to_string()),
            count: 2,
        };
        assert_eq!(
            sample.to_display_string(),
            "{\n  \"givenName\": \"Ada\",\n  \"count\": 2\n}"
        );
        assert_eq!(sample.to_string(), sample.to_display_string());
    }

    #[test]
    fn test_value_round_trip() {
        let sample = Sample::from_json_value(&json!({"count": 7})).unwrap();
        assert_eq!(sample.given_name, None);
        assert_eq!(sample.to_json_value().unwrap(), json!({"count": 7}));
        assert_eq!(sample.to_json_string().unwrap(), r#"{"count":7}"#);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = Sample::from_json_str("{\"count\": \"many\"}").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    #[should_panic(expected = "could not be encoded as JSON")]
    fn test_display_string_panics_on_encode_failure() {
        let _ = Unencodable.to_display_string();
    }
}
