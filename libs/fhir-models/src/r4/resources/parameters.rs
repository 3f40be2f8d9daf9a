//! FHIR R4 Parameters resource
//!
//! Operation request or response; not persisted. Unlike other resources it
//! has no narrative, extensions or contained resources.

use super::{impl_resource, walk_each, walk_one, ModifierExtensionAt, ModifierExtensionWalk};
use super::Resource;
use crate::common::choice::open_choice;
use crate::r4::datatypes::{impl_has_extensions, AnyValue, Extension, Meta};
use serde::{Deserialize, Serialize};

/// Operation Request or Response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit_rules: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Operation Parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<Vec<ParametersParameter>>,
}

/// Operation Parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParametersParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Name from the definition
    pub name: String,

    /// If parameter is a data type
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub value: Option<ParametersParameterValue>,

    /// If parameter is a whole resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,

    /// Named part of a multi-part parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<Vec<ParametersParameter>>,
}

open_choice! {
    /// `Parameters.parameter.value[x]`
    pub struct ParametersParameterValue(AnyValue) = "value";
}

impl ParametersParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_value(name: impl Into<String>, value: AnyValue) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(name)
        }
    }

    /// Data type value, if any
    pub fn value(&self) -> Option<&AnyValue> {
        self.value.as_ref().map(ParametersParameterValue::value)
    }

    /// First part with the given name
    pub fn part(&self, name: &str) -> Option<&ParametersParameter> {
        self.part.iter().flatten().find(|p| p.name == name)
    }
}

impl Parameters {
    /// First parameter with the given name
    pub fn get(&self, name: &str) -> Option<&ParametersParameter> {
        self.parameter.iter().flatten().find(|p| p.name == name)
    }

    /// Every parameter with the given name, in document order
    pub fn get_all(&self, name: &str) -> Vec<&ParametersParameter> {
        self.parameter
            .iter()
            .flatten()
            .filter(|p| p.name == name)
            .collect()
    }

    /// Data type value of the first parameter with the given name
    pub fn value(&self, name: &str) -> Option<&AnyValue> {
        self.get(name).and_then(ParametersParameter::value)
    }

    pub fn add(&mut self, parameter: ParametersParameter) {
        self.parameter.get_or_insert_with(Vec::new).push(parameter);
    }

    pub fn add_value(&mut self, name: impl Into<String>, value: AnyValue) {
        self.add(ParametersParameter::with_value(name, value));
    }

    pub fn add_resource(&mut self, name: impl Into<String>, resource: impl Into<Resource>) {
        self.add(ParametersParameter {
            resource: Some(resource.into()),
            ..ParametersParameter::new(name)
        });
    }
}

impl ModifierExtensionWalk for Parameters {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_each(&self.parameter, &format!("{}.parameter", path), out);
    }
}

impl ModifierExtensionWalk for ParametersParameter {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        walk_one(&self.resource, &format!("{}.resource", path), out);
        walk_each(&self.part, &format!("{}.part", path), out);
    }
}

impl_resource!(base: Parameters);
impl_has_extensions!(backbone: ParametersParameter);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use crate::r4::datatypes::Coding;
    use crate::r4::resources::Patient;
    use serde_json::json;

    #[test]
    fn test_value_resource_and_parts() {
        let json = json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "exact", "valueBoolean": true},
                {"name": "coding", "valueCoding": {"system": "http://loinc.org", "code": "1963-8"}},
                {"name": "patient", "resource": {"resourceType": "Patient", "id": "example"}},
                {
                    "name": "property",
                    "part": [
                        {"name": "code", "valueCode": "display"},
                        {"name": "value", "valueString": "Bicarbonate"}
                    ]
                }
            ]
        });

        let parameters = Parameters::from_json_value(&json).unwrap();
        assert_eq!(parameters.value("exact"), Some(&AnyValue::Boolean(true)));
        assert_eq!(
            parameters.value("coding"),
            Some(&AnyValue::Coding(Coding::new("http://loinc.org", "1963-8")))
        );
        let patient = parameters.get("patient").and_then(|p| p.resource.as_ref());
        assert_eq!(patient.map(Resource::resource_type), Some("Patient"));

        let property = parameters.get("property").unwrap();
        assert!(property.value().is_none());
        assert_eq!(
            property.part("value").and_then(ParametersParameter::value),
            Some(&AnyValue::String("Bicarbonate".to_string()))
        );

        assert_eq!(parameters.to_json_value().unwrap(), json);
    }

    #[test]
    fn test_build_parameters() {
        let mut parameters = Parameters::default();
        parameters.add_value("count", AnyValue::Integer(3));
        parameters.add_value("count", AnyValue::Integer(4));
        parameters.add_resource("return", Patient::default());

        assert_eq!(parameters.get_all("count").len(), 2);
        assert!(parameters.get("missing").is_none());
        assert_eq!(
            parameters.to_json_value().unwrap(),
            json!({
                "resourceType": "Parameters",
                "parameter": [
                    {"name": "count", "valueInteger": 3},
                    {"name": "count", "valueInteger": 4},
                    {"name": "return", "resource": {"resourceType": "Patient"}}
                ]
            })
        );
    }

    #[test]
    fn test_modifier_extensions_inside_parts() {
        let resource = Resource::from_json_value(&json!({
            "resourceType": "Parameters",
            "parameter": [{
                "name": "outer",
                "part": [{
                    "name": "inner",
                    "modifierExtension": [{"url": "http://example.org/negated", "valueBoolean": true}],
                    "valueString": "x"
                }]
            }]
        }))
        .unwrap();
        let found = resource.collect_modifier_extensions();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "Parameters.parameter[0].part[0]");
    }
}
