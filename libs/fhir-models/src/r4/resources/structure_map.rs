//! FHIR R4 StructureMap resource
//!
//! A map from one set of structures to another. Rules nest, so groups are
//! walked recursively.

use super::{impl_resource, walk_domain, walk_each, walk_leaf};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::common::choice::{choice_type, open_choice};
use crate::r4::datatypes::{
    impl_has_extensions, AnyValue, CodeableConcept, ContactDetail, Extension, Identifier, Meta,
    Narrative, PublicationStatus, UsageContext,
};
use serde::{Deserialize, Serialize};

/// A map from one set of content to another
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct StructureMap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit_rules: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contained: Option<Vec<Resource>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Canonical identifier for this structure map
    pub url: String,

    /// Additional identifier for the structure map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    /// Business version of the structure map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Name for this structure map (computer friendly)
    pub name: String,

    /// Name for this structure map (human friendly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// draft | active | retired | unknown
    pub status: PublicationStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<ContactDetail>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_context: Option<Vec<UsageContext>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Vec<CodeableConcept>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,

    /// Structure Definition used by this map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<Vec<StructureMapStructure>>,

    /// Other maps used by this map (canonical URLs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<Vec<String>>,

    /// Named sections for reader convenience
    pub group: Vec<StructureMapGroup>,
}

/// Structure Definition used by this map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapStructure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Canonical reference to structure definition
    pub url: String,

    /// source | queried | target | produced
    pub mode: StructureMapModelMode,

    /// Name for type in this map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Documentation on use of structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMapModelMode {
    #[default]
    Source,
    Queried,
    Target,
    Produced,
}

/// Named sections for reader convenience
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Human-readable label
    pub name: String,

    /// Another group that this group adds rules to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// none | types | type-and-types
    pub type_mode: StructureMapGroupTypeMode,

    /// Additional description/explanation for group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    /// Named instance provided when invoking the map
    pub input: Vec<StructureMapGroupInput>,

    /// Transform Rule from source to target
    pub rule: Vec<StructureMapGroupRule>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureMapGroupTypeMode {
    #[default]
    None,
    Types,
    TypeAndTypes,
}

/// Named instance provided when invoking the map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapGroupInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Name for this instance of data
    pub name: String,

    /// Type for this instance of data
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// source | target
    pub mode: StructureMapInputMode,

    /// Documentation for this instance of data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMapInputMode {
    #[default]
    Source,
    Target,
}

/// Transform Rule from source to target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapGroupRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Name of the rule for internal references
    pub name: String,

    /// Source inputs to the mapping
    pub source: Vec<StructureMapGroupRuleSource>,

    /// Content to create because of this mapping rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec<StructureMapGroupRuleTarget>>,

    /// Rules contained in this rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<Vec<StructureMapGroupRule>>,

    /// Which other rules to apply in the context of this rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependent: Option<Vec<StructureMapGroupRuleDependent>>,

    /// Documentation for this instance of data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Source inputs to the mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapGroupRuleSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Type or variable this rule applies to
    pub context: String,

    /// Specified minimum cardinality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,

    /// Specified maximum cardinality (number or *)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,

    /// Rule only applies if source has this type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// Default value if no value exists
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub default_value: Option<StructureMapSourceDefaultValue>,

    /// Optional field for this source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// first | not_first | last | not_last | only_one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_mode: Option<StructureMapSourceListMode>,

    /// Named context for field, if a field is specified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    /// FHIRPath expression  - must be true or the rule does not apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// FHIRPath expression  - must be true or the mapping engine throws an error instead of completing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,

    /// Message to put in log if source exists (FHIRPath)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_message: Option<String>,
}

open_choice! {
    /// `StructureMap.group.rule.source.defaultValue[x]`
    pub struct StructureMapSourceDefaultValue(AnyValue) = "defaultValue";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureMapSourceListMode {
    First,
    NotFirst,
    Last,
    NotLast,
    OnlyOne,
}

/// Content to create because of this mapping rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapGroupRuleTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Type or variable this rule applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// type | variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_type: Option<StructureMapContextType>,

    /// Field to create in the context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// Named context for field, if desired, and a field is specified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    /// first | share | last | collate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_mode: Option<Vec<StructureMapTargetListMode>>,

    /// Internal rule reference for shared list items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_rule_id: Option<String>,

    /// create | copy +
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<StructureMapTransform>,

    /// Parameters to the transform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<Vec<StructureMapGroupRuleTargetParameter>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMapContextType {
    Type,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMapTargetListMode {
    First,
    Share,
    Last,
    Collate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureMapTransform {
    Create,
    Copy,
    Truncate,
    Escape,
    Cast,
    Append,
    Translate,
    Reference,
    #[serde(rename = "dateOp")]
    DateOp,
    Uuid,
    Pointer,
    Evaluate,
    Cc,
    C,
    Qty,
    Id,
    Cp,
}

/// Parameters to the transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapGroupRuleTargetParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Parameter value - variable or literal
    #[serde(flatten)]
    pub value: StructureMapParameterValue,
}

choice_type! {
    /// `StructureMap.group.rule.target.parameter.value[x]`
    pub enum StructureMapParameterValue("value") {
        Id(String) = "id",
        String(String) = "string",
        Boolean(bool) = "boolean",
        Integer(i32) = "integer",
        Decimal(f64) = "decimal",
    }
}

/// Which other rules to apply in the context of this rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMapGroupRuleDependent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Name of a rule or group to apply
    pub name: String,

    /// Variable to pass to the rule or group
    pub variable: Vec<String>,
}

impl StructureMap {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Group by name
    pub fn group(&self, name: &str) -> Option<&StructureMapGroup> {
        self.group.iter().find(|g| g.name == name)
    }

    /// Structures used in `mode`
    pub fn structures(&self, mode: StructureMapModelMode) -> Vec<&StructureMapStructure> {
        self.structure
            .iter()
            .flatten()
            .filter(|s| s.mode == mode)
            .collect()
    }
}

impl StructureMapGroup {
    /// Every rule in the group, depth first, nested rules after their parent
    pub fn all_rules(&self) -> Vec<&StructureMapGroupRule> {
        let mut rules = Vec::new();
        for rule in &self.rule {
            rule.collect_into(&mut rules);
        }
        rules
    }
}

impl StructureMapGroupRule {
    fn collect_into<'a>(&'a self, out: &mut Vec<&'a StructureMapGroupRule>) {
        out.push(self);
        for nested in self.rule.iter().flatten() {
            nested.collect_into(out);
        }
    }
}

impl StructureMapGroupRuleTargetParameter {
    pub fn new(value: StructureMapParameterValue) -> Self {
        Self {
            id: None,
            extension: None,
            modifier_extension: None,
            value,
        }
    }
}

impl ModifierExtensionWalk for StructureMap {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(&self.structure, &format!("{}.structure", path), out);
        for (index, group) in self.group.iter().enumerate() {
            group.walk_modifier_extensions(&format!("{}.group[{}]", path, index), out);
        }
    }
}

impl ModifierExtensionWalk for StructureMapGroup {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        for (index, input) in self.input.iter().enumerate() {
            input.walk_modifier_extensions(&format!("{}.input[{}]", path, index), out);
        }
        for (index, rule) in self.rule.iter().enumerate() {
            rule.walk_modifier_extensions(&format!("{}.rule[{}]", path, index), out);
        }
    }
}

impl ModifierExtensionWalk for StructureMapGroupRule {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        for (index, source) in self.source.iter().enumerate() {
            source.walk_modifier_extensions(&format!("{}.source[{}]", path, index), out);
        }
        walk_each(&self.target, &format!("{}.target", path), out);
        walk_each(&self.rule, &format!("{}.rule", path), out);
        walk_each(&self.dependent, &format!("{}.dependent", path), out);
    }
}

impl ModifierExtensionWalk for StructureMapGroupRuleTarget {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        walk_each(&self.parameter, &format!("{}.parameter", path), out);
    }
}

impl_resource!(domain: StructureMap);
impl_has_extensions!(
    backbone: StructureMapStructure,
    StructureMapGroup,
    StructureMapGroupInput,
    StructureMapGroupRule,
    StructureMapGroupRuleSource,
    StructureMapGroupRuleTarget,
    StructureMapGroupRuleTargetParameter,
    StructureMapGroupRuleDependent,
);
walk_leaf!(
    StructureMapStructure,
    StructureMapGroupInput,
    StructureMapGroupRuleSource,
    StructureMapGroupRuleTargetParameter,
    StructureMapGroupRuleDependent,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "resourceType": "StructureMap",
            "id": "example",
            "url": "http://hl7.org/fhir/StructureMap/example",
            "name": "ExampleMap",
            "status": "draft",
            "structure": [
                {"url": "http://hl7.org/fhir/StructureDefinition/Patient", "mode": "source", "alias": "src"},
                {"url": "http://hl7.org/fhir/StructureDefinition/Basic", "mode": "target"}
            ],
            "group": [{
                "name": "Examples",
                "typeMode": "none",
                "input": [
                    {"name": "test", "type": "TestStructure", "mode": "source"},
                    {"name": "tgt", "mode": "target"}
                ],
                "rule": [{
                    "name": "rule1",
                    "source": [{
                        "context": "test",
                        "element": "status",
                        "variable": "vs",
                        "defaultValueCode": "unknown",
                        "listMode": "not_first"
                    }],
                    "target": [{
                        "context": "tgt",
                        "contextType": "variable",
                        "element": "code",
                        "transform": "translate",
                        "parameter": [
                            {"valueId": "vs"},
                            {"valueString": "http://example.org/ConceptMap/status"},
                            {"valueBoolean": true}
                        ]
                    }],
                    "rule": [{
                        "name": "nested",
                        "source": [{"context": "vs"}],
                        "dependent": [{"name": "other", "variable": ["vs", "tgt"]}]
                    }]
                }]
            }]
        })
    }

    #[test]
    fn test_rules_and_parameters() {
        let map = StructureMap::from_json_value(&sample()).unwrap();
        assert_eq!(map.structures(StructureMapModelMode::Source).len(), 1);

        let group = map.group("Examples").unwrap();
        let names: Vec<&str> = group.all_rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["rule1", "nested"]);

        let rule = &group.rule[0];
        let source = &rule.source[0];
        assert_eq!(source.list_mode, Some(StructureMapSourceListMode::NotFirst));
        assert_eq!(
            source.default_value.as_ref().map(|v| v.value()),
            Some(&AnyValue::Code("unknown".to_string()))
        );

        let target = &rule.target.as_ref().unwrap()[0];
        assert_eq!(target.transform, Some(StructureMapTransform::Translate));
        let values: Vec<&StructureMapParameterValue> = target
            .parameter
            .iter()
            .flatten()
            .map(|p| &p.value)
            .collect();
        assert_eq!(
            values,
            vec![
                &StructureMapParameterValue::Id("vs".to_string()),
                &StructureMapParameterValue::String(
                    "http://example.org/ConceptMap/status".to_string()
                ),
                &StructureMapParameterValue::Boolean(true),
            ]
        );

        assert_eq!(map.to_json_value().unwrap(), sample());
    }

    #[test]
    fn test_parameter_requires_value() {
        let mut json = sample();
        json["group"][0]["rule"][0]["target"][0]["parameter"] = json!([{"id": "p"}]);
        assert!(StructureMap::from_json_value(&json).is_err());
    }

    #[test]
    fn test_nested_rule_modifier_path() {
        let mut json = sample();
        json["group"][0]["rule"][0]["rule"][0]["modifierExtension"] =
            json!([{"url": "http://example.org/conditional", "valueBoolean": true}]);
        let resource = Resource::from_json_value(&json).unwrap();
        let found = resource.collect_modifier_extensions();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "StructureMap.group[0].rule[0].rule[0]");
    }

    #[test]
    fn test_new_map() {
        let mut map = StructureMap::new("http://example.org/StructureMap/empty", "Empty");
        map.group.push(StructureMapGroup {
            name: "main".to_string(),
            ..Default::default()
        });
        map.group[0].rule.push(StructureMapGroupRule {
            name: "copy".to_string(),
            source: vec![StructureMapGroupRuleSource {
                context: "src".to_string(),
                ..Default::default()
            }],
            target: Some(vec![StructureMapGroupRuleTarget {
                transform: Some(StructureMapTransform::Copy),
                parameter: Some(vec![StructureMapGroupRuleTargetParameter::new(
                    StructureMapParameterValue::Integer(1),
                )]),
                ..Default::default()
            }]),
            ..Default::default()
        });
        let json = map.to_json_value().unwrap();
        assert_eq!(json["group"][0]["typeMode"], "none");
        assert_eq!(json["group"][0]["input"], json!([]));
        assert_eq!(
            json["group"][0]["rule"][0]["target"][0]["parameter"][0]["valueInteger"],
            1
        );
    }
}
