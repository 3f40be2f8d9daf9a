//! FHIR R4 CodeSystem resource

use super::{impl_resource, walk_domain, walk_each, walk_leaf};
use super::{FilterOperator, ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::common::choice::choice_type;
use crate::r4::datatypes::{
    impl_has_extensions, CodeableConcept, Coding, ContactDetail, Extension, Identifier, Meta,
    Narrative, PublicationStatus, UsageContext,
};
use serde::{Deserialize, Serialize};

/// Declares the existence of and describes a code system or code system supplement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct CodeSystem {
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

    /// Canonical identifier for this code system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Additional identifier for the code system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    /// Business version of the code system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Name for this code system (computer friendly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Name for this code system (human friendly)
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

    /// If code comparison is case sensitive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,

    /// Canonical reference to the value set with entire code system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,

    /// grouped-by | is-a | part-of | classified-with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_meaning: Option<CodeSystemHierarchyMeaning>,

    /// If code system defines a compositional grammar
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compositional: Option<bool>,

    /// If definitions are not stable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_needed: Option<bool>,

    /// not-present | example | fragment | complete | supplement
    pub content: CodeSystemContentMode,

    /// Canonical URL of Code System this adds designations and properties to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplements: Option<String>,

    /// Total concepts in the code system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Filter that can be used in a value set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<CodeSystemFilter>>,

    /// Additional information supplied about each concept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<Vec<CodeSystemProperty>>,

    /// Concepts in the code system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<Vec<CodeSystemConcept>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeSystemContentMode {
    NotPresent,
    Example,
    Fragment,
    #[default]
    Complete,
    Supplement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeSystemHierarchyMeaning {
    GroupedBy,
    IsA,
    PartOf,
    ClassifiedWith,
}

/// Filter that can be used in a value set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Code that identifies the filter
    pub code: String,

    /// How or why the filter is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Operators that can be used with filter
    pub operator: Vec<FilterOperator>,

    /// What to use for the value
    pub value: String,
}

/// Additional information supplied about each concept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Identifies the property on the concepts, and when referred to in operations
    pub code: String,

    /// Formal identifier for the property
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Why the property is defined, and/or what it conveys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// code | Coding | string | integer | boolean | dateTime | decimal
    #[serde(rename = "type")]
    pub type_: PropertyType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    #[default]
    #[serde(rename = "code")]
    Code,
    Coding,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "dateTime")]
    DateTime,
    #[serde(rename = "decimal")]
    Decimal,
}

/// Concepts in the code system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemConcept {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Code that identifies concept
    pub code: String,

    /// Text to display to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Formal definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// Additional representations for the concept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<Vec<CodeSystemConceptDesignation>>,

    /// Property value for the concept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<Vec<CodeSystemConceptProperty>>,

    /// Child Concepts (is-a/contains/categorizes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<Vec<CodeSystemConcept>>,
}

/// Additional representations for the concept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemConceptDesignation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Human language of the designation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Details how this designation would be used
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<Coding>,

    /// The text value for this designation
    pub value: String,
}

/// Property value for the concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemConceptProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Reference to CodeSystem.property.code
    pub code: String,

    /// Value of the property for this concept
    #[serde(flatten)]
    pub value: CodeSystemConceptPropertyValue,
}

choice_type! {
    /// `CodeSystem.concept.property.value[x]`
    pub enum CodeSystemConceptPropertyValue("value") {
        Code(String) = "code",
        Coding(Coding) = "Coding",
        String(String) = "string",
        Integer(i32) = "integer",
        Boolean(bool) = "boolean",
        DateTime(String) = "dateTime",
        Decimal(f64) = "decimal",
    }
}

impl CodeSystemConceptPropertyValue {
    /// FHIR type of the held value, as declared by `CodeSystem.property.type`
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Code(_) => PropertyType::Code,
            Self::Coding(_) => PropertyType::Coding,
            Self::String(_) => PropertyType::String,
            Self::Integer(_) => PropertyType::Integer,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::DateTime(_) => PropertyType::DateTime,
            Self::Decimal(_) => PropertyType::Decimal,
        }
    }
}

impl CodeSystem {
    pub fn new(
        url: impl Into<String>,
        status: PublicationStatus,
        content: CodeSystemContentMode,
    ) -> Self {
        Self {
            url: Some(url.into()),
            status,
            content,
            ..Default::default()
        }
    }

    /// Find a concept by code anywhere in the hierarchy
    pub fn find_concept(&self, code: &str) -> Option<&CodeSystemConcept> {
        find_in(self.concept.as_deref().unwrap_or(&[]), code)
    }

    /// Declared property by code
    pub fn property_definition(&self, code: &str) -> Option<&CodeSystemProperty> {
        self.property.iter().flatten().find(|p| p.code == code)
    }

    /// Concept property values whose type differs from the declared property
    /// type, as `(concept code, property code)`
    pub fn mistyped_properties(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        let mut stack: Vec<&CodeSystemConcept> = self.concept.iter().flatten().collect();
        while let Some(concept) = stack.pop() {
            for property in concept.property.iter().flatten() {
                let declared = self.property_definition(&property.code).map(|p| p.type_);
                if declared.is_some_and(|t| t != property.value.property_type()) {
                    out.push((concept.code.as_str(), property.code.as_str()));
                }
            }
            stack.extend(concept.concept.iter().flatten());
        }
        out
    }
}

impl CodeSystemConcept {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    /// Value of the property with the given code
    pub fn property_value(&self, code: &str) -> Option<&CodeSystemConceptPropertyValue> {
        self.property
            .iter()
            .flatten()
            .find(|p| p.code == code)
            .map(|p| &p.value)
    }
}

fn find_in<'a>(concepts: &'a [CodeSystemConcept], code: &str) -> Option<&'a CodeSystemConcept> {
    for concept in concepts {
        if concept.code == code {
            return Some(concept);
        }
        if let Some(found) = find_in(concept.concept.as_deref().unwrap_or(&[]), code) {
            return Some(found);
        }
    }
    None
}

impl ModifierExtensionWalk for CodeSystem {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(&self.filter, &format!("{}.filter", path), out);
        walk_each(&self.property, &format!("{}.property", path), out);
        walk_each(&self.concept, &format!("{}.concept", path), out);
    }
}

impl ModifierExtensionWalk for CodeSystemConcept {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        walk_each(&self.designation, &format!("{}.designation", path), out);
        walk_each(&self.property, &format!("{}.property", path), out);
        walk_each(&self.concept, &format!("{}.concept", path), out);
    }
}

impl_resource!(domain: CodeSystem);
impl_has_extensions!(
    backbone: CodeSystemFilter,
    CodeSystemProperty,
    CodeSystemConcept,
    CodeSystemConceptDesignation,
    CodeSystemConceptProperty,
);
walk_leaf!(
    CodeSystemFilter,
    CodeSystemProperty,
    CodeSystemConceptDesignation,
    CodeSystemConceptProperty,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "resourceType": "CodeSystem",
            "id": "example",
            "url": "http://hl7.org/fhir/CodeSystem/example",
            "status": "draft",
            "caseSensitive": true,
            "hierarchyMeaning": "is-a",
            "content": "complete",
            "filter": [{"code": "acme-plasma", "operator": ["="], "value": "the value of this filter is either 'true' or 'false'"}],
            "property": [
                {"code": "status", "type": "code"},
                {"code": "weight", "type": "decimal"}
            ],
            "concept": [{
                "code": "chol",
                "display": "SChol",
                "designation": [{"language": "nl", "value": "cholesterol"}],
                "property": [{"code": "status", "valueCode": "active"}],
                "concept": [
                    {"code": "chol-mmol", "property": [{"code": "weight", "valueDecimal": 1.5}]},
                    {"code": "chol-mass", "property": [{"code": "weight", "valueString": "heavy"}]}
                ]
            }]
        })
    }

    #[test]
    fn test_concept_hierarchy() {
        let code_system = CodeSystem::from_json_value(&sample()).unwrap();
        assert_eq!(code_system.content, CodeSystemContentMode::Complete);
        assert_eq!(
            code_system.hierarchy_meaning,
            Some(CodeSystemHierarchyMeaning::IsA)
        );
        assert_eq!(
            code_system.filter.as_ref().unwrap()[0].operator,
            vec![FilterOperator::Equal]
        );

        let nested = code_system.find_concept("chol-mmol").unwrap();
        assert_eq!(
            nested.property_value("weight"),
            Some(&CodeSystemConceptPropertyValue::Decimal(1.5))
        );
        assert!(code_system.find_concept("nope").is_none());
        assert_eq!(
            code_system
                .find_concept("chol")
                .and_then(|c| c.property_value("status")),
            Some(&CodeSystemConceptPropertyValue::Code("active".to_string()))
        );

        assert_eq!(code_system.to_json_value().unwrap(), sample());
    }

    #[test]
    fn test_mistyped_properties() {
        let code_system = CodeSystem::from_json_value(&sample()).unwrap();
        assert_eq!(
            code_system.mistyped_properties(),
            vec![("chol-mass", "weight")]
        );
    }

    #[test]
    fn test_new_code_system() {
        let mut code_system = CodeSystem::new(
            "http://example.org/CodeSystem/colors",
            PublicationStatus::Active,
            CodeSystemContentMode::Fragment,
        );
        code_system.concept = Some(vec![CodeSystemConcept::new("red")]);
        assert_eq!(
            code_system.to_json_value().unwrap(),
            json!({
                "resourceType": "CodeSystem",
                "url": "http://example.org/CodeSystem/colors",
                "status": "active",
                "content": "fragment",
                "concept": [{"code": "red"}]
            })
        );
    }
}
