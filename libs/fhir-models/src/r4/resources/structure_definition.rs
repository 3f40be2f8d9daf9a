//! FHIR R4 StructureDefinition resource

use super::{impl_resource, walk_domain, walk_each, walk_leaf, walk_one};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::r4::datatypes::{
    impl_has_extensions, CodeableConcept, Coding, ContactDetail, ElementDefinition, Extension,
    Identifier, Meta, Narrative, PublicationStatus, UsageContext,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Structural definition of a resource, data type, extension or profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct StructureDefinition {
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

    /// Canonical identifier for this structure definition
    pub url: String,

    /// Additional identifier for the structure definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    /// Business version of the structure definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Name for this structure definition (computer friendly)
    pub name: String,

    /// Name for this structure definition (human friendly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// draft | active | retired | unknown
    pub status: PublicationStatus,

    /// For testing purposes, not real usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<bool>,

    /// Date last changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Name of the publisher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Contact details for the publisher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<ContactDetail>>,

    /// Natural language description of the structure definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The context that the content is intended to support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_context: Option<Vec<UsageContext>>,

    /// Intended jurisdiction for structure definition (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Vec<CodeableConcept>>,

    /// Why this structure definition is defined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// Use and/or publishing restrictions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,

    /// Assist with indexing and finding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<Vec<Coding>>,

    /// FHIR Version this StructureDefinition targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fhir_version: Option<String>,

    /// External specification that the content is mapped to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Vec<StructureDefinitionMapping>>,

    /// primitive-type | complex-type | resource | logical
    pub kind: StructureDefinitionKind,

    /// Whether the structure is abstract
    #[serde(rename = "abstract")]
    pub is_abstract: bool,

    /// If an extension, where it can be used in instances
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<StructureDefinitionContext>>,

    /// FHIRPath invariants - when the extension can be used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_invariant: Option<Vec<String>>,

    /// Type defined or constrained by this structure
    #[serde(rename = "type")]
    pub type_: String,

    /// Definition that this type is constrained/specialized from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_definition: Option<String>,

    /// specialization | constraint - How relates to base definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation: Option<TypeDerivationRule>,

    /// Snapshot view of the structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<StructureDefinitionSnapshot>,

    /// Differential view of the structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential: Option<StructureDefinitionDifferential>,
}

/// Kind of structure this definition describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureDefinitionKind {
    PrimitiveType,
    ComplexType,
    #[default]
    Resource,
    /// Not directly implementable
    Logical,
}

/// How the type relates to its baseDefinition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDerivationRule {
    Specialization,
    Constraint,
}

/// External specification that the content is mapped to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinitionMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Internal id when this mapping is used
    pub identity: String,

    /// Identifies what this mapping refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Names what this mapping refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Versions, Issues, Scope limitations etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// If an extension, where it can be used in instances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinitionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// fhirpath | element | extension
    #[serde(rename = "type")]
    pub type_: ExtensionContextType,

    /// Where the extension can be used in instances
    pub expression: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionContextType {
    Fhirpath,
    #[default]
    Element,
    Extension,
}

/// Snapshot view of the structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinitionSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Definition of elements in the resource (if no StructureDefinition)
    pub element: Vec<ElementDefinition>,
}

/// Differential view of the structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinitionDifferential {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Definition of elements in the resource (if no StructureDefinition)
    pub element: Vec<ElementDefinition>,
}

impl StructureDefinitionSnapshot {
    pub fn new(element: Vec<ElementDefinition>) -> Self {
        Self {
            element,
            ..Default::default()
        }
    }

    /// Element by path; slices share their base element's path, so the
    /// unsliced element is the one returned
    pub fn get_element(&self, path: &str) -> Option<&ElementDefinition> {
        find_element(&self.element, path)
    }

    pub fn get_element_mut(&mut self, path: &str) -> Option<&mut ElementDefinition> {
        self.element
            .iter_mut()
            .find(|e| e.path == path && !e.is_slice())
    }

    /// Direct children of `parent_path`, in definition order
    pub fn get_children(&self, parent_path: &str) -> Vec<&ElementDefinition> {
        children(&self.element, parent_path)
    }

    /// Slices of the element at `path`
    pub fn get_slices(&self, path: &str) -> Vec<&ElementDefinition> {
        self.element
            .iter()
            .filter(|e| e.path == path && e.is_slice())
            .collect()
    }

    /// Order elements by depth, then path; a slice follows its base element.
    pub fn sort_elements(&mut self) {
        self.element.sort_by(|a, b| {
            let a_depth = a.path.matches('.').count();
            let b_depth = b.path.matches('.').count();

            match a_depth.cmp(&b_depth) {
                Ordering::Equal => match (a.is_slice(), b.is_slice()) {
                    (false, true) if a.path == b.path => Ordering::Less,
                    (true, false) if a.path == b.path => Ordering::Greater,
                    _ => a
                        .path
                        .cmp(&b.path)
                        .then_with(|| a.slice_name.cmp(&b.slice_name)),
                },
                other => other,
            }
        });
    }
}

impl StructureDefinitionDifferential {
    pub fn new(element: Vec<ElementDefinition>) -> Self {
        Self {
            element,
            ..Default::default()
        }
    }

    pub fn get_element(&self, path: &str) -> Option<&ElementDefinition> {
        find_element(&self.element, path)
    }

    pub fn get_children(&self, parent_path: &str) -> Vec<&ElementDefinition> {
        children(&self.element, parent_path)
    }
}

fn find_element<'a>(elements: &'a [ElementDefinition], path: &str) -> Option<&'a ElementDefinition> {
    elements.iter().find(|e| e.path == path && !e.is_slice())
}

fn children<'a>(elements: &'a [ElementDefinition], parent_path: &str) -> Vec<&'a ElementDefinition> {
    elements
        .iter()
        .filter(|e| e.parent_path() == Some(parent_path) && !e.is_slice())
        .collect()
}

impl StructureDefinition {
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        kind: StructureDefinitionKind,
        type_: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            kind,
            type_: type_.into(),
            ..Default::default()
        }
    }

    /// The first snapshot element, which describes the type itself
    pub fn root_element(&self) -> Option<&ElementDefinition> {
        self.snapshot.as_ref().and_then(|s| s.element.first())
    }

    /// Snapshot element by path
    pub fn element_by_path(&self, path: &str) -> Option<&ElementDefinition> {
        self.snapshot.as_ref().and_then(|s| s.get_element(path))
    }

    /// Snapshot elements
    pub fn elements(&self) -> &[ElementDefinition] {
        self.snapshot
            .as_ref()
            .map(|s| s.element.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_resource(&self) -> bool {
        self.kind == StructureDefinitionKind::Resource
    }

    pub fn is_extension(&self) -> bool {
        self.type_ == "Extension"
    }

    /// A constraint on another definition
    pub fn is_profile(&self) -> bool {
        self.derivation == Some(TypeDerivationRule::Constraint)
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn has_differential(&self) -> bool {
        self.differential.is_some()
    }

    /// `url|version`, or just `url` when unversioned
    pub fn versioned_url(&self) -> String {
        match &self.version {
            Some(version) => format!("{}|{}", self.url, version),
            None => self.url.clone(),
        }
    }

    /// Last segment of `baseDefinition`
    pub fn base_type_name(&self) -> Option<&str> {
        self.base_definition
            .as_deref()
            .and_then(|url| url.rsplit('/').next())
    }
}

impl ModifierExtensionWalk for StructureDefinition {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(&self.mapping, &format!("{}.mapping", path), out);
        walk_each(&self.context, &format!("{}.context", path), out);
        walk_one(&self.snapshot, &format!("{}.snapshot", path), out);
        walk_one(&self.differential, &format!("{}.differential", path), out);
    }
}

impl ModifierExtensionWalk for StructureDefinitionSnapshot {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        for (index, element) in self.element.iter().enumerate() {
            element.walk_modifier_extensions(&format!("{}.element[{}]", path, index), out);
        }
    }
}

impl ModifierExtensionWalk for StructureDefinitionDifferential {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        for (index, element) in self.element.iter().enumerate() {
            element.walk_modifier_extensions(&format!("{}.element[{}]", path, index), out);
        }
    }
}

impl_resource!(domain: StructureDefinition);
impl_has_extensions!(
    backbone: StructureDefinitionMapping,
    StructureDefinitionContext,
    StructureDefinitionSnapshot,
    StructureDefinitionDifferential,
);
walk_leaf!(StructureDefinitionMapping, StructureDefinitionContext);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use crate::r4::datatypes::{ElementDefinitionFixed, ElementDefinitionType};
    use crate::r4::datatypes::AnyValue;
    use serde_json::json;

    fn element(path: &str, min: u32, max: &str, type_code: &str) -> ElementDefinition {
        ElementDefinition {
            min: Some(min),
            max: Some(max.to_string()),
            types: Some(vec![ElementDefinitionType::new(type_code)]),
            ..ElementDefinition::new(path)
        }
    }

    fn patient_definition() -> StructureDefinition {
        StructureDefinition {
            base_definition: Some(
                "http://hl7.org/fhir/StructureDefinition/DomainResource".to_string(),
            ),
            derivation: Some(TypeDerivationRule::Specialization),
            snapshot: Some(StructureDefinitionSnapshot::new(vec![
                ElementDefinition::new("Patient"),
                element("Patient.identifier", 0, "*", "Identifier"),
                element("Patient.contact", 0, "*", "BackboneElement"),
                element("Patient.contact.name", 0, "1", "HumanName"),
                element("Patient.deceased[x]", 0, "1", "boolean"),
            ])),
            ..StructureDefinition::new(
                "http://hl7.org/fhir/StructureDefinition/Patient",
                "Patient",
                StructureDefinitionKind::Resource,
                "Patient",
            )
        }
    }

    #[test]
    fn test_deserialize_structure_definition() {
        let definition = StructureDefinition::from_json_value(&json!({
            "resourceType": "StructureDefinition",
            "id": "Patient",
            "url": "http://hl7.org/fhir/StructureDefinition/Patient",
            "version": "4.0.1",
            "name": "Patient",
            "status": "active",
            "kind": "resource",
            "abstract": false,
            "type": "Patient",
            "baseDefinition": "http://hl7.org/fhir/StructureDefinition/DomainResource",
            "derivation": "specialization",
            "differential": {"element": [{"id": "Patient", "path": "Patient"}]}
        }))
        .unwrap();

        assert_eq!(definition.status, PublicationStatus::Active);
        assert!(definition.is_resource());
        assert!(!definition.is_profile());
        assert!(!definition.has_snapshot());
        assert!(definition.has_differential());
        assert_eq!(
            definition.versioned_url(),
            "http://hl7.org/fhir/StructureDefinition/Patient|4.0.1"
        );
        assert_eq!(definition.base_type_name(), Some("DomainResource"));
    }

    #[test]
    fn test_serialize_keyword_fields() {
        let json = patient_definition().to_json_value().unwrap();
        assert_eq!(json["abstract"], false);
        assert_eq!(json["type"], "Patient");
        assert_eq!(json["kind"], "resource");
        assert_eq!(json["snapshot"]["element"][1]["type"][0]["code"], "Identifier");
    }

    #[test]
    fn test_snapshot_navigation() {
        let definition = patient_definition();
        assert_eq!(definition.root_element().map(|e| e.path.as_str()), Some("Patient"));
        assert_eq!(definition.elements().len(), 5);

        let snapshot = definition.snapshot.as_ref().unwrap();
        let children: Vec<&str> = snapshot
            .get_children("Patient")
            .iter()
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(
            children,
            vec!["Patient.identifier", "Patient.contact", "Patient.deceased[x]"]
        );
        assert_eq!(snapshot.get_children("Patient.contact").len(), 1);
        assert!(definition
            .element_by_path("Patient.deceased[x]")
            .map(ElementDefinition::is_choice_type)
            .unwrap_or(false));
    }

    #[test]
    fn test_profile_with_slices() {
        let mut snapshot = StructureDefinitionSnapshot::new(vec![
            ElementDefinition::new("Observation"),
            element("Observation.code", 1, "1", "CodeableConcept"),
            element("Observation.component", 0, "*", "BackboneElement"),
            ElementDefinition {
                slice_name: Some("systolic".to_string()),
                ..element("Observation.component", 1, "1", "BackboneElement")
            },
        ]);

        assert_eq!(snapshot.get_slices("Observation.component").len(), 1);
        assert!(!snapshot
            .get_element("Observation.component")
            .map(ElementDefinition::is_slice)
            .unwrap_or(true));

        if let Some(code) = snapshot.get_element_mut("Observation.code") {
            code.fixed = Some(ElementDefinitionFixed(AnyValue::Code("8480-6".to_string())));
        }
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["element"][1]["fixedCode"], "8480-6");
    }

    #[test]
    fn test_sort_elements() {
        let mut snapshot = StructureDefinitionSnapshot::new(vec![
            ElementDefinition {
                slice_name: Some("systolic".to_string()),
                ..ElementDefinition::new("Observation.component")
            },
            ElementDefinition::new("Observation.component.code"),
            ElementDefinition::new("Observation.component"),
            ElementDefinition::new("Observation"),
        ]);
        snapshot.sort_elements();

        let order: Vec<(&str, bool)> = snapshot
            .element
            .iter()
            .map(|e| (e.path.as_str(), e.is_slice()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Observation", false),
                ("Observation.component", false),
                ("Observation.component", true),
                ("Observation.component.code", false),
            ]
        );
    }

    #[test]
    fn test_extension_context() {
        let definition = StructureDefinition::from_json_value(&json!({
            "resourceType": "StructureDefinition",
            "url": "http://hl7.org/fhir/StructureDefinition/patient-birthPlace",
            "name": "birthPlace",
            "status": "draft",
            "kind": "complex-type",
            "abstract": false,
            "context": [{"type": "element", "expression": "Patient"}],
            "type": "Extension",
            "derivation": "constraint"
        }))
        .unwrap();
        assert!(definition.is_extension());
        assert!(definition.is_profile());
        assert_eq!(
            definition.context.as_ref().map(|c| c[0].type_),
            Some(ExtensionContextType::Element)
        );
    }
}
