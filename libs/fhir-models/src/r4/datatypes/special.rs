//! Special-purpose data types: Reference, Meta, Narrative and Dosage

use super::{
    CodeableConcept, Coding, Extension, Identifier, Range, Ratio, SimpleQuantity, Timing,
};
use crate::common::choice::choice_type;
use serde::{Deserialize, Serialize};

/// A reference from one resource to another
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Literal reference, Relative, internal or absolute URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Type the reference refers to (e.g. "Patient")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// Logical reference, when literal reference is not known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    /// Text alternative for the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// What a [`Reference`] points at, parsed from its literal form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceTarget<'a> {
    /// `#id`: a resource contained in the referring resource
    Contained(&'a str),
    /// `Type/id` or `Type/id/_history/version`
    Relative {
        resource_type: &'a str,
        id: &'a str,
        version: Option<&'a str>,
    },
    /// An absolute URL or URN
    Absolute(&'a str),
    /// No literal reference, only a business identifier
    Logical(&'a Identifier),
}

impl Reference {
    /// Relative reference `Type/id`
    pub fn to(resource_type: &str, id: &str) -> Self {
        Self {
            reference: Some(format!("{}/{}", resource_type, id)),
            ..Default::default()
        }
    }

    /// Reference to a contained resource
    pub fn local(id: &str) -> Self {
        Self {
            reference: Some(format!("#{}", id)),
            ..Default::default()
        }
    }

    /// Parse the literal reference.
    ///
    /// Returns `None` when there is neither a reference nor an identifier, or
    /// when the reference is not in a recognizable form.
    pub fn target(&self) -> Option<ReferenceTarget<'_>> {
        let reference = match self.reference.as_deref() {
            Some(reference) => reference,
            None => return self.identifier.as_ref().map(ReferenceTarget::Logical),
        };

        if let Some(id) = reference.strip_prefix('#') {
            return Some(ReferenceTarget::Contained(id));
        }
        if reference.contains("://") || reference.starts_with("urn:") {
            return Some(ReferenceTarget::Absolute(reference));
        }

        let parts: Vec<&str> = reference.split('/').collect();
        let (resource_type, id, version) = match parts.as_slice() {
            [resource_type, id] => (*resource_type, *id, None),
            [resource_type, id, "_history", version] => (*resource_type, *id, Some(*version)),
            _ => return None,
        };

        let starts_upper = resource_type
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_uppercase());
        if !starts_upper || id.is_empty() {
            return None;
        }

        Some(ReferenceTarget::Relative {
            resource_type,
            id,
            version,
        })
    }

    /// Id of the contained resource this reference points at, if local
    pub fn local_id(&self) -> Option<&str> {
        match self.target()? {
            ReferenceTarget::Contained(id) => Some(id),
            _ => None,
        }
    }
}

/// Metadata about a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Version specific identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    /// When the resource version last changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    /// Identifies where the resource comes from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Profiles this resource claims to conform to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Vec<String>>,

    /// Security Labels applied to this resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Coding>>,

    /// Tags applied to this resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Vec<Coding>>,
}

/// Human-readable summary of the resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// generated | extensions | additional | empty
    pub status: NarrativeStatus,

    /// Limited xhtml content
    pub div: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    #[default]
    Generated,
    Extensions,
    Additional,
    Empty,
}

/// How the medication is/was taken or should be taken
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dosage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// The order of the dosage instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i32>,

    /// Free text dosage instructions e.g. SIG
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Supplemental instruction or warnings to the patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_instruction: Option<Vec<CodeableConcept>>,

    /// Patient or consumer oriented instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_instruction: Option<String>,

    /// When medication should be administered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,

    /// Take "as needed" (for x)
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub as_needed: Option<DosageAsNeeded>,

    /// Body site to administer to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<CodeableConcept>,

    /// How drug should enter body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,

    /// Technique for administering medication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<CodeableConcept>,

    /// Amount of medication administered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_and_rate: Option<Vec<DosageDoseAndRate>>,

    /// Upper limit on medication per unit of time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dose_per_period: Option<Ratio>,

    /// Upper limit on medication per administration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dose_per_administration: Option<SimpleQuantity>,

    /// Upper limit on medication per lifetime of the patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dose_per_lifetime: Option<SimpleQuantity>,
}

choice_type! {
    /// `Dosage.asNeeded[x]`
    pub enum DosageAsNeeded("asNeeded") {
        Boolean(bool) = "boolean",
        CodeableConcept(CodeableConcept) = "CodeableConcept",
    }
}

/// Amount of medication administered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DosageDoseAndRate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// The kind of dose or rate specified
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    /// Amount of medication per dose
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub dose: Option<DosageDose>,

    /// Amount of medication per unit of time
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub rate: Option<DosageRate>,
}

choice_type! {
    /// `Dosage.doseAndRate.dose[x]`
    pub enum DosageDose("dose") {
        Range(Range) = "Range",
        Quantity(SimpleQuantity) = "Quantity",
    }
}

choice_type! {
    /// `Dosage.doseAndRate.rate[x]`
    pub enum DosageRate("rate") {
        Ratio(Ratio) = "Ratio",
        Range(Range) = "Range",
        Quantity(SimpleQuantity) = "Quantity",
    }
}

super::impl_has_extensions!(element: Reference, Meta, Narrative, DosageDoseAndRate);
super::impl_has_extensions!(backbone: Dosage);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ChoiceType;
    use crate::r4::datatypes::Quantity;
    use serde_json::json;

    #[test]
    fn test_reference_targets() {
        assert_eq!(
            Reference::local("med1").target(),
            Some(ReferenceTarget::Contained("med1"))
        );
        assert_eq!(
            Reference::to("Patient", "example").target(),
            Some(ReferenceTarget::Relative {
                resource_type: "Patient",
                id: "example",
                version: None,
            })
        );

        let versioned = Reference {
            reference: Some("Observation/bp/_history/2".to_string()),
            ..Default::default()
        };
        assert_eq!(
            versioned.target(),
            Some(ReferenceTarget::Relative {
                resource_type: "Observation",
                id: "bp",
                version: Some("2"),
            })
        );

        let absolute = Reference {
            reference: Some("http://example.org/fhir/Patient/1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            absolute.target(),
            Some(ReferenceTarget::Absolute("http://example.org/fhir/Patient/1"))
        );

        let logical = Reference {
            identifier: Some(Identifier::new("urn:oid:1.2.3", "42")),
            display: Some("Somebody".to_string()),
            ..Default::default()
        };
        assert!(matches!(logical.target(), Some(ReferenceTarget::Logical(_))));

        let garbage = Reference {
            reference: Some("not a reference".to_string()),
            ..Default::default()
        };
        assert_eq!(garbage.target(), None);
        assert_eq!(Reference::default().target(), None);
    }

    #[test]
    fn test_local_id() {
        assert_eq!(Reference::local("p1").local_id(), Some("p1"));
        assert_eq!(Reference::to("Patient", "p1").local_id(), None);
    }

    #[test]
    fn test_narrative_round_trip() {
        let json = json!({
            "status": "generated",
            "div": "<div xmlns=\"http://www.w3.org/1999/xhtml\">Hello</div>"
        });
        let narrative: Narrative = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(narrative.status, NarrativeStatus::Generated);
        assert_eq!(serde_json::to_value(&narrative).unwrap(), json);
    }

    #[test]
    fn test_dosage_choice_keys() {
        let dosage = Dosage {
            text: Some("1 tablet as needed".to_string()),
            as_needed: Some(DosageAsNeeded::Boolean(true)),
            dose_and_rate: Some(vec![DosageDoseAndRate {
                dose: Some(DosageDose::Quantity(Quantity::ucum(1.0, "{tbl}"))),
                rate: Some(DosageRate::Ratio(Ratio::default())),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let json = serde_json::to_value(&dosage).unwrap();
        assert_eq!(json["asNeededBoolean"], true);
        assert_eq!(json["doseAndRate"][0]["doseQuantity"]["value"], 1.0);
        assert_eq!(json["doseAndRate"][0]["rateRatio"], json!({}));
        assert!(json.get("asNeededCodeableConcept").is_none());

        let back: Dosage = serde_json::from_value(json).unwrap();
        assert_eq!(back, dosage);
    }

    #[test]
    fn test_dose_element_names() {
        assert_eq!(DosageDose::element_names(), vec!["doseRange", "doseQuantity"]);
        assert_eq!(
            DosageRate::element_names(),
            vec!["rateRatio", "rateRange", "rateQuantity"]
        );
    }
}
