//! FHIR R4 Patient resource

use super::{impl_resource, walk_domain, walk_each, walk_leaf};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::common::choice::choice_type;
use crate::r4::datatypes::{
    impl_has_extensions, Address, Attachment, CodeableConcept, ContactPoint, Extension,
    HumanName, Identifier, Meta, NameUse, Narrative, Period, Reference,
};
use serde::{Deserialize, Serialize};

/// Information about an individual or animal receiving health care services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct Patient {
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

    /// An identifier for this patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    /// Whether this patient's record is in active use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// A name associated with the patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Vec<HumanName>>,

    /// A contact detail for the individual
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telecom: Option<Vec<ContactPoint>>,

    /// male | female | other | unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,

    /// The date of birth for the individual
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    /// Indicates if the individual is deceased or not
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub deceased: Option<PatientDeceased>,

    /// An address for the individual
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<Address>>,

    /// Marital (civil) status of a patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<CodeableConcept>,

    /// Whether patient is part of a multiple birth
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub multiple_birth: Option<PatientMultipleBirth>,

    /// Image of the patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<Attachment>>,

    /// A contact party (e.g. guardian, partner, friend) for the patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<PatientContact>>,

    /// A language which may be used to communicate with the patient about his or her health
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication: Option<Vec<PatientCommunication>>,

    /// Patient's nominated primary care provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_practitioner: Option<Vec<Reference>>,

    /// Organization that is the custodian of the patient record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managing_organization: Option<Reference>,

    /// Link to another patient resource that concerns the same actual person
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Vec<PatientLink>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

choice_type! {
    /// `Patient.deceased[x]`
    pub enum PatientDeceased("deceased") {
        Boolean(bool) = "boolean",
        DateTime(String) = "dateTime",
    }
}

choice_type! {
    /// `Patient.multipleBirth[x]`
    pub enum PatientMultipleBirth("multipleBirth") {
        Boolean(bool) = "boolean",
        Integer(i32) = "integer",
    }
}

/// A contact party (e.g. guardian, partner, friend) for the patient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// The kind of relationship
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Vec<CodeableConcept>>,

    /// A name associated with the contact person
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<HumanName>,

    /// A contact detail for the person
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telecom: Option<Vec<ContactPoint>>,

    /// Address for the contact person
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// male | female | other | unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,

    /// Organization that is associated with the contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Reference>,

    /// The period during which this contact person or organization is valid to be contacted relating to this patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

/// A language which may be used to communicate with the patient about his or her health
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientCommunication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// The language which can be used to communicate with the patient about his or her health
    pub language: CodeableConcept,

    /// Language preference indicator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,
}

/// Link to another patient resource that concerns the same actual person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// The other patient or related person resource that the link refers to
    pub other: Reference,

    /// replaced-by | replaces | refer | seealso
    #[serde(rename = "type")]
    pub type_: LinkType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    ReplacedBy,
    Replaces,
    Refer,
    #[default]
    Seealso,
}

impl Patient {
    /// The first name with `use = official`, else the first name
    pub fn official_name(&self) -> Option<&HumanName> {
        let names = self.name.as_deref()?;
        names
            .iter()
            .find(|n| n.use_ == Some(NameUse::Official))
            .or_else(|| names.first())
    }

    /// Whether the patient is known to be deceased
    pub fn is_deceased(&self) -> bool {
        match &self.deceased {
            Some(PatientDeceased::Boolean(deceased)) => *deceased,
            Some(PatientDeceased::DateTime(_)) => true,
            None => false,
        }
    }

    /// The patient this record was replaced by, if any
    pub fn replaced_by(&self) -> Option<&Reference> {
        self.link
            .iter()
            .flatten()
            .find(|l| l.type_ == LinkType::ReplacedBy)
            .map(|l| &l.other)
    }
}

impl ModifierExtensionWalk for Patient {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(&self.contact, &format!("{}.contact", path), out);
        walk_each(&self.communication, &format!("{}.communication", path), out);
        walk_each(&self.link, &format!("{}.link", path), out);
    }
}

impl_resource!(domain: Patient);
impl_has_extensions!(backbone: PatientContact, PatientCommunication, PatientLink);
walk_leaf!(PatientContact, PatientCommunication, PatientLink);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use crate::r4::datatypes::{AnyValue, HasExtensions};
    use serde_json::json;

    #[test]
    fn test_patient_example() {
        let json = json!({
            "resourceType": "Patient",
            "id": "example",
            "active": true,
            "name": [
                {"use": "usual", "given": ["Jim"]},
                {"use": "official", "family": "Chalmers", "given": ["Peter", "James"]}
            ],
            "gender": "male",
            "birthDate": "1974-12-25",
            "deceasedBoolean": false,
            "multipleBirthInteger": 2,
            "contact": [{
                "relationship": [{"coding": [{"system": "http://terminology.hl7.org/CodeSystem/v2-0131", "code": "N"}]}],
                "name": {"family": "du Marché", "given": ["Bénédicte"]},
                "gender": "female"
            }],
            "link": [{"other": {"reference": "Patient/pat2"}, "type": "replaced-by"}]
        });

        let patient = Patient::from_json_value(&json).unwrap();
        assert_eq!(patient.gender, Some(AdministrativeGender::Male));
        assert_eq!(patient.official_name().and_then(|n| n.family.as_deref()), Some("Chalmers"));
        assert_eq!(patient.official_name().and_then(|n| n.use_), Some(NameUse::Official));
        assert!(!patient.is_deceased());
        assert_eq!(patient.multiple_birth, Some(PatientMultipleBirth::Integer(2)));
        assert_eq!(
            patient.replaced_by().and_then(|r| r.reference.as_deref()),
            Some("Patient/pat2")
        );
        assert_eq!(patient.to_json_value().unwrap(), json);
    }

    #[test]
    fn test_deceased_date_time() {
        let patient = Patient {
            deceased: Some(PatientDeceased::DateTime("2015-02-14T13:42:00+10:00".into())),
            ..Default::default()
        };
        assert!(patient.is_deceased());
        let json = patient.to_json_value().unwrap();
        assert_eq!(json["deceasedDateTime"], "2015-02-14T13:42:00+10:00");
        assert!(json.get("deceasedBoolean").is_none());
    }

    #[test]
    fn test_extensions_by_url() {
        let patient = Patient::from_json_value(&json!({
            "resourceType": "Patient",
            "extension": [
                {"url": "http://hl7.org/fhir/StructureDefinition/patient-birthPlace", "valueAddress": {"city": "Amsterdam"}},
                {"url": "http://example.org/nickname", "valueString": "Jimmy"},
                {"url": "http://example.org/nickname", "valueString": "J"}
            ]
        }))
        .unwrap();

        assert_eq!(patient.extensions().len(), 3);
        assert_eq!(patient.extensions_by_url("http://example.org/nickname").len(), 2);
        let birth_place = patient
            .extension_by_url("http://hl7.org/fhir/StructureDefinition/patient-birthPlace")
            .and_then(|e| e.value());
        assert!(matches!(birth_place, Some(AnyValue::Address(_))));
    }
}
