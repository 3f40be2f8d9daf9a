//! FHIR R4 MedicationRequest resource

use super::{impl_resource, walk_domain, walk_each, walk_leaf, walk_one};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::common::choice::choice_type;
use crate::r4::datatypes::{
    impl_has_extensions, Annotation, CodeableConcept, Dosage, Duration, Extension, Identifier,
    Meta, Narrative, Period, Reference, SimpleQuantity,
};
use serde::{Deserialize, Serialize};

/// Ordering of medication for patient or group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct MedicationRequest {
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

    /// External ids for this request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    pub status: MedicationRequestStatus,

    /// Reason for current status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<CodeableConcept>,

    pub intent: MedicationRequestIntent,

    /// Type of medication usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<CodeableConcept>>,

    /// routine | urgent | asap | stat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<RequestPriority>,

    /// True if request is prohibiting action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub do_not_perform: Option<bool>,

    /// Reported rather than primary record
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub reported: Option<MedicationRequestReported>,

    /// Medication to be taken
    #[serde(flatten)]
    pub medication: MedicationRequestMedication,

    /// Who or group medication request is for
    pub subject: Reference,

    /// Encounter created as part of encounter/admission/stay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    /// Information to support ordering of the medication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supporting_information: Option<Vec<Reference>>,

    /// When request was initially authored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,

    /// Who/What requested the Request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,

    /// Intended performer of administration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<Reference>,

    /// Desired kind of performer of the medication administration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer_type: Option<CodeableConcept>,

    /// Person who entered the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorder: Option<Reference>,

    /// Reason or indication for ordering or not ordering the medication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<Vec<CodeableConcept>>,

    /// Condition or observation that supports why the prescription is being written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_reference: Option<Vec<Reference>>,

    /// Instantiates FHIR protocol or definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instantiates_canonical: Option<Vec<String>>,

    /// Instantiates external protocol or definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instantiates_uri: Option<Vec<String>>,

    /// What request fulfills
    #[serde(skip_serializing_if = "Option::is_none")]
    pub based_on: Option<Vec<Reference>>,

    /// Composite request this is part of
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_identifier: Option<Identifier>,

    /// Overall pattern of medication administration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_of_therapy_type: Option<CodeableConcept>,

    /// Associated insurance coverage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<Vec<Reference>>,

    /// Information about the prescription
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Vec<Annotation>>,

    /// How the medication should be taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage_instruction: Option<Vec<Dosage>>,

    /// Medication supply authorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispense_request: Option<MedicationRequestDispenseRequest>,

    /// Any restrictions on medication substitution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution: Option<MedicationRequestSubstitution>,

    /// An order/prescription that is being replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_prescription: Option<Reference>,

    /// Clinical Issue with action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_issue: Option<Vec<Reference>>,

    /// A list of events of interest in the lifecycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_history: Option<Vec<Reference>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationRequestStatus {
    Active,
    OnHold,
    Cancelled,
    Completed,
    EnteredInError,
    Stopped,
    Draft,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationRequestIntent {
    Proposal,
    Plan,
    Order,
    OriginalOrder,
    ReflexOrder,
    FillerOrder,
    InstanceOrder,
    Option,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    Routine,
    Urgent,
    Asap,
    Stat,
}

choice_type! {
    /// `MedicationRequest.reported[x]`
    pub enum MedicationRequestReported("reported") {
        Boolean(bool) = "boolean",
        Reference(Reference) = "Reference",
    }
}

choice_type! {
    /// `MedicationRequest.medication[x]`
    pub enum MedicationRequestMedication("medication") {
        CodeableConcept(CodeableConcept) = "CodeableConcept",
        Reference(Reference) = "Reference",
    }
}

/// Medication supply authorization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequestDispenseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// First fill details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_fill: Option<MedicationRequestInitialFill>,

    /// Minimum period of time between dispenses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispense_interval: Option<Duration>,

    /// Time period supply is authorized for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_period: Option<Period>,

    /// Number of refills authorized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_repeats_allowed: Option<u32>,

    /// Amount of medication to supply per dispense
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<SimpleQuantity>,

    /// Number of days supply per dispense
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_supply_duration: Option<Duration>,

    /// Intended dispenser
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<Reference>,
}

/// First fill details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequestInitialFill {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// First fill quantity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<SimpleQuantity>,

    /// First fill duration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
}

/// Any restrictions on medication substitution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequestSubstitution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Whether substitution is allowed or not
    #[serde(flatten)]
    pub allowed: MedicationRequestSubstitutionAllowed,

    /// Why should (not) substitution be made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CodeableConcept>,
}

choice_type! {
    /// `MedicationRequest.substitution.allowed[x]`
    pub enum MedicationRequestSubstitutionAllowed("allowed") {
        Boolean(bool) = "boolean",
        CodeableConcept(CodeableConcept) = "CodeableConcept",
    }
}

impl MedicationRequest {
    pub fn new(
        status: MedicationRequestStatus,
        intent: MedicationRequestIntent,
        medication: MedicationRequestMedication,
        subject: Reference,
    ) -> Self {
        Self {
            id: None,
            meta: None,
            implicit_rules: None,
            language: None,
            text: None,
            contained: None,
            extension: None,
            modifier_extension: None,
            identifier: None,
            status,
            status_reason: None,
            intent,
            category: None,
            priority: None,
            do_not_perform: None,
            reported: None,
            medication,
            subject,
            encounter: None,
            supporting_information: None,
            authored_on: None,
            requester: None,
            performer: None,
            performer_type: None,
            recorder: None,
            reason_code: None,
            reason_reference: None,
            instantiates_canonical: None,
            instantiates_uri: None,
            based_on: None,
            group_identifier: None,
            course_of_therapy_type: None,
            insurance: None,
            note: None,
            dosage_instruction: None,
            dispense_request: None,
            substitution: None,
            prior_prescription: None,
            detected_issue: None,
            event_history: None,
        }
    }

    /// Dosage instructions ordered by `sequence`; unsequenced entries keep
    /// their document order after the sequenced ones.
    pub fn dosage_in_sequence(&self) -> Vec<&Dosage> {
        let mut dosages: Vec<&Dosage> = self.dosage_instruction.iter().flatten().collect();
        dosages.sort_by_key(|d| d.sequence.unwrap_or(i32::MAX));
        dosages
    }

    /// The request forbids the action rather than asking for it
    pub fn is_prohibition(&self) -> bool {
        self.do_not_perform.unwrap_or(false)
    }
}

impl ModifierExtensionWalk for MedicationRequest {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(
            &self.dosage_instruction,
            &format!("{}.dosageInstruction", path),
            out,
        );
        walk_one(
            &self.dispense_request,
            &format!("{}.dispenseRequest", path),
            out,
        );
        walk_one(&self.substitution, &format!("{}.substitution", path), out);
    }
}

impl ModifierExtensionWalk for MedicationRequestDispenseRequest {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        walk_one(&self.initial_fill, &format!("{}.initialFill", path), out);
    }
}

impl_resource!(domain: MedicationRequest);
impl_has_extensions!(
    backbone: MedicationRequestDispenseRequest,
    MedicationRequestInitialFill,
    MedicationRequestSubstitution,
);
walk_leaf!(MedicationRequestInitialFill, MedicationRequestSubstitution);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use crate::r4::datatypes::{DosageAsNeeded, DosageDose, Quantity};
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "resourceType": "MedicationRequest",
            "id": "medrx0302",
            "status": "active",
            "intent": "order",
            "priority": "urgent",
            "medicationReference": {"reference": "Medication/med0310"},
            "subject": {"reference": "Patient/pat1"},
            "authoredOn": "2015-01-15",
            "dosageInstruction": [
                {
                    "sequence": 2,
                    "text": "then as needed",
                    "asNeededBoolean": true
                },
                {
                    "sequence": 1,
                    "text": "6 mg PO daily for remission induction",
                    "timing": {"repeat": {"frequency": 1, "period": 1.0, "periodUnit": "d"}},
                    "doseAndRate": [
                        {"doseQuantity": {"value": 6.0, "unit": "mg", "system": "http://unitsofmeasure.org", "code": "mg"}}
                    ]
                }
            ],
            "dispenseRequest": {
                "initialFill": {"quantity": {"value": 30.0, "unit": "tablet"}},
                "numberOfRepeatsAllowed": 3
            },
            "substitution": {"allowedBoolean": false}
        })
    }

    #[test]
    fn test_decode_choices() {
        let request = MedicationRequest::from_json_value(&sample()).unwrap();
        assert_eq!(request.status, MedicationRequestStatus::Active);
        assert_eq!(request.intent, MedicationRequestIntent::Order);
        assert_eq!(request.priority, Some(RequestPriority::Urgent));
        assert_eq!(
            request.medication,
            MedicationRequestMedication::Reference(Reference::to("Medication", "med0310"))
        );
        assert_eq!(
            request.substitution.as_ref().map(|s| &s.allowed),
            Some(&MedicationRequestSubstitutionAllowed::Boolean(false))
        );

        let dosages = request.dosage_in_sequence();
        assert_eq!(dosages[0].sequence, Some(1));
        assert_eq!(dosages[1].as_needed, Some(DosageAsNeeded::Boolean(true)));
        let dose = dosages[0].dose_and_rate.as_ref().unwrap()[0].dose.as_ref();
        assert_eq!(dose, Some(&DosageDose::Quantity(Quantity::ucum(6.0, "mg"))));

        assert_eq!(request.to_json_value().unwrap(), sample());
    }

    #[test]
    fn test_medication_is_required() {
        let mut json = sample();
        json.as_object_mut().unwrap().remove("medicationReference");
        let err = MedicationRequest::from_json_value(&json).unwrap_err();
        assert!(err.to_string().contains("medication"));
    }

    #[test]
    fn test_new_writes_required_elements() {
        let request = MedicationRequest::new(
            MedicationRequestStatus::Draft,
            MedicationRequestIntent::Proposal,
            MedicationRequestMedication::CodeableConcept(CodeableConcept::from_text("aspirin")),
            Reference::to("Patient", "pat1"),
        );
        assert!(!request.is_prohibition());
        assert_eq!(
            request.to_json_value().unwrap(),
            json!({
                "resourceType": "MedicationRequest",
                "status": "draft",
                "intent": "proposal",
                "medicationCodeableConcept": {"text": "aspirin"},
                "subject": {"reference": "Patient/pat1"}
            })
        );
    }

    #[test]
    fn test_nested_modifier_extension_paths() {
        let mut json = sample();
        json["dispenseRequest"]["initialFill"]["modifierExtension"] =
            json!([{"url": "http://example.org/partial-fill", "valueBoolean": true}]);
        json["dosageInstruction"][0]["modifierExtension"] =
            json!([{"url": "http://example.org/prn-only", "valueBoolean": true}]);

        let resource = Resource::from_json_value(&json).unwrap();
        let paths: Vec<String> = resource
            .collect_modifier_extensions()
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "MedicationRequest.dosageInstruction[0]",
                "MedicationRequest.dispenseRequest.initialFill"
            ]
        );
    }
}
