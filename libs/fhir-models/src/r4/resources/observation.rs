//! FHIR R4 Observation resource

use super::{impl_resource, walk_domain, walk_each, walk_leaf};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::common::choice::choice_type;
use crate::r4::datatypes::{
    impl_has_extensions, Annotation, CodeableConcept, Extension, Identifier, Meta, Narrative,
    Period, Quantity, Range, Ratio, Reference, SampledData, SimpleQuantity, Timing,
};
use serde::{Deserialize, Serialize};

/// Measurements and simple assertions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct Observation {
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

    /// Business Identifier for observation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    /// Fulfills plan, proposal or order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub based_on: Option<Vec<Reference>>,

    /// Part of referenced event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Vec<Reference>>,

    /// registered | preliminary | final | amended +
    pub status: ObservationStatus,

    /// Classification of type of observation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<CodeableConcept>>,

    /// Type of observation (code / type)
    pub code: CodeableConcept,

    /// Who and/or what the observation is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    /// What the observation is about, when it is not about the subject of record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Vec<Reference>>,

    /// Healthcare event during which this observation is made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    /// Clinically relevant time/time-period for observation
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub effective: Option<ObservationEffective>,

    /// Date/Time this version was made available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,

    /// Who is responsible for the observation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<Vec<Reference>>,

    /// Actual result
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub value: Option<ObservationValue>,

    /// Why the result is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_absent_reason: Option<CodeableConcept>,

    /// High, low, normal, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Vec<CodeableConcept>>,

    /// Comments about the observation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Vec<Annotation>>,

    /// Observed body part
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_site: Option<CodeableConcept>,

    /// How it was done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<CodeableConcept>,

    /// Specimen used for this observation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specimen: Option<Reference>,

    /// (Measurement) Device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Reference>,

    /// Provides guide for interpretation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<Vec<ObservationReferenceRange>>,

    /// Related resource that belongs to the Observation group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_member: Option<Vec<Reference>>,

    /// Related measurements the observation is made from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<Vec<Reference>>,

    /// Component results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Vec<ObservationComponent>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationStatus {
    Registered,
    Preliminary,
    #[default]
    Final,
    Amended,
    Corrected,
    Cancelled,
    EnteredInError,
    Unknown,
}

choice_type! {
    /// `Observation.effective[x]`
    pub enum ObservationEffective("effective") {
        DateTime(String) = "dateTime",
        Period(Period) = "Period",
        Timing(Box<Timing>) = "Timing",
        Instant(String) = "instant",
    }
}

choice_type! {
    /// `Observation.value[x]`, also used by `Observation.component.value[x]`
    pub enum ObservationValue("value") {
        Quantity(Quantity) = "Quantity",
        CodeableConcept(CodeableConcept) = "CodeableConcept",
        String(String) = "string",
        Boolean(bool) = "boolean",
        Integer(i32) = "integer",
        Range(Range) = "Range",
        Ratio(Ratio) = "Ratio",
        SampledData(SampledData) = "SampledData",
        Time(String) = "time",
        DateTime(String) = "dateTime",
        Period(Period) = "Period",
    }
}

/// Provides guide for interpretation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationReferenceRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Low Range, if relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<SimpleQuantity>,

    /// High Range, if relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<SimpleQuantity>,

    /// Reference range qualifier
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    /// Reference range population
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<Vec<CodeableConcept>>,

    /// Applicable age range, if relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Range>,

    /// Text based reference range in an observation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Component results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Type of component observation (code / type)
    pub code: CodeableConcept,

    /// Actual component result
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub value: Option<ObservationValue>,

    /// Why the component result is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_absent_reason: Option<CodeableConcept>,

    /// High, low, normal, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Vec<CodeableConcept>>,

    /// Provides guide for interpretation of component result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<Vec<ObservationReferenceRange>>,
}

impl Observation {
    pub fn new(status: ObservationStatus, code: CodeableConcept) -> Self {
        Self {
            status,
            code,
            ..Default::default()
        }
    }

    /// The component with a coding of `system|code`
    pub fn component(&self, system: &str, code: &str) -> Option<&ObservationComponent> {
        self.component
            .iter()
            .flatten()
            .find(|c| c.code.has_coding(system, code))
    }

    /// Quantity result, if the value is a Quantity
    pub fn value_quantity(&self) -> Option<&Quantity> {
        match &self.value {
            Some(ObservationValue::Quantity(quantity)) => Some(quantity),
            _ => None,
        }
    }
}

impl ModifierExtensionWalk for Observation {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(
            &self.reference_range,
            &format!("{}.referenceRange", path),
            out,
        );
        walk_each(&self.component, &format!("{}.component", path), out);
    }
}

impl ModifierExtensionWalk for ObservationComponent {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        super::push_own(self, path, out);
        walk_each(
            &self.reference_range,
            &format!("{}.referenceRange", path),
            out,
        );
    }
}

impl_resource!(domain: Observation);
impl_has_extensions!(backbone: ObservationReferenceRange, ObservationComponent);
walk_leaf!(ObservationReferenceRange);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ChoiceType, FhirJson};
    use crate::r4::datatypes::Coding;
    use serde_json::json;

    const LOINC: &str = "http://loinc.org";

    fn blood_pressure() -> serde_json::Value {
        json!({
            "resourceType": "Observation",
            "id": "blood-pressure",
            "status": "final",
            "code": {"coding": [{"system": LOINC, "code": "85354-9"}]},
            "subject": {"reference": "Patient/example"},
            "effectiveDateTime": "2012-09-17",
            "component": [
                {
                    "code": {"coding": [{"system": LOINC, "code": "8480-6"}]},
                    "valueQuantity": {"value": 107.0, "unit": "mmHg", "system": "http://unitsofmeasure.org", "code": "mm[Hg]"}
                },
                {
                    "code": {"coding": [{"system": LOINC, "code": "8462-4"}]},
                    "valueQuantity": {"value": 60.0, "unit": "mmHg", "system": "http://unitsofmeasure.org", "code": "mm[Hg]"}
                }
            ]
        })
    }

    #[test]
    fn test_component_values() {
        let observation = Observation::from_json_value(&blood_pressure()).unwrap();
        assert_eq!(
            observation.effective,
            Some(ObservationEffective::DateTime("2012-09-17".to_string()))
        );
        assert!(observation.value.is_none());

        let systolic = observation.component(LOINC, "8480-6").unwrap();
        match &systolic.value {
            Some(ObservationValue::Quantity(q)) => assert_eq!(q.value, Some(107.0)),
            other => panic!("unexpected value: {:?}", other),
        }
        assert!(observation.component(LOINC, "0000-0").is_none());

        assert_eq!(observation.to_json_value().unwrap(), blood_pressure());
    }

    #[test]
    fn test_value_key_per_type() {
        let mut observation = Observation::new(
            ObservationStatus::Preliminary,
            CodeableConcept::from_coding(Coding::new(LOINC, "29463-7")),
        );

        observation.value = Some(ObservationValue::Quantity(Quantity::ucum(67.0, "kg")));
        let json = observation.to_json_value().unwrap();
        assert_eq!(json["valueQuantity"]["code"], "kg");
        assert_eq!(observation.value_quantity().and_then(|q| q.value), Some(67.0));

        observation.value = Some(ObservationValue::Boolean(false));
        let json = observation.to_json_value().unwrap();
        assert_eq!(json["valueBoolean"], false);
        assert!(json.get("valueQuantity").is_none());
        assert!(observation.value_quantity().is_none());

        assert_eq!(
            ObservationValue::Time("08:00:00".into()).element_name(),
            "valueTime"
        );
        assert_eq!(ObservationValue::element_names().len(), 11);
    }

    #[test]
    fn test_effective_timing() {
        let observation = Observation::from_json_value(&json!({
            "resourceType": "Observation",
            "status": "final",
            "code": {"text": "steps"},
            "effectiveTiming": {"event": ["2020-01-01", "2020-01-02"]},
            "valueInteger": 12000
        }))
        .unwrap();
        match &observation.effective {
            Some(ObservationEffective::Timing(timing)) => {
                assert_eq!(timing.event.as_ref().map(Vec::len), Some(2))
            }
            other => panic!("unexpected effective: {:?}", other),
        }
        assert_eq!(observation.value, Some(ObservationValue::Integer(12000)));
    }

    #[test]
    fn test_two_values_rejected() {
        let result = serde_json::from_value::<ObservationValue>(
            json!({"valueString": "a", "valueBoolean": true}),
        );
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("more than one value for `value[x]`"));
    }
}
