//! Metadata types used by conformance and knowledge resources

use super::{
    Attachment, CodeableConcept, Coding, ContactPoint, Duration, Extension, Period, Quantity,
    Range, Reference, Timing,
};
use crate::common::choice::choice_type;
use serde::{Deserialize, Serialize};

/// Publication status of a conformance or knowledge artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Active,
    Retired,
    Unknown,
}

/// Contact information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Name of an individual to contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Contact details for individual or organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telecom: Option<Vec<ContactPoint>>,
}

/// Contributor information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// author | editor | reviewer | endorser
    #[serde(rename = "type")]
    pub type_: ContributorType,

    /// Who contributed the content
    pub name: String,

    /// Contact details of the contributor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<ContactDetail>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorType {
    #[default]
    Author,
    Editor,
    Reviewer,
    Endorser,
}

/// Describes the context of use for a conformance or knowledge resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Type of context being specified
    pub code: Coding,

    /// Value that defines the context
    #[serde(flatten)]
    pub value: UsageContextValue,
}

choice_type! {
    /// `UsageContext.value[x]`
    pub enum UsageContextValue("value") {
        CodeableConcept(CodeableConcept) = "CodeableConcept",
        Quantity(Quantity) = "Quantity",
        Range(Range) = "Range",
        Reference(Reference) = "Reference",
    }
}

/// An expression that can be used to generate a value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Natural language description of the condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Short name assigned to expression for reuse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// text/cql | text/fhirpath | application/x-fhir-query | etc.
    pub language: String,

    /// Expression in specified language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    /// Where the expression is found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Related artifacts for a knowledge resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedArtifact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// documentation | justification | citation | predecessor | successor | derived-from | depends-on | composed-of
    #[serde(rename = "type")]
    pub type_: RelatedArtifactType,

    /// Short label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Brief description of the related artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Bibliographic citation for the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,

    /// Where the artifact can be accessed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// What document is being referenced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Attachment>,

    /// What resource is being referenced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelatedArtifactType {
    #[default]
    Documentation,
    Justification,
    Citation,
    Predecessor,
    Successor,
    DerivedFrom,
    DependsOn,
    ComposedOf,
}

/// Definition of a parameter to a module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Name used to access the parameter value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// in | out
    #[serde(rename = "use")]
    pub use_: ParameterUse,

    /// Minimum cardinality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,

    /// Maximum cardinality (a number of *)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,

    /// A brief description of the parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    /// What type of value
    #[serde(rename = "type")]
    pub type_: String,

    /// What profile the value is expected to be
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterUse {
    #[default]
    In,
    Out,
}

/// Describes a required data item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// The type of the required data
    #[serde(rename = "type")]
    pub type_: String,

    /// The profile of the required data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Vec<String>>,

    /// E.g. Patient, Practitioner, RelatedPerson, Organization, Location, Device
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub subject: Option<DataRequirementSubject>,

    /// Indicates specific structure elements that are referenced by the knowledge module
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_support: Option<Vec<String>>,

    /// What codes are expected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_filter: Option<Vec<DataRequirementCodeFilter>>,

    /// What dates/date ranges are expected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_filter: Option<Vec<DataRequirementDateFilter>>,

    /// Number of results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Order of the results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<DataRequirementSort>>,
}

choice_type! {
    /// `DataRequirement.subject[x]`
    pub enum DataRequirementSubject("subject") {
        CodeableConcept(CodeableConcept) = "CodeableConcept",
        Reference(Reference) = "Reference",
    }
}

/// What codes are expected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequirementCodeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// A code-valued attribute to filter on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// A coded (token) parameter to search on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_param: Option<String>,

    /// Valueset for the filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,

    /// What code is expected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Vec<Coding>>,
}

/// What dates/date ranges are expected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequirementDateFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// A date-valued attribute to filter on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// A date valued parameter to search on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_param: Option<String>,

    /// The value of the filter, as a Period, DateTime, or Duration value
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub value: Option<DataRequirementDateFilterValue>,
}

choice_type! {
    /// `DataRequirement.dateFilter.value[x]`
    pub enum DataRequirementDateFilterValue("value") {
        DateTime(String) = "dateTime",
        Period(Period) = "Period",
        Duration(Duration) = "Duration",
    }
}

/// Order of the results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequirementSort {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// The name of the attribute to perform the sort
    pub path: String,

    /// ascending | descending
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Defines an expected trigger for a module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// named-event | periodic | data-changed | data-added | data-modified | data-removed | data-accessed | data-access-ended
    #[serde(rename = "type")]
    pub type_: TriggerType,

    /// Name or URI that identifies the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Timing of the event
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub timing: Option<TriggerDefinitionTiming>,

    /// Triggering data of the event (multiple = 'and')
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<DataRequirement>>,

    /// Whether the event triggers (boolean expression)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
}

choice_type! {
    /// `TriggerDefinition.timing[x]`
    pub enum TriggerDefinitionTiming("timing") {
        Timing(Box<Timing>) = "Timing",
        Reference(Reference) = "Reference",
        Date(String) = "date",
        DateTime(String) = "dateTime",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerType {
    #[default]
    NamedEvent,
    Periodic,
    DataChanged,
    DataAdded,
    DataModified,
    DataRemoved,
    DataAccessed,
    DataAccessEnded,
}

super::impl_has_extensions!(
    element: ContactDetail,
    Contributor,
    UsageContext,
    Expression,
    RelatedArtifact,
    ParameterDefinition,
    DataRequirement,
    DataRequirementCodeFilter,
    DataRequirementDateFilter,
    DataRequirementSort,
    TriggerDefinition,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_context_requires_value() {
        let context: UsageContext = serde_json::from_value(json!({
            "code": {
                "system": "http://terminology.hl7.org/CodeSystem/usage-context-type",
                "code": "focus"
            },
            "valueCodeableConcept": {"text": "Diabetes"}
        }))
        .unwrap();
        assert!(matches!(
            context.value,
            UsageContextValue::CodeableConcept(ref c) if c.text.as_deref() == Some("Diabetes")
        ));

        let err = serde_json::from_value::<UsageContext>(json!({
            "code": {"code": "focus"}
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_related_artifact_type_codes() {
        let artifact = RelatedArtifact {
            type_: RelatedArtifactType::DependsOn,
            resource: Some("http://example.org/Library/common".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&artifact).unwrap(),
            json!({"type": "depends-on", "resource": "http://example.org/Library/common"})
        );
    }

    #[test]
    fn test_data_requirement_choices() {
        let json = json!({
            "type": "Observation",
            "subjectCodeableConcept": {"text": "Patient"},
            "dateFilter": [
                {"path": "effective", "valuePeriod": {"start": "2020-01-01"}}
            ],
            "sort": [{"path": "effective", "direction": "descending"}]
        });
        let requirement: DataRequirement = serde_json::from_value(json.clone()).unwrap();
        assert!(matches!(
            requirement.subject,
            Some(DataRequirementSubject::CodeableConcept(_))
        ));
        let filter = &requirement.date_filter.as_ref().unwrap()[0];
        assert!(matches!(
            filter.value,
            Some(DataRequirementDateFilterValue::Period(_))
        ));
        assert_eq!(
            requirement.sort.as_ref().unwrap()[0].direction,
            SortDirection::Descending
        );
        assert_eq!(serde_json::to_value(&requirement).unwrap(), json);
    }

    #[test]
    fn test_trigger_timing_date_time() {
        let trigger = TriggerDefinition {
            type_: TriggerType::Periodic,
            timing: Some(TriggerDefinitionTiming::DateTime(
                "2021-06-01T08:00:00Z".to_string(),
            )),
            ..Default::default()
        };
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(
            json,
            json!({"type": "periodic", "timingDateTime": "2021-06-01T08:00:00Z"})
        );
    }
}
