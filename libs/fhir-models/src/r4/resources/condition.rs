//! FHIR R4 Condition resource

use super::{impl_resource, walk_domain, walk_each, walk_leaf};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::common::choice::choice_type;
use crate::r4::datatypes::{
    impl_has_extensions, Age, Annotation, CodeableConcept, Extension, Identifier, Meta,
    Narrative, Period, Range, Reference,
};
use serde::{Deserialize, Serialize};

/// Detailed information about conditions, problems or diagnoses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct Condition {
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

    /// External Ids for this condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    /// active | recurrence | relapse | inactive | remission | resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,

    /// unconfirmed | provisional | differential | confirmed | refuted | entered-in-error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,

    /// problem-list-item | encounter-diagnosis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<CodeableConcept>>,

    /// Subjective severity of condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<CodeableConcept>,

    /// Identification of the condition, problem or diagnosis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    /// Anatomical location, if relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_site: Option<Vec<CodeableConcept>>,

    /// Who has the condition?
    pub subject: Reference,

    /// Encounter created as part of
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    /// Estimated or actual date, date-time, or age
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub onset: Option<ConditionOnset>,

    /// When in resolution/remission
    #[serde(
        flatten,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::common::choice::optional"
    )]
    pub abatement: Option<ConditionAbatement>,

    /// Date record was first recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,

    /// Who recorded the condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorder: Option<Reference>,

    /// Person who asserts this condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asserter: Option<Reference>,

    /// Stage/grade, usually assessed formally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Vec<ConditionStage>>,

    /// Supporting evidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<ConditionEvidence>>,

    /// Additional information about the Condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Vec<Annotation>>,
}

choice_type! {
    /// `Condition.onset[x]`
    pub enum ConditionOnset("onset") {
        DateTime(String) = "dateTime",
        Age(Age) = "Age",
        Period(Period) = "Period",
        Range(Range) = "Range",
        String(String) = "string",
    }
}

choice_type! {
    /// `Condition.abatement[x]`
    pub enum ConditionAbatement("abatement") {
        DateTime(String) = "dateTime",
        Age(Age) = "Age",
        Period(Period) = "Period",
        Range(Range) = "Range",
        String(String) = "string",
    }
}

/// Stage/grade, usually assessed formally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionStage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Simple summary (disease specific)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CodeableConcept>,

    /// Formal record of assessment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Vec<Reference>>,

    /// Kind of staging
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,
}

/// Supporting evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionEvidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Manifestation/symptom
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Vec<CodeableConcept>>,

    /// Supporting information found elsewhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Vec<Reference>>,
}

impl Condition {
    pub fn new(subject: Reference) -> Self {
        Self {
            subject,
            ..Default::default()
        }
    }

    /// Whether the condition has abated, judged from `abatement[x]` alone
    pub fn has_abated(&self) -> bool {
        self.abatement.is_some()
    }
}

impl ModifierExtensionWalk for Condition {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(&self.stage, &format!("{}.stage", path), out);
        walk_each(&self.evidence, &format!("{}.evidence", path), out);
    }
}

impl_resource!(domain: Condition);
impl_has_extensions!(backbone: ConditionStage, ConditionEvidence);
walk_leaf!(ConditionStage, ConditionEvidence);
