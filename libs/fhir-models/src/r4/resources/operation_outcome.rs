//! FHIR R4 OperationOutcome resource
//!
//! Used to report errors, warnings and information messages about the
//! result of an action.

use super::{impl_resource, walk_domain, walk_leaf};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::r4::datatypes::{impl_has_extensions, CodeableConcept, Extension, Meta, Narrative};
use serde::{Deserialize, Serialize};

/// Information about the success/failure of an action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct OperationOutcome {
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

    /// A single issue associated with the action
    pub issue: Vec<OperationOutcomeIssue>,
}

/// A single issue associated with the action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcomeIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// fatal | error | warning | information
    pub severity: IssueSeverity,

    /// Error or warning code
    pub code: IssueType,

    /// Additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CodeableConcept>,

    /// Additional diagnostic information about the issue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,

    /// Deprecated: Path of element(s) related to issue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<String>>,

    /// FHIRPath of element(s) related to issue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    #[default]
    Error,
    Warning,
    Information,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    #[default]
    Invalid,
    Structure,
    Required,
    Value,
    Invariant,
    Security,
    Login,
    Unknown,
    Expired,
    Forbidden,
    Suppressed,
    Processing,
    NotSupported,
    Duplicate,
    MultipleMatches,
    NotFound,
    Deleted,
    TooLong,
    CodeInvalid,
    Extension,
    TooCostly,
    BusinessRule,
    Conflict,
    Transient,
    LockError,
    NoStore,
    Exception,
    Timeout,
    Incomplete,
    Throttled,
    Informational,
}

impl OperationOutcome {
    /// An outcome carrying a single error issue
    pub fn error(code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self {
            issue: vec![OperationOutcomeIssue {
                severity: IssueSeverity::Error,
                code,
                diagnostics: Some(diagnostics.into()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Whether any issue is an error or fatal
    pub fn has_errors(&self) -> bool {
        self.issue
            .iter()
            .any(|i| matches!(i.severity, IssueSeverity::Fatal | IssueSeverity::Error))
    }

    /// Issues at `severity`, in document order
    pub fn issues_with_severity(&self, severity: IssueSeverity) -> Vec<&OperationOutcomeIssue> {
        self.issue.iter().filter(|i| i.severity == severity).collect()
    }
}

impl ModifierExtensionWalk for OperationOutcome {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        for (index, issue) in self.issue.iter().enumerate() {
            issue.walk_modifier_extensions(&format!("{}.issue[{}]", path, index), out);
        }
    }
}

impl_resource!(domain: OperationOutcome);
impl_has_extensions!(backbone: OperationOutcomeIssue);
walk_leaf!(OperationOutcomeIssue);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use serde_json::json;

    #[test]
    fn test_error_outcome() {
        let outcome = OperationOutcome::error(IssueType::NotFound, "Patient/123 is not known");
        assert!(outcome.has_errors());
        assert_eq!(
            outcome.to_json_value().unwrap(),
            json!({
                "resourceType": "OperationOutcome",
                "issue": [{
                    "severity": "error",
                    "code": "not-found",
                    "diagnostics": "Patient/123 is not known"
                }]
            })
        );
    }

    #[test]
    fn test_warnings_only() {
        let outcome = OperationOutcome::from_json_value(&json!({
            "resourceType": "OperationOutcome",
            "issue": [
                {"severity": "warning", "code": "business-rule", "expression": ["Patient.birthDate"]},
                {"severity": "information", "code": "informational"}
            ]
        }))
        .unwrap();
        assert!(!outcome.has_errors());
        assert_eq!(outcome.issues_with_severity(IssueSeverity::Warning).len(), 1);
        assert_eq!(outcome.issue[0].code, IssueType::BusinessRule);
    }

    #[test]
    fn test_issue_is_required() {
        assert!(OperationOutcome::from_json_str(r#"{"resourceType":"OperationOutcome"}"#).is_err());
    }
}
