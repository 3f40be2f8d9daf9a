//! FHIR R4 Account resource

use super::{impl_resource, walk_domain, walk_each, walk_leaf};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::r4::datatypes::{
    impl_has_extensions, CodeableConcept, Extension, Identifier, Meta, Narrative, Period,
    Reference,
};
use serde::{Deserialize, Serialize};

/// Tracks balance, charges, for patient or cost center
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct Account {
    /// Logical id of this artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Metadata about the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    /// A set of rules under which this content was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit_rules: Option<String>,

    /// Language of the resource content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Text summary of the resource, for human interpretation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    /// Contained, inline Resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contained: Option<Vec<Resource>>,

    /// Additional content defined by implementations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Extensions that cannot be ignored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Account number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    /// active | inactive | entered-in-error | on-hold | unknown
    pub status: AccountStatus,

    /// E.g. patient, expense, depreciation
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    /// Human-readable label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The entity that caused the expenses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Vec<Reference>>,

    /// Transaction window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_period: Option<Period>,

    /// The party(s) that are responsible for covering the payment of this account, and what order should they be applied to the account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Vec<AccountCoverage>>,

    /// Entity managing the Account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Reference>,

    /// Explanation of purpose/use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The parties ultimately responsible for balancing the Account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guarantor: Option<Vec<AccountGuarantor>>,

    /// Reference to a parent Account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Reference>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    EnteredInError,
    OnHold,
    Unknown,
}

/// The party(s) that are responsible for covering the payment of this account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCoverage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// The party(s), such as insurances, that may contribute to the payment of this account
    pub coverage: Reference,

    /// The priority of the coverage in the context of this account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

/// The parties ultimately responsible for balancing the Account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountGuarantor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Responsible entity
    pub party: Reference,

    /// Credit or other hold applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_hold: Option<bool>,

    /// Guarantee account during
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl Account {
    pub fn new(status: AccountStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Coverages ordered by priority; entries without a priority come last.
    pub fn coverages_by_priority(&self) -> Vec<&AccountCoverage> {
        let mut coverages: Vec<&AccountCoverage> = self.coverage.iter().flatten().collect();
        coverages.sort_by_key(|c| c.priority.unwrap_or(u32::MAX));
        coverages
    }
}

impl ModifierExtensionWalk for Account {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(&self.coverage, &format!("{}.coverage", path), out);
        walk_each(&self.guarantor, &format!("{}.guarantor", path), out);
    }
}

impl_resource!(domain: Account);
impl_has_extensions!(backbone: AccountCoverage, AccountGuarantor);
walk_leaf!(AccountCoverage, AccountGuarantor);
