//! FHIR R4 Medication resource

use super::{impl_resource, walk_domain, walk_each, walk_leaf, walk_one};
use super::{ModifierExtensionAt, ModifierExtensionWalk, Resource};
use crate::common::choice::choice_type;
use crate::r4::datatypes::{
    impl_has_extensions, CodeableConcept, Extension, Identifier, Meta, Narrative, Ratio,
    Reference,
};
use serde::{Deserialize, Serialize};

/// Definition of a Medication
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "resourceType", rename_all = "camelCase")]
pub struct Medication {
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

    /// Business identifier for this medication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,

    /// Codes that identify this medication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    /// active | inactive | entered-in-error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MedicationStatus>,

    /// Manufacturer of the item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<Reference>,

    /// powder | tablets | capsule +
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<CodeableConcept>,

    /// Amount of drug in package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Ratio>,

    /// Active or inactive ingredient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<Vec<MedicationIngredient>>,

    /// Details about packaged medications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<MedicationBatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationStatus {
    Active,
    Inactive,
    EnteredInError,
}

/// Active or inactive ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationIngredient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// The actual ingredient or content
    #[serde(flatten)]
    pub item: MedicationIngredientItem,

    /// Active ingredient indicator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    /// Quantity of ingredient present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<Ratio>,
}

choice_type! {
    /// `Medication.ingredient.item[x]`
    pub enum MedicationIngredientItem("item") {
        CodeableConcept(CodeableConcept) = "CodeableConcept",
        Reference(Reference) = "Reference",
    }
}

/// Details about packaged medications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationBatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_extension: Option<Vec<Extension>>,

    /// Identifier assigned to batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,

    /// When batch will expire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

impl ModifierExtensionWalk for Medication {
    fn walk_modifier_extensions<'a>(&'a self, path: &str, out: &mut Vec<ModifierExtensionAt<'a>>) {
        walk_domain(self, path, out);
        walk_each(&self.ingredient, &format!("{}.ingredient", path), out);
        walk_one(&self.batch, &format!("{}.batch", path), out);
    }
}

impl_resource!(domain: Medication);
impl_has_extensions!(backbone: MedicationIngredient, MedicationBatch);
walk_leaf!(MedicationIngredient, MedicationBatch);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FhirJson;
    use crate::r4::datatypes::Coding;
    use serde_json::json;

    #[test]
    fn test_ingredient_item_choice() {
        let json = json!({
            "resourceType": "Medication",
            "id": "med0321",
            "code": {"text": "Amoxicillin 250mg/5ml Suspension"},
            "ingredient": [
                {
                    "itemCodeableConcept": {
                        "coding": [{"system": "http://snomed.info/sct", "code": "372687004"}]
                    },
                    "isActive": true
                },
                {"itemReference": {"reference": "#sub1"}}
            ],
            "batch": {"lotNumber": "9494788", "expirationDate": "2017-05-22"}
        });

        let medication = Medication::from_json_value(&json).unwrap();
        let ingredients = medication.ingredient.as_ref().unwrap();
        assert_eq!(
            ingredients[0].item,
            MedicationIngredientItem::CodeableConcept(CodeableConcept::from_coding(Coding::new(
                "http://snomed.info/sct",
                "372687004"
            )))
        );
        assert!(matches!(
            ingredients[1].item,
            MedicationIngredientItem::Reference(_)
        ));
        assert_eq!(medication.to_json_value().unwrap(), json);
    }

    #[test]
    fn test_ingredient_requires_item() {
        let result = Medication::from_json_value(&json!({
            "resourceType": "Medication",
            "ingredient": [{"isActive": true}]
        }));
        assert!(result.is_err());
    }
}
