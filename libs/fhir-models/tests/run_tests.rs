use ferrum_r4::r4::datatypes::{NameUse, PublicationStatus, ReferenceTarget};
use ferrum_r4::r4::resources::{
    Account, AccountStatus, Bundle, BundleType, Condition, ConditionOnset, DomainResource,
    HttpVerb, ObservationValue, ValueSet,
};
use ferrum_r4::{Error, FhirJson, Resource};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fs::File, path::PathBuf};

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture<T: DeserializeOwned>(relative: &str) -> T {
    let path = fixtures_root().join(relative);
    assert!(path.exists(), "fixture missing at {:?}", path);

    let file = File::open(&path).expect("failed to open fixture");
    serde_json::from_reader(file).expect("failed to deserialize fixture")
}

#[test]
fn parse_account_example() {
    let account: Account = load_fixture("account-example.json");

    assert_eq!(account.id.as_deref(), Some("example"));
    assert_eq!(account.status, AccountStatus::Active);

    let coverage = account.coverage.as_ref().expect("coverage should be present");
    assert_eq!(coverage.len(), 1);
    assert_eq!(coverage[0].priority, Some(1));
    assert!(account.guarantor.is_none());

    let json = account.to_json_value().unwrap();
    assert_eq!(json["resourceType"], "Account");
    assert_eq!(json["coverage"].as_array().unwrap().len(), 1);
    assert!(json.get("guarantor").is_none());
    assert!(json.get("modifierExtension").is_none());
}

#[test]
fn account_example_round_trips() {
    let original: Value = load_fixture("account-example.json");
    let account = Account::from_json_value(&original).unwrap();
    assert_eq!(account.to_json_value().unwrap(), original);
}

#[test]
fn parse_transaction_bundle() {
    let bundle: Bundle = load_fixture("bundle-transaction.json");

    assert_eq!(bundle.bundle_type, BundleType::Transaction);
    assert!(bundle.is_transaction());
    assert_eq!(bundle.entry_count(), 3);

    let first = &bundle.entries()[0];
    let request = first.request.as_ref().expect("request should be present");
    assert_eq!(request.method, HttpVerb::Post);
    assert_eq!(request.url, "Patient");
    let response = first.response.as_ref().expect("response should be present");
    assert_eq!(response.status, "201 Created");

    match first.resource.as_ref() {
        Some(Resource::Patient(patient)) => {
            let name = patient.official_name().expect("official name");
            assert_eq!(name.use_, Some(NameUse::Official));
            assert_eq!(name.family.as_deref(), Some("Chalmers"));
        }
        other => panic!("expected a Patient entry, got {:?}", other),
    }

    let types: Vec<&str> = bundle.resources().map(Resource::resource_type).collect();
    assert_eq!(types, vec!["Patient", "Account"]);

    let json = bundle.to_json_value().unwrap();
    let entry = &json["entry"][0];
    assert!(entry["request"].is_object());
    assert!(entry["response"].is_object());
    assert!(entry["request"].get("ifMatch").is_none());
    assert!(entry["response"].get("etag").is_none());
    assert!(entry["response"].get("lastModified").is_none());
    assert!(json["entry"][2].get("resource").is_none());
}

#[test]
fn transaction_bundle_round_trips() {
    let original: Value = load_fixture("bundle-transaction.json");
    let resource = Resource::from_json_value(&original).unwrap();
    assert_eq!(resource.resource_type(), "Bundle");
    assert_eq!(resource.to_json_value().unwrap(), original);
}

#[test]
fn condition_resolves_contained_resources() {
    let condition: Condition = load_fixture("condition-contained.json");

    assert_eq!(condition.contained().len(), 2);
    assert!(matches!(
        condition.subject.target(),
        Some(ReferenceTarget::Contained("p1"))
    ));

    let subject = condition.resolve(&condition.subject).expect("subject is contained");
    assert_eq!(subject.resource_type(), "Patient");

    match condition.find_contained("o1") {
        Some(Resource::Observation(observation)) => match &observation.value {
            Some(ObservationValue::Quantity(quantity)) => {
                assert_eq!(quantity.value, Some(72.5));
                assert_eq!(quantity.unit.as_deref(), Some("kg"));
            }
            other => panic!("unexpected value: {:?}", other),
        },
        other => panic!("expected contained Observation, got {:?}", other),
    }

    match &condition.onset {
        Some(ConditionOnset::Age(age)) => assert_eq!(age.value, Some(30.0)),
        other => panic!("unexpected onset: {:?}", other),
    }
}

#[test]
fn condition_reports_unresolved_local_reference() {
    let resource: Resource = load_fixture("condition-contained.json");
    assert_eq!(
        resource.unresolved_local_references().unwrap(),
        vec!["#o2".to_string()]
    );
}

#[test]
fn modifier_extensions_in_contained_resources_are_found() {
    let resource: Resource = load_fixture("condition-contained.json");
    let url = "http://example.org/fhir/StructureDefinition/identity-unverified";

    let found = resource.collect_modifier_extensions();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, "Condition.contained[0]");
    assert_eq!(found[0].1.url, url);

    match resource.ensure_modifiers_understood(&[]) {
        Err(Error::UnrecognizedModifierExtension { path, url: found_url }) => {
            assert_eq!(path, "Condition.contained[0]");
            assert_eq!(found_url, url);
        }
        other => panic!("expected unrecognized modifier error, got {:?}", other),
    }
    assert!(resource.ensure_modifiers_understood(&[url]).is_ok());
}

#[test]
fn contained_resources_keep_their_resource_type() {
    let original: Value = load_fixture("condition-contained.json");
    let condition = Condition::from_json_value(&original).unwrap();
    let json = condition.to_json_value().unwrap();

    assert_eq!(json["contained"][0]["resourceType"], "Patient");
    assert_eq!(json["contained"][1]["resourceType"], "Observation");
    assert_eq!(json["contained"][1]["valueQuantity"]["value"], 72.5);
    assert_eq!(json, original);
}

#[test]
fn parse_value_set_example() {
    let value_set: ValueSet = load_fixture("valueset-example.json");

    assert_eq!(
        value_set.url.as_deref(),
        Some("http://hl7.org/fhir/ValueSet/example-extensional")
    );
    assert_eq!(value_set.status, PublicationStatus::Draft);

    let compose = value_set.compose.as_ref().expect("compose should be present");
    assert_eq!(compose.include.len(), 1);
    let concepts = compose.include[0]
        .concept
        .as_ref()
        .expect("concepts should be present");
    assert_eq!(concepts.len(), 4);
    assert_eq!(value_set.included_systems(), vec!["http://loinc.org"]);
}

#[test]
fn display_string_is_indented_json() {
    let resource: Resource = load_fixture("account-example.json");
    let display = resource.to_string();

    assert!(display.starts_with("{\n  \"resourceType\": \"Account\""));
    assert_eq!(display, resource.to_display_string());
    assert_eq!(display, resource.to_json_pretty().unwrap());
}

#[test]
fn unknown_resource_type_is_rejected() {
    let err = Resource::from_json_str(r#"{"resourceType": "Basic", "id": "x"}"#).unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
    assert!(err.to_string().contains("Basic"));
}

#[test]
fn fixture_of_another_type_is_rejected() {
    let original: Value = load_fixture("account-example.json");
    let err = Condition::from_json_value(&original).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
    assert!(err.to_string().contains("Account"));
}

#[test]
fn malformed_onset_in_contained_fixture_is_rejected() {
    let mut original: Value = load_fixture("condition-contained.json");
    original["onsetAge"] = serde_json::json!({"value": "thirty"});
    assert!(Condition::from_json_value(&original).is_err());
    assert!(Resource::from_json_value(&original).is_err());

    let mut original: Value = load_fixture("condition-contained.json");
    original["onsetString"] = serde_json::json!("in childhood");
    let err = Resource::from_json_value(&original).unwrap_err();
    assert!(err.to_string().contains("more than one value for `onset[x]`"));
}
