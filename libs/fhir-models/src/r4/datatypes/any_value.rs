//! The open type
//!
//! Elements such as `Extension.value[x]` or `Parameters.parameter.value[x]`
//! admit any FHIR data type. They share this enum and differ only in the base
//! name of their JSON key (see [`crate::common::choice::open_choice`]).

use super::*;
use crate::common::choice::{choice_value, ChoiceValue};

choice_value! {
    /// A value of any FHIR R4 data type
    pub enum AnyValue {
        Base64Binary(String) = "base64Binary",
        Boolean(bool) = "boolean",
        Canonical(String) = "canonical",
        Code(String) = "code",
        Date(String) = "date",
        DateTime(String) = "dateTime",
        Decimal(f64) = "decimal",
        Id(String) = "id",
        Instant(String) = "instant",
        Integer(i32) = "integer",
        Markdown(String) = "markdown",
        Oid(String) = "oid",
        PositiveInt(u32) = "positiveInt",
        String(String) = "string",
        Time(String) = "time",
        UnsignedInt(u32) = "unsignedInt",
        Uri(String) = "uri",
        Url(String) = "url",
        Uuid(String) = "uuid",
        Address(Address) = "Address",
        Age(Age) = "Age",
        Annotation(Annotation) = "Annotation",
        Attachment(Attachment) = "Attachment",
        CodeableConcept(CodeableConcept) = "CodeableConcept",
        Coding(Coding) = "Coding",
        ContactPoint(ContactPoint) = "ContactPoint",
        Count(Count) = "Count",
        Distance(Distance) = "Distance",
        Duration(Duration) = "Duration",
        HumanName(HumanName) = "HumanName",
        Identifier(Identifier) = "Identifier",
        Money(Money) = "Money",
        Period(Period) = "Period",
        Quantity(Quantity) = "Quantity",
        Range(Range) = "Range",
        Ratio(Ratio) = "Ratio",
        Reference(Reference) = "Reference",
        SampledData(SampledData) = "SampledData",
        Signature(Signature) = "Signature",
        Timing(Box<Timing>) = "Timing",
        ContactDetail(ContactDetail) = "ContactDetail",
        Contributor(Contributor) = "Contributor",
        DataRequirement(Box<DataRequirement>) = "DataRequirement",
        Expression(Expression) = "Expression",
        ParameterDefinition(ParameterDefinition) = "ParameterDefinition",
        RelatedArtifact(RelatedArtifact) = "RelatedArtifact",
        TriggerDefinition(Box<TriggerDefinition>) = "TriggerDefinition",
        UsageContext(Box<UsageContext>) = "UsageContext",
        Dosage(Box<Dosage>) = "Dosage",
        Meta(Meta) = "Meta",
    }
}

impl AnyValue {
    /// The string content of any string-based primitive
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Base64Binary(s)
            | Self::Canonical(s)
            | Self::Code(s)
            | Self::Date(s)
            | Self::DateTime(s)
            | Self::Id(s)
            | Self::Instant(s)
            | Self::Markdown(s)
            | Self::Oid(s)
            | Self::String(s)
            | Self::Time(s)
            | Self::Uri(s)
            | Self::Url(s)
            | Self::Uuid(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer content of `integer`, `positiveInt` and `unsignedInt`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(i64::from(*i)),
            Self::PositiveInt(u) | Self::UnsignedInt(u) => Some(i64::from(*u)),
            _ => None,
        }
    }

    /// Whether the held type is a FHIR primitive
    pub fn is_primitive(&self) -> bool {
        self.type_name()
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_lowercase())
    }
}
