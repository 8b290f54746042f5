//! People: patients, providers and their demographic parts.

use crate::common::{AuditInfo, DomainRef};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Administrative gender as stored by the platform (single-letter codes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
    #[serde(rename = "U")]
    Unknown,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
            Gender::Unknown => "U",
        }
    }

    /// Parses a platform gender code. Case-insensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            "O" => Some(Gender::Other),
            "U" => Some(Gender::Unknown),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonName {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub preferred: bool,
    pub voided: bool,
}

impl PersonName {
    /// Full name in display order, skipping empty parts.
    pub fn full_name(&self) -> String {
        [
            &self.prefix,
            &self.given_name,
            &self.middle_name,
            &self.family_name,
            &self.suffix,
        ]
        .into_iter()
        .flatten()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonAddress {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_village: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub preferred: bool,
    pub voided: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonAttributeType {
    pub uuid: Uuid,
    pub name: String,
}

/// A free-form typed attribute of a person, e.g. a telephone number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonAttribute {
    pub uuid: Uuid,
    pub attribute_type: PersonAttributeType,
    pub value: String,
    pub voided: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientIdentifierType {
    pub uuid: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientIdentifier {
    pub uuid: Uuid,
    pub identifier: String,
    pub identifier_type: PatientIdentifierType,
    /// Location where the identifier was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<DomainRef>,
    pub preferred: bool,
    pub voided: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<PatientIdentifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<PersonName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<PersonAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<PersonAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
    pub birthdate_estimated: bool,
    pub dead: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<DateTime<Utc>>,
    pub voided: bool,
    pub audit: AuditInfo,
}

impl Patient {
    /// The preferred non-voided name, falling back to the first non-voided name.
    pub fn preferred_name(&self) -> Option<&PersonName> {
        preferred(&self.names, |n| n.preferred, |n| n.voided)
    }

    /// The preferred non-voided identifier, falling back to the first non-voided one.
    pub fn preferred_identifier(&self) -> Option<&PatientIdentifier> {
        preferred(&self.identifiers, |i| i.preferred, |i| i.voided)
    }
}

/// A care provider (clinician) known to the platform.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Provider {
    pub uuid: Uuid,
    /// Provider's institutional identifier, e.g. a staff number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<PersonName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<PersonAddress>,
    pub retired: bool,
    pub audit: AuditInfo,
}

impl Provider {
    pub fn preferred_name(&self) -> Option<&PersonName> {
        preferred(&self.names, |n| n.preferred, |n| n.voided)
    }
}

fn preferred<T>(
    items: &[T],
    is_preferred: impl Fn(&T) -> bool,
    is_voided: impl Fn(&T) -> bool,
) -> Option<&T> {
    items
        .iter()
        .find(|item| is_preferred(item) && !is_voided(item))
        .or_else(|| items.iter().find(|item| !is_voided(item)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_codes_round_trip() {
        for gender in [Gender::Male, Gender::Female, Gender::Other, Gender::Unknown] {
            assert_eq!(Gender::from_code(gender.code()), Some(gender));
        }
        assert_eq!(Gender::from_code("f"), Some(Gender::Female));
        assert_eq!(Gender::from_code("X"), None);
    }

    #[test]
    fn full_name_skips_missing_parts() {
        let name = PersonName {
            given_name: Some("Sarah".into()),
            middle_name: Some("  ".into()),
            family_name: Some("Williams".into()),
            ..Default::default()
        };
        assert_eq!(name.full_name(), "Sarah Williams");
    }

    #[test]
    fn preferred_name_skips_voided_and_falls_back() {
        let patient = Patient {
            names: vec![
                PersonName {
                    given_name: Some("Old".into()),
                    preferred: true,
                    voided: true,
                    ..Default::default()
                },
                PersonName {
                    given_name: Some("Current".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let name = patient.preferred_name().expect("a usable name");
        assert_eq!(name.given_name.as_deref(), Some("Current"));
    }

    #[test]
    fn gender_serialises_as_platform_code() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"F\"");
    }
}
