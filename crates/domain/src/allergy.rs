use crate::common::{AuditInfo, DomainRef};
use crate::concept::Concept;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllergenType {
    Drug,
    Food,
    Environment,
    #[default]
    Other,
}

/// The substance a patient reacts to: a coded concept, or free text when uncoded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allergen {
    pub allergen_type: AllergenType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coded_allergen: Option<Concept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_coded_allergen: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllergyReaction {
    pub uuid: Uuid,
    pub reaction: Concept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction_non_coded: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allergy {
    pub uuid: Uuid,
    pub patient: DomainRef,
    pub allergen: Allergen,
    /// Severity concept; matched against the configured mild/moderate/severe concepts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Concept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<AllergyReaction>,
    pub voided: bool,
    pub audit: AuditInfo,
}
