//! Coded concepts and their mappings to external terminologies.

use bridge_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dictionary concept.
///
/// Concepts are identified by uuid inside the platform and linked to external code systems
/// (CIEL, LOINC, SNOMED CT, ...) through [`ConceptMapping`]s.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Concept {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Concept class name, e.g. `Test`, `Finding`, `Diagnosis`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_class: Option<String>,
    pub datatype: ConceptDatatype,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<ConceptMapping>,
    /// Units and limits; only present for numeric concepts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<ConceptNumeric>,
}

impl Concept {
    pub fn new(uuid: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            uuid,
            display_name: Some(display_name.into()),
            ..Default::default()
        }
    }

    /// Mappings ordered so that SAME-AS mappings come first, keeping the original order
    /// within each group.
    pub fn mappings_by_priority(&self) -> Vec<&ConceptMapping> {
        let mut ordered: Vec<&ConceptMapping> = self.mappings.iter().collect();
        ordered.sort_by_key(|m| m.map_type != ConceptMapType::SameAs);
        ordered
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptDatatype {
    Numeric,
    Coded,
    Text,
    Boolean,
    Datetime,
    #[default]
    NotApplicable,
}

/// Link between a concept and a code in an external source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptMapping {
    /// Name of the concept source, e.g. `CIEL` or `LOINC`.
    pub source: NonEmptyText,
    pub code: NonEmptyText,
    #[serde(default)]
    pub map_type: ConceptMapType,
}

impl ConceptMapping {
    pub fn same_as(source: NonEmptyText, code: NonEmptyText) -> Self {
        Self {
            source,
            code,
            map_type: ConceptMapType::SameAs,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConceptMapType {
    #[default]
    SameAs,
    NarrowerThan,
    BroaderThan,
    Other,
}

/// Units and reference limits of a numeric concept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptNumeric {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_normal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hi_normal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_critical: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hi_critical: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_absolute: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hi_absolute: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(source: &str, code: &str, map_type: ConceptMapType) -> ConceptMapping {
        ConceptMapping {
            source: NonEmptyText::new(source).unwrap(),
            code: NonEmptyText::new(code).unwrap(),
            map_type,
        }
    }

    #[test]
    fn same_as_mappings_sort_first_and_keep_order() {
        let concept = Concept {
            mappings: vec![
                mapping("SNOMED CT", "1", ConceptMapType::NarrowerThan),
                mapping("CIEL", "2", ConceptMapType::SameAs),
                mapping("LOINC", "3", ConceptMapType::SameAs),
            ],
            ..Default::default()
        };

        let codes: Vec<&str> = concept
            .mappings_by_priority()
            .iter()
            .map(|m| m.code.as_str())
            .collect();
        assert_eq!(codes, vec!["2", "3", "1"]);
    }

    #[test]
    fn map_type_uses_kebab_case() {
        let json = serde_json::to_string(&ConceptMapType::SameAs).unwrap();
        assert_eq!(json, "\"same-as\"");
    }
}
