//! Resolution of domain entities the reverse translators cannot build from FHIR alone.
//!
//! A FHIR resource only carries codes and names. Turning it back into a domain record means
//! finding the platform's concept, identifier type or attribute type behind them.

use crate::{TranslationError, TranslationResult};
use bridge_domain::{Concept, PatientIdentifierType, PersonAttributeType};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Read-only lookup of platform dictionary entries.
pub trait DomainLookup {
    fn concept_by_uuid(&self, uuid: Uuid) -> Option<Concept>;

    /// Concept mapped to `code` in the named concept source.
    fn concept_by_mapping(&self, source: &str, code: &str) -> Option<Concept>;

    fn identifier_type_by_name(&self, name: &str) -> Option<PatientIdentifierType>;

    fn attribute_type_by_name(&self, name: &str) -> Option<PersonAttributeType>;
}

/// Lookup shared by every translator built from one configuration.
pub type SharedLookup = Arc<dyn DomainLookup + Send + Sync>;

/// HashMap-backed [`DomainLookup`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryLookup {
    concepts: HashMap<Uuid, Concept>,
    mappings: HashMap<(String, String), Uuid>,
    identifier_types: HashMap<String, PatientIdentifierType>,
    attribute_types: HashMap<String, PersonAttributeType>,
}

/// JSON fixture shape accepted by [`InMemoryLookup::load`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LookupFixture {
    concepts: Vec<Concept>,
    identifier_types: Vec<PatientIdentifierType>,
    attribute_types: Vec<PersonAttributeType>,
}

impl InMemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concept(mut self, concept: Concept) -> Self {
        self.insert_concept(concept);
        self
    }

    pub fn with_identifier_type(mut self, identifier_type: PatientIdentifierType) -> Self {
        self.identifier_types
            .insert(name_key(&identifier_type.name), identifier_type);
        self
    }

    pub fn with_attribute_type(mut self, attribute_type: PersonAttributeType) -> Self {
        self.attribute_types
            .insert(name_key(&attribute_type.name), attribute_type);
        self
    }

    pub fn insert_concept(&mut self, concept: Concept) {
        for mapping in &concept.mappings {
            self.mappings.insert(
                (name_key(mapping.source.as_str()), mapping.code.as_str().to_string()),
                concept.uuid,
            );
        }
        self.concepts.insert(concept.uuid, concept);
    }

    /// Parse a JSON fixture of the form
    /// `{"concepts": [...], "identifier_types": [...], "attribute_types": [...]}`.
    pub fn from_json_str(json_text: &str) -> TranslationResult<Self> {
        let fixture: LookupFixture =
            serde_json::from_str(json_text).map_err(TranslationError::LookupJson)?;

        let mut lookup = Self::new();
        for concept in fixture.concepts {
            lookup.insert_concept(concept);
        }
        for identifier_type in fixture.identifier_types {
            lookup = lookup.with_identifier_type(identifier_type);
        }
        for attribute_type in fixture.attribute_types {
            lookup = lookup.with_attribute_type(attribute_type);
        }
        Ok(lookup)
    }

    pub fn load(path: &Path) -> TranslationResult<Self> {
        let text = std::fs::read_to_string(path).map_err(TranslationError::LookupRead)?;
        let lookup = Self::from_json_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            concepts = lookup.concepts.len(),
            identifier_types = lookup.identifier_types.len(),
            "loaded lookup fixture"
        );
        Ok(lookup)
    }

    pub fn into_shared(self) -> SharedLookup {
        Arc::new(self)
    }
}

impl DomainLookup for InMemoryLookup {
    fn concept_by_uuid(&self, uuid: Uuid) -> Option<Concept> {
        self.concepts.get(&uuid).cloned()
    }

    fn concept_by_mapping(&self, source: &str, code: &str) -> Option<Concept> {
        let uuid = self
            .mappings
            .get(&(name_key(source), code.trim().to_string()))?;
        self.concepts.get(uuid).cloned()
    }

    fn identifier_type_by_name(&self, name: &str) -> Option<PatientIdentifierType> {
        self.identifier_types.get(&name_key(name)).cloned()
    }

    fn attribute_type_by_name(&self, name: &str) -> Option<PersonAttributeType> {
        self.attribute_types.get(&name_key(name)).cloned()
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"{
  "concepts": [
    {
      "uuid": "5088aaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa",
      "display_name": "Temperature (C)",
      "datatype": "numeric",
      "mappings": [
        { "source": "CIEL", "code": "5088" },
        { "source": "LOINC", "code": "8310-5", "map_type": "narrower-than" }
      ]
    }
  ],
  "identifier_types": [
    { "uuid": "05a29f94-c0ed-11e2-94be-8c13b969e334", "name": "OpenMRS ID" }
  ],
  "attribute_types": [
    { "uuid": "14d4f066-15f5-102d-96e4-000c29c2a5d7", "name": "Telephone Number" }
  ]
}"#;

    #[test]
    fn resolves_concepts_by_uuid_and_mapping() {
        let lookup = InMemoryLookup::from_json_str(FIXTURE).expect("valid fixture");
        let uuid = Uuid::parse_str("5088aaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa").unwrap();

        let by_uuid = lookup.concept_by_uuid(uuid).expect("known uuid");
        assert_eq!(by_uuid.display_name.as_deref(), Some("Temperature (C)"));

        let by_mapping = lookup.concept_by_mapping("loinc", "8310-5").expect("known mapping");
        assert_eq!(by_mapping.uuid, uuid);

        assert!(lookup.concept_by_mapping("SNOMED CT", "8310-5").is_none());
    }

    #[test]
    fn resolves_types_by_name_ignoring_case() {
        let lookup = InMemoryLookup::from_json_str(FIXTURE).expect("valid fixture");
        assert!(lookup.identifier_type_by_name("openmrs id").is_some());
        assert!(lookup.attribute_type_by_name("Telephone Number").is_some());
        assert!(lookup.identifier_type_by_name("Passport").is_none());
    }

    #[test]
    fn rejects_unknown_fixture_keys() {
        let err = InMemoryLookup::from_json_str(r#"{"drugs": []}"#).expect_err("unknown key");
        assert!(matches!(err, TranslationError::LookupJson(_)));
    }

    #[test]
    fn loads_fixture_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(FIXTURE.as_bytes()).expect("write fixture");

        let lookup = InMemoryLookup::load(file.path()).expect("load fixture");
        assert!(lookup.attribute_type_by_name("telephone number").is_some());
    }
}
