//! Translator configuration.
//!
//! Configuration is resolved once at process startup and then shared by every translator
//! through an `Arc<TranslatorConfig>`. Translators never read environment variables
//! themselves; the binary decides where the YAML file lives and hands the path in.

use crate::constants::{DEFAULT_ENCOUNTER_TYPE_SYSTEM, DEFAULT_VISIT_TYPE_SYSTEM};
use crate::{TranslationError, TranslationResult};
use bridge_types::NonEmptyText;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// A named concept source (terminology) and the FHIR system URL it is published under.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConceptSource {
    pub name: NonEmptyText,
    pub url: NonEmptyText,
}

impl ConceptSource {
    fn builtin(name: &str, url: &str) -> Self {
        Self {
            name: text(name),
            url: text(url),
        }
    }
}

/// Uuids of the concepts the platform uses to record allergy severity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityConcepts {
    pub mild: Option<Uuid>,
    pub moderate: Option<Uuid>,
    pub severe: Option<Uuid>,
    /// Read back from a criticality of `unable-to-assess`.
    pub other: Option<Uuid>,
}

/// Translator configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct TranslatorConfig {
    concept_sources: Vec<ConceptSource>,
    telecom_attribute_type: NonEmptyText,
    encounter_type_system: NonEmptyText,
    visit_type_system: NonEmptyText,
    default_encounter_class: NonEmptyText,
    provider_identifier_system: Option<NonEmptyText>,
    allergy_severity: SeverityConcepts,
    contain_provenance: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            concept_sources: default_concept_sources(),
            telecom_attribute_type: text("Telephone Number"),
            encounter_type_system: text(DEFAULT_ENCOUNTER_TYPE_SYSTEM),
            visit_type_system: text(DEFAULT_VISIT_TYPE_SYSTEM),
            default_encounter_class: text("AMB"),
            provider_identifier_system: None,
            allergy_severity: SeverityConcepts::default(),
            contain_provenance: true,
        }
    }
}

impl TranslatorConfig {
    /// Parse configuration from YAML text, layering it over the built-in defaults.
    ///
    /// Keys that are absent keep their default value. `concept_sources`, when present,
    /// replaces the default table entirely.
    ///
    /// # Errors
    ///
    /// Returns [`TranslationError::ConfigYaml`] for malformed YAML or unknown keys, and
    /// [`TranslationError::Config`] when the result fails validation.
    pub fn from_yaml_str(yaml_text: &str) -> TranslationResult<Self> {
        let file: ConfigFile =
            serde_yaml::from_str(yaml_text).map_err(TranslationError::ConfigYaml)?;

        let defaults = Self::default();
        let config = Self {
            concept_sources: file.concept_sources.unwrap_or(defaults.concept_sources),
            telecom_attribute_type: file
                .telecom_attribute_type
                .unwrap_or(defaults.telecom_attribute_type),
            encounter_type_system: file
                .encounter_type_system
                .unwrap_or(defaults.encounter_type_system),
            visit_type_system: file.visit_type_system.unwrap_or(defaults.visit_type_system),
            default_encounter_class: file
                .default_encounter_class
                .unwrap_or(defaults.default_encounter_class),
            provider_identifier_system: file.provider_identifier_system,
            allergy_severity: file.allergy_severity.unwrap_or_default(),
            contain_provenance: file
                .contain_provenance
                .unwrap_or(defaults.contain_provenance),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> TranslationResult<Self> {
        let text = std::fs::read_to_string(path).map_err(TranslationError::ConfigRead)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            sources = config.concept_sources.len(),
            "loaded translator configuration"
        );
        Ok(config)
    }

    /// Load from `path` if given, otherwise fall back to the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> TranslationResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::debug!("no configuration file given; using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject duplicate source names or system URLs.
    pub fn validate(&self) -> TranslationResult<()> {
        let mut names = HashSet::new();
        let mut urls = HashSet::new();

        for source in &self.concept_sources {
            if !names.insert(source.name.as_str().to_ascii_lowercase()) {
                return Err(TranslationError::Config(format!(
                    "duplicate concept source name '{}'",
                    source.name
                )));
            }
            if !urls.insert(source.url.as_str()) {
                return Err(TranslationError::Config(format!(
                    "duplicate concept source url '{}'",
                    source.url
                )));
            }
        }

        Ok(())
    }

    pub fn concept_sources(&self) -> &[ConceptSource] {
        &self.concept_sources
    }

    /// System URL configured for a concept source name. Names match case-insensitively.
    pub fn system_for_source(&self, source_name: &str) -> Option<&str> {
        self.concept_sources
            .iter()
            .find(|s| s.name.as_str().eq_ignore_ascii_case(source_name))
            .map(|s| s.url.as_str())
    }

    /// Concept source name published under `system`.
    pub fn source_for_system(&self, system: &str) -> Option<&str> {
        self.concept_sources
            .iter()
            .find(|s| s.url.as_str() == system)
            .map(|s| s.name.as_str())
    }

    pub fn telecom_attribute_type(&self) -> &str {
        self.telecom_attribute_type.as_str()
    }

    pub fn encounter_type_system(&self) -> &str {
        self.encounter_type_system.as_str()
    }

    pub fn visit_type_system(&self) -> &str {
        self.visit_type_system.as_str()
    }

    pub fn default_encounter_class(&self) -> &str {
        self.default_encounter_class.as_str()
    }

    pub fn provider_identifier_system(&self) -> Option<&str> {
        self.provider_identifier_system.as_ref().map(|s| s.as_str())
    }

    pub fn allergy_severity(&self) -> &SeverityConcepts {
        &self.allergy_severity
    }

    pub fn contain_provenance(&self) -> bool {
        self.contain_provenance
    }

    pub fn with_contain_provenance(mut self, contain: bool) -> Self {
        self.contain_provenance = contain;
        self
    }

    pub fn with_allergy_severity(mut self, severity: SeverityConcepts) -> Self {
        self.allergy_severity = severity;
        self
    }

    pub fn with_provider_identifier_system(mut self, system: NonEmptyText) -> Self {
        self.provider_identifier_system = Some(system);
        self
    }
}

/// On-disk YAML shape. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    concept_sources: Option<Vec<ConceptSource>>,
    telecom_attribute_type: Option<NonEmptyText>,
    encounter_type_system: Option<NonEmptyText>,
    visit_type_system: Option<NonEmptyText>,
    default_encounter_class: Option<NonEmptyText>,
    provider_identifier_system: Option<NonEmptyText>,
    allergy_severity: Option<SeverityConcepts>,
    contain_provenance: Option<bool>,
}

fn default_concept_sources() -> Vec<ConceptSource> {
    vec![
        ConceptSource::builtin("CIEL", "https://cielterminology.org"),
        ConceptSource::builtin("LOINC", "http://loinc.org"),
        ConceptSource::builtin("SNOMED CT", "http://snomed.info/sct"),
        ConceptSource::builtin("RxNORM", "http://www.nlm.nih.gov/research/umls/rxnorm"),
        ConceptSource::builtin("ICD-10-WHO", "http://hl7.org/fhir/sid/icd-10"),
    ]
}

/// Wraps a built-in literal that is known to be non-empty.
fn text(literal: &str) -> NonEmptyText {
    NonEmptyText::new(literal).unwrap_or_else(|_| unreachable!("built-in literal is non-empty"))
}
