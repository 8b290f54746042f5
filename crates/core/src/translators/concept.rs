//! Dictionary concepts as `CodeableConcept`s.
//!
//! The first coding always carries the concept uuid with no system, so that a resource
//! produced here resolves back to exactly the same concept. Mapped codes follow, SAME-AS
//! mappings first, for every source that has a configured system URL.

use crate::config::TranslatorConfig;
use crate::lookup::SharedLookup;
use crate::translator::{non_blank, ToDomainTranslator, ToFhirTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::Concept;
use fhir::{CodeableConcept, Coding};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ConceptTranslator {
    config: Arc<TranslatorConfig>,
    lookup: SharedLookup,
}

impl ConceptTranslator {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        Self { config, lookup }
    }

    /// Find the platform concept behind `codeable`, or `None` when nothing matches.
    pub fn resolve(&self, codeable: &CodeableConcept) -> Option<Concept> {
        let by_uuid = codeable
            .coding
            .iter()
            .filter(|coding| coding.system.is_none())
            .filter_map(|coding| coding.code.as_deref())
            .filter_map(|code| Uuid::parse_str(code.trim()).ok())
            .find_map(|uuid| self.lookup.concept_by_uuid(uuid));
        if by_uuid.is_some() {
            return by_uuid;
        }

        let by_mapping = codeable.coding.iter().find_map(|coding| {
            let system = coding.system.as_deref()?;
            let code = coding.code.as_deref()?;
            let source = self.config.source_for_system(system)?;
            self.lookup.concept_by_mapping(source, code)
        });
        if by_mapping.is_none() {
            tracing::warn!(
                codings = codeable.coding.len(),
                text = codeable.text.as_deref().unwrap_or_default(),
                "no concept matches codeable concept"
            );
        }
        by_mapping
    }

    /// Like [`resolve`](Self::resolve), but an unmatched concept is an `UnknownCode` for `field`.
    pub fn resolve_required(&self, field: &'static str, codeable: &CodeableConcept) -> TranslationResult<Concept> {
        self.resolve(codeable).ok_or_else(|| TranslationError::UnknownCode {
            field,
            code: codeable
                .coding
                .iter()
                .find_map(|c| c.code.clone())
                .or_else(|| codeable.text.clone())
                .unwrap_or_default(),
        })
    }

    /// A concept, with free text standing in for it when the value was not coded. Text next
    /// to a concept replaces the concept's display name.
    pub fn coded_or_text(
        &self,
        coded: Option<&Concept>,
        non_coded: Option<&str>,
    ) -> TranslationResult<Option<CodeableConcept>> {
        let text = non_blank(non_coded);
        match (coded, text) {
            (Some(coded), text) => {
                let mut codeable = self.to_fhir_resource(coded)?;
                if text.is_some() {
                    codeable.text = text;
                }
                Ok(Some(codeable))
            }
            (None, Some(text)) => Ok(Some(CodeableConcept::from_text(text))),
            (None, None) => Ok(None),
        }
    }

    /// Reverse of [`coded_or_text`](Self::coded_or_text). Text that differs from the concept's
    /// name is kept as the free-text value; codings with no match and no text are an error.
    pub fn resolve_coded_or_text(
        &self,
        field: &'static str,
        codeable: &CodeableConcept,
    ) -> TranslationResult<(Option<Concept>, Option<String>)> {
        let text = non_blank(codeable.text.as_deref());
        if codeable.coding.is_empty() {
            return Ok((None, text));
        }
        match self.resolve(codeable) {
            Some(coded) => {
                let free_text = text.filter(|t| coded.display_name.as_deref() != Some(t.as_str()));
                Ok((Some(coded), free_text))
            }
            None if text.is_some() => Ok((None, text)),
            None => self.resolve_required(field, codeable).map(|c| (Some(c), None)),
        }
    }

    /// The concept with `uuid`, or a bare concept carrying only the uuid when the lookup does
    /// not know it.
    pub fn by_uuid(&self, uuid: Uuid) -> Concept {
        self.lookup.concept_by_uuid(uuid).unwrap_or(Concept {
            uuid,
            ..Default::default()
        })
    }
}

impl ToFhirTranslator<Concept> for ConceptTranslator {
    type Resource = CodeableConcept;

    fn to_fhir_resource(&self, concept: &Concept) -> TranslationResult<CodeableConcept> {
        let mut coding = vec![Coding {
            code: Some(concept.uuid.to_string()),
            display: concept.display_name.clone(),
            ..Default::default()
        }];

        for mapping in concept.mappings_by_priority() {
            match self.config.system_for_source(mapping.source.as_str()) {
                Some(system) => coding.push(Coding::new(system, mapping.code.as_str())),
                None => tracing::warn!(
                    source = mapping.source.as_str(),
                    code = mapping.code.as_str(),
                    "concept source has no configured system; mapping dropped"
                ),
            }
        }

        Ok(CodeableConcept {
            coding,
            text: concept.display_name.clone(),
        })
    }
}

impl ToDomainTranslator<Option<Concept>> for ConceptTranslator {
    type Resource = CodeableConcept;

    fn update_domain_type(&self, existing: &mut Option<Concept>, codeable: &CodeableConcept) -> TranslationResult<()> {
        *existing = self.resolve(codeable);
        Ok(())
    }
}
