use crate::config::TranslatorConfig;
use crate::constants::ACT_CODE_SYSTEM;
use crate::datetime::{format_date_time, parse_optional_date_time};
use crate::reference::{from_reference, from_reference_opt, to_reference, ReferenceKind};
use crate::translator::{meta_from_audit, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::{DomainRef, Encounter, EncounterProvider, EncounterType};
use fhir::{CodeableConcept, Coding, EncounterLocation, EncounterParticipant, Period};
use std::sync::Arc;
use uuid::Uuid;

const STATUS_ENTERED_IN_ERROR: &str = "entered-in-error";

/// `Encounter` <-> FHIR `Encounter`.
#[derive(Clone)]
pub struct EncounterTranslator {
    config: Arc<TranslatorConfig>,
    provenance: ProvenanceTranslator,
}

impl EncounterTranslator {
    pub fn new(config: Arc<TranslatorConfig>) -> Self {
        Self {
            provenance: ProvenanceTranslator::new(config.clone()),
            config,
        }
    }
}

/// A coded type (`uuid` as code, name as display) under `system`.
pub(crate) fn type_concept(system: &str, uuid: Uuid, name: &str) -> CodeableConcept {
    CodeableConcept {
        coding: vec![Coding::new(system, uuid.to_string()).with_display(name)],
        text: Some(name.to_string()),
    }
}

/// The `(uuid, name)` of the first coding under `system` among `types`.
pub(crate) fn type_from_concepts(
    field: &'static str,
    system: &str,
    types: &[CodeableConcept],
) -> TranslationResult<Option<(Uuid, String)>> {
    for concept in types {
        let Some(coding) = concept.coding.iter().find(|c| c.system.as_deref() == Some(system)) else {
            continue;
        };
        let code = coding.code.as_deref().unwrap_or_default();
        let uuid = Uuid::parse_str(code.trim()).map_err(|_| TranslationError::InvalidUuid {
            field,
            value: code.to_string(),
        })?;
        let name = coding
            .display
            .clone()
            .or_else(|| concept.text.clone())
            .unwrap_or_default();
        return Ok(Some((uuid, name)));
    }
    Ok(None)
}

/// The patient a resource is about. Required unless `existing` already names one.
pub(crate) fn subject_or_existing(
    field: &'static str,
    subject: Option<&fhir::Reference>,
    existing: &DomainRef,
) -> TranslationResult<DomainRef> {
    match subject {
        Some(subject) => from_reference(ReferenceKind::Patient, subject),
        None if existing.uuid.is_nil() => Err(TranslationError::MissingElement(field)),
        None => Ok(existing.clone()),
    }
}

impl ToFhirTranslator<Encounter> for EncounterTranslator {
    type Resource = fhir::Encounter;

    fn to_fhir_resource(&self, encounter: &Encounter) -> TranslationResult<fhir::Encounter> {
        tracing::debug!(uuid = %encounter.uuid, "translating encounter to FHIR");

        let status = if encounter.voided {
            STATUS_ENTERED_IN_ERROR
        } else {
            "unknown"
        };

        let participant = encounter
            .providers
            .iter()
            .map(|p| EncounterParticipant {
                type_: p
                    .role
                    .as_deref()
                    .map(CodeableConcept::from_text)
                    .into_iter()
                    .collect(),
                individual: Some(to_reference(ReferenceKind::Practitioner, &p.provider)),
            })
            .collect();

        let period = Period {
            start: encounter.encounter_datetime.as_ref().map(format_date_time),
            end: None,
        };

        Ok(fhir::Encounter {
            id: Some(encounter.uuid.to_string()),
            meta: meta_from_audit(&encounter.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::Encounter,
                uuid: encounter.uuid,
                audit: &encounter.audit,
            })?,
            status: Some(status.to_string()),
            class: Some(Coding::new(ACT_CODE_SYSTEM, self.config.default_encounter_class())),
            type_: encounter
                .encounter_type
                .iter()
                .map(|t| type_concept(self.config.encounter_type_system(), t.uuid, &t.name))
                .collect(),
            subject: Some(to_reference(ReferenceKind::Patient, &encounter.patient)),
            participant,
            period: (!period.is_empty()).then_some(period),
            location: encounter
                .location
                .iter()
                .map(|l| EncounterLocation {
                    location: to_reference(ReferenceKind::Location, l),
                })
                .collect(),
            part_of: encounter
                .visit
                .as_ref()
                .map(|v| to_reference(ReferenceKind::Encounter, v)),
        })
    }
}

impl ToDomainTranslator<Encounter> for EncounterTranslator {
    type Resource = fhir::Encounter;

    fn update_domain_type(&self, existing: &mut Encounter, resource: &fhir::Encounter) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Encounter.id", resource.id.as_deref(), existing.uuid)?;

        if let Some(status) = resource.status.as_deref() {
            existing.voided = status == STATUS_ENTERED_IN_ERROR;
        }

        if let Some((uuid, name)) = type_from_concepts(
            "Encounter.type",
            self.config.encounter_type_system(),
            &resource.type_,
        )? {
            existing.encounter_type = Some(EncounterType { uuid, name });
        }

        existing.patient =
            subject_or_existing("Encounter.subject", resource.subject.as_ref(), &existing.patient)?;

        if !resource.participant.is_empty() {
            existing.providers = resource
                .participant
                .iter()
                .filter_map(|p| p.individual.as_ref().map(|individual| (p, individual)))
                .map(|(p, individual)| {
                    Ok(EncounterProvider {
                        provider: from_reference(ReferenceKind::Practitioner, individual)?,
                        role: p.type_.iter().find_map(|t| t.text.clone()),
                    })
                })
                .collect::<TranslationResult<Vec<_>>>()?;
        }

        if let Some(period) = &resource.period {
            existing.encounter_datetime =
                parse_optional_date_time("Encounter.period.start", period.start.as_deref())?;
        }

        if let Some(first) = resource.location.first() {
            existing.location = Some(from_reference(ReferenceKind::Location, &first.location)?);
        }
        if resource.part_of.is_some() {
            existing.visit = from_reference_opt(ReferenceKind::Encounter, resource.part_of.as_ref())?;
        }
        Ok(())
    }
}
