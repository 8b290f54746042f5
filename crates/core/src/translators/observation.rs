//! Observations.
//!
//! `value[x]` follows the domain value variant. Reference ranges come from the concept's
//! numeric limits and are only emitted, never read back: they belong to the concept, not to
//! the observation.

use crate::config::TranslatorConfig;
use crate::constants::{
    OBSERVATION_CATEGORY_SYSTEM, OBSERVATION_INTERPRETATION_SYSTEM, REFERENCE_RANGE_MEANING_SYSTEM,
    REFERENCE_RANGE_TYPE_SYSTEM, UCUM_SYSTEM,
};
use crate::datetime::{format_date_time, parse_date_time, parse_optional_date_time};
use crate::lookup::SharedLookup;
use crate::reference::{from_reference, from_reference_opt, to_reference, ReferenceKind};
use crate::translator::{meta_from_audit, non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::concept::ConceptTranslator;
use crate::translators::encounter::subject_or_existing;
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::{ConceptNumeric, DomainRef, Obs, ObsInterpretation, ObsStatus, ObsValue};
use fhir::{Annotation, CodeableConcept, Coding, ObservationReferenceRange, Quantity};
use std::sync::Arc;

const STATUS_ENTERED_IN_ERROR: &str = "entered-in-error";

const INTERPRETATIONS: &[(ObsInterpretation, &str, &str)] = &[
    (ObsInterpretation::Normal, "N", "Normal"),
    (ObsInterpretation::Abnormal, "A", "Abnormal"),
    (ObsInterpretation::CriticallyAbnormal, "AA", "Critical abnormal"),
    (ObsInterpretation::High, "H", "High"),
    (ObsInterpretation::CriticallyHigh, "HH", "Critical high"),
    (ObsInterpretation::Low, "L", "Low"),
    (ObsInterpretation::CriticallyLow, "LL", "Critical low"),
    (ObsInterpretation::OffScaleHigh, ">", "Off scale high"),
    (ObsInterpretation::OffScaleLow, "<", "Off scale low"),
    (ObsInterpretation::SignificantChangeDown, "D", "Significant change down"),
    (ObsInterpretation::SignificantChangeUp, "U", "Significant change up"),
    (ObsInterpretation::Susceptible, "S", "Susceptible"),
    (ObsInterpretation::Resistant, "R", "Resistant"),
    (ObsInterpretation::Intermediate, "I", "Intermediate"),
    (ObsInterpretation::Positive, "POS", "Positive"),
    (ObsInterpretation::Negative, "NEG", "Negative"),
];

fn status_to_wire(status: ObsStatus) -> &'static str {
    match status {
        ObsStatus::Preliminary => "preliminary",
        ObsStatus::Final => "final",
        ObsStatus::Amended => "amended",
    }
}

fn status_from_wire(code: &str) -> Option<ObsStatus> {
    match code {
        "preliminary" => Some(ObsStatus::Preliminary),
        "final" => Some(ObsStatus::Final),
        "amended" | "corrected" => Some(ObsStatus::Amended),
        _ => None,
    }
}

/// Observation category for a concept class. Unlisted classes have no category.
fn category_for_class(concept_class: &str) -> Option<(&'static str, &'static str)> {
    match concept_class.trim() {
        "Test" | "LabSet" => Some(("laboratory", "Laboratory")),
        "Finding" => Some(("exam", "Exam")),
        "Procedure" => Some(("procedure", "Procedure")),
        _ => None,
    }
}

fn reference_ranges(numeric: &ConceptNumeric) -> Vec<ObservationReferenceRange> {
    let units = numeric.units.as_deref();
    let quantity = |value: Option<f64>| {
        value.map(|v| Quantity {
            value: Some(v),
            unit: units.map(str::to_string),
            system: units.map(|_| UCUM_SYSTEM.to_string()),
            code: units.map(str::to_string),
        })
    };

    [
        (numeric.low_normal, numeric.hi_normal, REFERENCE_RANGE_MEANING_SYSTEM, "normal", "Normal Range"),
        (numeric.low_critical, numeric.hi_critical, REFERENCE_RANGE_MEANING_SYSTEM, "treatment", "Treatment Range"),
        (numeric.low_absolute, numeric.hi_absolute, REFERENCE_RANGE_TYPE_SYSTEM, "absolute", "Absolute Range"),
    ]
    .into_iter()
    .filter(|(low, high, ..)| low.is_some() || high.is_some())
    .map(|(low, high, system, code, display)| ObservationReferenceRange {
        low: quantity(low),
        high: quantity(high),
        type_: Some(CodeableConcept::from_coding(
            Coding::new(system, code).with_display(display),
        )),
        text: None,
    })
    .collect()
}

#[derive(Clone)]
pub struct ObservationTranslator {
    concept: ConceptTranslator,
    provenance: ProvenanceTranslator,
}

impl ObservationTranslator {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        Self {
            concept: ConceptTranslator::new(config.clone(), lookup),
            provenance: ProvenanceTranslator::new(config),
        }
    }

    fn value_from_resource(&self, resource: &fhir::Observation) -> TranslationResult<Option<ObsValue>> {
        if resource.value_count() > 1 {
            return Err(TranslationError::InvalidInput(
                "Observation carries more than one value[x]".into(),
            ));
        }

        if let Some(quantity) = &resource.value_quantity {
            let value = quantity
                .value
                .ok_or(TranslationError::MissingElement("Observation.valueQuantity.value"))?;
            return Ok(Some(ObsValue::Numeric(value)));
        }
        if let Some(codeable) = &resource.value_codeable_concept {
            let concept = self.concept.resolve_required("Observation.valueCodeableConcept", codeable)?;
            return Ok(Some(ObsValue::Coded(concept)));
        }
        if let Some(text) = &resource.value_string {
            return Ok(Some(ObsValue::Text(text.clone())));
        }
        if let Some(flag) = resource.value_boolean {
            return Ok(Some(ObsValue::Boolean(flag)));
        }
        if let Some(value) = &resource.value_date_time {
            return Ok(Some(ObsValue::Datetime(parse_date_time(
                "Observation.valueDateTime",
                value,
            )?)));
        }
        Ok(None)
    }
}

impl ToFhirTranslator<Obs> for ObservationTranslator {
    type Resource = fhir::Observation;

    fn to_fhir_resource(&self, obs: &Obs) -> TranslationResult<fhir::Observation> {
        tracing::debug!(uuid = %obs.uuid, group = obs.is_group(), "translating obs to FHIR");

        let status = if obs.voided {
            STATUS_ENTERED_IN_ERROR
        } else {
            status_to_wire(obs.status)
        };

        let category = obs
            .concept
            .concept_class
            .as_deref()
            .and_then(category_for_class)
            .map(|(code, display)| {
                CodeableConcept::from_coding(
                    Coding::new(OBSERVATION_CATEGORY_SYSTEM, code).with_display(display),
                )
            })
            .into_iter()
            .collect();

        let mut resource = fhir::Observation {
            id: Some(obs.uuid.to_string()),
            meta: meta_from_audit(&obs.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::Observation,
                uuid: obs.uuid,
                audit: &obs.audit,
            })?,
            status: Some(status.to_string()),
            category,
            code: Some(self.concept.to_fhir_resource(&obs.concept)?),
            subject: Some(to_reference(ReferenceKind::Patient, &obs.person)),
            encounter: obs
                .encounter
                .as_ref()
                .map(|e| to_reference(ReferenceKind::Encounter, e)),
            effective_date_time: obs.obs_datetime.as_ref().map(format_date_time),
            issued: obs.audit.date_created.as_ref().map(format_date_time),
            interpretation: obs
                .interpretation
                .and_then(|wanted| INTERPRETATIONS.iter().find(|(i, ..)| *i == wanted))
                .map(|(_, code, display)| {
                    CodeableConcept::from_coding(
                        Coding::new(OBSERVATION_INTERPRETATION_SYSTEM, *code).with_display(*display),
                    )
                })
                .into_iter()
                .collect(),
            note: non_blank(obs.comment.as_deref())
                .map(|text| Annotation {
                    text,
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            reference_range: obs
                .concept
                .numeric
                .as_ref()
                .map(reference_ranges)
                .unwrap_or_default(),
            has_member: obs
                .group_members
                .iter()
                .map(|m| to_reference(ReferenceKind::Observation, m))
                .collect(),
            ..Default::default()
        };

        match &obs.value {
            Some(ObsValue::Numeric(value)) => {
                let units = obs.concept.numeric.as_ref().and_then(|n| n.units.clone());
                resource.value_quantity = Some(Quantity {
                    value: Some(*value),
                    system: units.as_ref().map(|_| UCUM_SYSTEM.to_string()),
                    code: units.clone(),
                    unit: units,
                });
            }
            Some(ObsValue::Text(text)) => resource.value_string = Some(text.clone()),
            Some(ObsValue::Coded(concept)) => {
                resource.value_codeable_concept = Some(self.concept.to_fhir_resource(concept)?)
            }
            Some(ObsValue::Boolean(flag)) => resource.value_boolean = Some(*flag),
            Some(ObsValue::Datetime(value)) => {
                resource.value_date_time = Some(format_date_time(value))
            }
            None => {}
        }

        Ok(resource)
    }
}

impl ToDomainTranslator<Obs> for ObservationTranslator {
    type Resource = fhir::Observation;

    fn update_domain_type(&self, existing: &mut Obs, resource: &fhir::Observation) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Observation.id", resource.id.as_deref(), existing.uuid)?;

        match resource.status.as_deref() {
            Some(STATUS_ENTERED_IN_ERROR) => existing.voided = true,
            Some(code) => {
                existing.status = status_from_wire(code).ok_or_else(|| TranslationError::UnknownCode {
                    field: "Observation.status",
                    code: code.to_string(),
                })?;
                existing.voided = false;
            }
            None => {}
        }

        match &resource.code {
            Some(code) => existing.concept = self.concept.resolve_required("Observation.code", code)?,
            None if existing.concept.uuid.is_nil() => {
                return Err(TranslationError::MissingElement("Observation.code"))
            }
            None => {}
        }

        existing.person =
            subject_or_existing("Observation.subject", resource.subject.as_ref(), &existing.person)?;
        if resource.encounter.is_some() {
            existing.encounter = from_reference_opt(ReferenceKind::Encounter, resource.encounter.as_ref())?;
        }
        if resource.effective_date_time.is_some() {
            existing.obs_datetime = parse_optional_date_time(
                "Observation.effectiveDateTime",
                resource.effective_date_time.as_deref(),
            )?;
        }

        if let Some(value) = self.value_from_resource(resource)? {
            existing.value = Some(value);
        }

        if let Some(interpretation) = resource.interpretation.first() {
            let code = interpretation.code_in(OBSERVATION_INTERPRETATION_SYSTEM);
            existing.interpretation = code.and_then(|code| {
                INTERPRETATIONS
                    .iter()
                    .find(|(_, c, _)| *c == code)
                    .map(|(i, ..)| *i)
            });
            if existing.interpretation.is_none() {
                tracing::warn!(code = code.unwrap_or_default(), "unrecognised interpretation dropped");
            }
        }

        if !resource.has_member.is_empty() {
            existing.group_members = resource
                .has_member
                .iter()
                .map(|m| from_reference(ReferenceKind::Observation, m))
                .collect::<TranslationResult<Vec<DomainRef>>>()?;
        }
        if let Some(note) = resource.note.first() {
            existing.comment = non_blank(Some(note.text.as_str()));
        }
        Ok(())
    }
}
