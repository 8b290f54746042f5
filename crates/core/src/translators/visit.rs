//! Visits are published as FHIR `Encounter`s typed with the visit-type system.

use crate::config::TranslatorConfig;
use crate::constants::ACT_CODE_SYSTEM;
use crate::datetime::{format_date_time, parse_optional_date_time};
use crate::reference::{from_reference, to_reference, ReferenceKind};
use crate::translator::{meta_from_audit, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::encounter::{subject_or_existing, type_concept, type_from_concepts};
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::{Visit, VisitType};
use fhir::{Coding, EncounterLocation, Period};
use std::sync::Arc;

#[derive(Clone)]
pub struct VisitTranslator {
    config: Arc<TranslatorConfig>,
    provenance: ProvenanceTranslator,
}

impl VisitTranslator {
    pub fn new(config: Arc<TranslatorConfig>) -> Self {
        Self {
            provenance: ProvenanceTranslator::new(config.clone()),
            config,
        }
    }

    /// True when `resource` carries a visit-type coding.
    pub fn is_visit(&self, resource: &fhir::Encounter) -> bool {
        resource
            .type_
            .iter()
            .any(|t| t.code_in(self.config.visit_type_system()).is_some())
    }
}

impl ToFhirTranslator<Visit> for VisitTranslator {
    type Resource = fhir::Encounter;

    fn to_fhir_resource(&self, visit: &Visit) -> TranslationResult<fhir::Encounter> {
        tracing::debug!(uuid = %visit.uuid, open = visit.is_open(), "translating visit to FHIR");

        let visit_type = visit
            .visit_type
            .as_ref()
            .ok_or(TranslationError::MissingElement("Visit.visitType"))?;
        let status = match (visit.voided, visit.is_open()) {
            (true, _) => "entered-in-error",
            (false, true) => "in-progress",
            (false, false) => "finished",
        };
        let period = Period {
            start: visit.started.as_ref().map(format_date_time),
            end: visit.stopped.as_ref().map(format_date_time),
        };

        Ok(fhir::Encounter {
            id: Some(visit.uuid.to_string()),
            meta: meta_from_audit(&visit.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::Encounter,
                uuid: visit.uuid,
                audit: &visit.audit,
            })?,
            status: Some(status.to_string()),
            class: Some(Coding::new(ACT_CODE_SYSTEM, self.config.default_encounter_class())),
            type_: vec![type_concept(
                self.config.visit_type_system(),
                visit_type.uuid,
                &visit_type.name,
            )],
            subject: Some(to_reference(ReferenceKind::Patient, &visit.patient)),
            participant: Vec::new(),
            period: (!period.is_empty()).then_some(period),
            location: visit
                .location
                .iter()
                .map(|l| EncounterLocation {
                    location: to_reference(ReferenceKind::Location, l),
                })
                .collect(),
            part_of: None,
        })
    }
}

impl ToDomainTranslator<Visit> for VisitTranslator {
    type Resource = fhir::Encounter;

    fn update_domain_type(&self, existing: &mut Visit, resource: &fhir::Encounter) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Encounter.id", resource.id.as_deref(), existing.uuid)?;

        if let Some(status) = resource.status.as_deref() {
            existing.voided = status == "entered-in-error";
        }
        if let Some((uuid, name)) =
            type_from_concepts("Encounter.type", self.config.visit_type_system(), &resource.type_)?
        {
            existing.visit_type = Some(VisitType { uuid, name });
        }

        existing.patient =
            subject_or_existing("Encounter.subject", resource.subject.as_ref(), &existing.patient)?;

        if let Some(period) = &resource.period {
            existing.started = parse_optional_date_time("Encounter.period.start", period.start.as_deref())?;
            existing.stopped = parse_optional_date_time("Encounter.period.end", period.end.as_deref())?;
        }
        if let Some(first) = resource.location.first() {
            existing.location = Some(from_reference(ReferenceKind::Location, &first.location)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_VISIT_TYPE_SYSTEM;
    use bridge_domain::DomainRef;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn outpatient() -> Visit {
        Visit {
            uuid: Uuid::new_v4(),
            visit_type: Some(VisitType {
                uuid: Uuid::new_v4(),
                name: "Outpatient".into(),
            }),
            patient: DomainRef::new(Uuid::new_v4()),
            location: Some(DomainRef::new(Uuid::new_v4())),
            started: Some(Utc.with_ymd_and_hms(2024, 3, 20, 8, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    fn translator() -> VisitTranslator {
        VisitTranslator::new(Arc::new(TranslatorConfig::default()))
    }

    #[test]
    fn open_visit_is_in_progress() {
        let out = translator().to_fhir_resource(&outpatient()).expect("to fhir");
        assert_eq!(out.status.as_deref(), Some("in-progress"));
        assert!(out.type_[0].code_in(DEFAULT_VISIT_TYPE_SYSTEM).is_some());
        assert_eq!(out.period.as_ref().and_then(|p| p.end.clone()), None);
        assert!(translator().is_visit(&out));
    }

    #[test]
    fn stopped_visit_is_finished_with_period_end() {
        let mut visit = outpatient();
        visit.stopped = Some(Utc.with_ymd_and_hms(2024, 3, 20, 17, 0, 0).unwrap());
        let out = translator().to_fhir_resource(&visit).expect("to fhir");
        assert_eq!(out.status.as_deref(), Some("finished"));
        assert_eq!(
            out.period.and_then(|p| p.end).as_deref(),
            Some("2024-03-20T17:00:00Z")
        );
    }

    #[test]
    fn visit_type_is_required() {
        let visit = Visit {
            visit_type: None,
            ..outpatient()
        };
        let err = translator().to_fhir_resource(&visit).expect_err("no visit type");
        assert!(matches!(err, TranslationError::MissingElement("Visit.visitType")));
    }

    #[test]
    fn round_trip_is_lossless() {
        let mut visit = outpatient();
        visit.stopped = Some(Utc.with_ymd_and_hms(2024, 3, 21, 9, 0, 0).unwrap());
        let translator = translator();
        let fhir = translator.to_fhir_resource(&visit).expect("to fhir");
        let back: Visit = translator.to_domain_type(&fhir).expect("to domain");
        assert_eq!(back, visit);
    }
}
