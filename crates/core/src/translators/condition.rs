use crate::config::TranslatorConfig;
use crate::constants::{CONDITION_CLINICAL_STATUS_SYSTEM, CONDITION_VERIFICATION_STATUS_SYSTEM};
use crate::datetime::{format_date_time, parse_optional_date_time};
use crate::lookup::SharedLookup;
use crate::reference::{to_reference, user_reference, ReferenceKind};
use crate::translator::{meta_from_audit, non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::concept::ConceptTranslator;
use crate::translators::encounter::subject_or_existing;
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::{CodedOrFreeText, Condition, ConditionClinicalStatus, ConditionVerificationStatus};
use fhir::{Annotation, CodeableConcept, Coding};
use std::sync::Arc;

const ENTERED_IN_ERROR: &str = "entered-in-error";

fn clinical_status_code(status: ConditionClinicalStatus) -> &'static str {
    match status {
        ConditionClinicalStatus::Active => "active",
        ConditionClinicalStatus::Inactive => "inactive",
        ConditionClinicalStatus::HistoryOf => "resolved",
    }
}

fn clinical_status(code: &str) -> Option<ConditionClinicalStatus> {
    match code {
        "active" | "recurrence" | "relapse" => Some(ConditionClinicalStatus::Active),
        "inactive" | "remission" => Some(ConditionClinicalStatus::Inactive),
        "resolved" => Some(ConditionClinicalStatus::HistoryOf),
        _ => None,
    }
}

fn verification_status_code(status: ConditionVerificationStatus) -> &'static str {
    match status {
        ConditionVerificationStatus::Provisional => "provisional",
        ConditionVerificationStatus::Confirmed => "confirmed",
    }
}

/// Problem-list `Condition`.
#[derive(Clone)]
pub struct ConditionTranslator {
    concept: ConceptTranslator,
    provenance: ProvenanceTranslator,
}

impl ConditionTranslator {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        Self {
            concept: ConceptTranslator::new(config.clone(), lookup),
            provenance: ProvenanceTranslator::new(config),
        }
    }
}

impl ToFhirTranslator<Condition> for ConditionTranslator {
    type Resource = fhir::Condition;

    fn to_fhir_resource(&self, condition: &Condition) -> TranslationResult<fhir::Condition> {
        tracing::debug!(uuid = %condition.uuid, "translating condition to FHIR");

        let verification = if condition.voided {
            Some(ENTERED_IN_ERROR)
        } else {
            condition.verification_status.map(verification_status_code)
        };

        Ok(fhir::Condition {
            id: Some(condition.uuid.to_string()),
            meta: meta_from_audit(&condition.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::Condition,
                uuid: condition.uuid,
                audit: &condition.audit,
            })?,
            clinical_status: Some(CodeableConcept::from_coding(Coding::new(
                CONDITION_CLINICAL_STATUS_SYSTEM,
                clinical_status_code(condition.clinical_status),
            ))),
            verification_status: verification.map(|code| {
                CodeableConcept::from_coding(Coding::new(CONDITION_VERIFICATION_STATUS_SYSTEM, code))
            }),
            code: self.concept.coded_or_text(
                condition.condition.coded.as_ref(),
                condition.condition.non_coded.as_deref(),
            )?,
            subject: Some(to_reference(ReferenceKind::Patient, &condition.patient)),
            onset_date_time: condition.onset_date.as_ref().map(format_date_time),
            abatement_date_time: condition.end_date.as_ref().map(format_date_time),
            recorded_date: condition.audit.date_created.as_ref().map(format_date_time),
            recorder: condition.audit.creator.as_ref().map(user_reference),
            note: non_blank(condition.additional_detail.as_deref())
                .map(|text| Annotation {
                    text,
                    ..Default::default()
                })
                .into_iter()
                .collect(),
        })
    }
}

impl ToDomainTranslator<Condition> for ConditionTranslator {
    type Resource = fhir::Condition;

    fn update_domain_type(&self, existing: &mut Condition, resource: &fhir::Condition) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Condition.id", resource.id.as_deref(), existing.uuid)?;

        if let Some(code) = resource
            .clinical_status
            .as_ref()
            .and_then(|s| s.code_in(CONDITION_CLINICAL_STATUS_SYSTEM))
        {
            existing.clinical_status =
                clinical_status(code).ok_or_else(|| TranslationError::UnknownCode {
                    field: "Condition.clinicalStatus",
                    code: code.to_string(),
                })?;
        }

        match resource
            .verification_status
            .as_ref()
            .and_then(|s| s.code_in(CONDITION_VERIFICATION_STATUS_SYSTEM))
        {
            Some(ENTERED_IN_ERROR) => existing.voided = true,
            Some("confirmed") => {
                existing.verification_status = Some(ConditionVerificationStatus::Confirmed);
                existing.voided = false;
            }
            Some("provisional" | "differential" | "unconfirmed") => {
                existing.verification_status = Some(ConditionVerificationStatus::Provisional);
                existing.voided = false;
            }
            Some(other) => tracing::warn!(code = other, "unrecognised condition verification status"),
            None => {}
        }

        match &resource.code {
            Some(code) => {
                let (coded, non_coded) = self.concept.resolve_coded_or_text("Condition.code", code)?;
                existing.condition = CodedOrFreeText { coded, non_coded };
            }
            None if existing.condition.is_empty() => {
                return Err(TranslationError::MissingElement("Condition.code"))
            }
            None => {}
        }

        existing.patient =
            subject_or_existing("Condition.subject", resource.subject.as_ref(), &existing.patient)?;

        if resource.onset_date_time.is_some() {
            existing.onset_date =
                parse_optional_date_time("Condition.onsetDateTime", resource.onset_date_time.as_deref())?;
        }
        if resource.abatement_date_time.is_some() {
            existing.end_date = parse_optional_date_time(
                "Condition.abatementDateTime",
                resource.abatement_date_time.as_deref(),
            )?;
        }
        if let Some(note) = resource.note.first() {
            existing.additional_detail = non_blank(Some(note.text.as_str()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryLookup;
    use bridge_domain::{Concept, DomainRef};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn malaria() -> Concept {
        Concept::new(
            Uuid::parse_str("116128aa-aaaa-4aaa-aaaa-aaaaaaaaaaaa").unwrap(),
            "Malaria",
        )
    }

    fn translator() -> ConditionTranslator {
        ConditionTranslator::new(
            Arc::new(TranslatorConfig::default()),
            InMemoryLookup::new().with_concept(malaria()).into_shared(),
        )
    }

    fn condition() -> Condition {
        Condition {
            uuid: Uuid::new_v4(),
            patient: DomainRef::new(Uuid::new_v4()),
            condition: CodedOrFreeText {
                coded: Some(malaria()),
                non_coded: None,
            },
            clinical_status: ConditionClinicalStatus::Active,
            verification_status: Some(ConditionVerificationStatus::Confirmed),
            onset_date: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            additional_detail: Some("Confirmed by RDT".into()),
            ..Default::default()
        }
    }

    #[test]
    fn translates_condition() {
        let out = translator().to_fhir_resource(&condition()).expect("to fhir");

        assert!(out
            .clinical_status
            .as_ref()
            .expect("clinical status")
            .has_coding(CONDITION_CLINICAL_STATUS_SYSTEM, "active"));
        assert!(out
            .verification_status
            .as_ref()
            .expect("verification status")
            .has_coding(CONDITION_VERIFICATION_STATUS_SYSTEM, "confirmed"));
        assert_eq!(out.onset_date_time.as_deref(), Some("2024-02-01T00:00:00Z"));
        assert_eq!(out.note[0].text, "Confirmed by RDT");
        assert_eq!(out.code.and_then(|c| c.text).as_deref(), Some("Malaria"));
    }

    #[test]
    fn history_of_is_resolved() {
        let mut condition = condition();
        condition.clinical_status = ConditionClinicalStatus::HistoryOf;
        condition.end_date = Some(Utc.with_ymd_and_hms(2024, 2, 20, 0, 0, 0).unwrap());
        let out = translator().to_fhir_resource(&condition).expect("to fhir");
        assert!(out
            .clinical_status
            .expect("clinical status")
            .has_coding(CONDITION_CLINICAL_STATUS_SYSTEM, "resolved"));
        assert_eq!(out.abatement_date_time.as_deref(), Some("2024-02-20T00:00:00Z"));
    }

    #[test]
    fn free_text_condition_has_no_coding() {
        let mut condition = condition();
        condition.condition = CodedOrFreeText {
            coded: None,
            non_coded: Some("Chronic back pain".into()),
        };
        let translator = translator();
        let out = translator.to_fhir_resource(&condition).expect("to fhir");
        let code = out.code.as_ref().expect("code");
        assert!(code.coding.is_empty());
        assert_eq!(code.text.as_deref(), Some("Chronic back pain"));

        let back: Condition = translator.to_domain_type(&out).expect("to domain");
        assert_eq!(back.condition, condition.condition);
    }

    #[test]
    fn voided_condition_is_entered_in_error() {
        let mut condition = condition();
        condition.voided = true;
        let out = translator().to_fhir_resource(&condition).expect("to fhir");
        assert!(out
            .verification_status
            .expect("verification status")
            .has_coding(CONDITION_VERIFICATION_STATUS_SYSTEM, ENTERED_IN_ERROR));
    }

    #[test]
    fn round_trip_is_lossless() {
        let condition = condition();
        let translator = translator();
        let fhir = translator.to_fhir_resource(&condition).expect("to fhir");
        let back: Condition = translator.to_domain_type(&fhir).expect("to domain");
        assert_eq!(back, condition);
    }

    #[test]
    fn unknown_clinical_status_is_rejected() {
        let mut fhir = translator().to_fhir_resource(&condition()).expect("to fhir");
        fhir.clinical_status = Some(CodeableConcept::from_coding(Coding::new(
            CONDITION_CLINICAL_STATUS_SYSTEM,
            "dormant",
        )));
        let err = translator().to_domain_type(&fhir).expect_err("bad status");
        assert!(matches!(
            err,
            TranslationError::UnknownCode { field: "Condition.clinicalStatus", .. }
        ));
    }
}
