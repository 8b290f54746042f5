//! Allergies as `AllergyIntolerance`.
//!
//! Severity lives on the allergy in the domain model but on each reaction in FHIR. It is
//! written to every reaction and to `criticality`, and read back from the first reaction
//! that carries one, otherwise from `criticality` (`high` is severe, `unable-to-assess` is
//! the configured `other` concept).

use crate::config::{SeverityConcepts, TranslatorConfig};
use crate::constants::{ALLERGY_CLINICAL_STATUS_SYSTEM, ALLERGY_VERIFICATION_STATUS_SYSTEM};
use crate::datetime::format_date_time;
use crate::lookup::SharedLookup;
use crate::reference::{to_reference, user_reference, ReferenceKind};
use crate::translator::{meta_from_audit, merge_by_uuid, non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::concept::ConceptTranslator;
use crate::translators::encounter::subject_or_existing;
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::{Allergen, AllergenType, Allergy, AllergyReaction};
use fhir::{AllergyIntoleranceReaction, Annotation, CodeableConcept, Coding};
use std::sync::Arc;
use uuid::Uuid;

fn category(allergen_type: AllergenType) -> Option<&'static str> {
    match allergen_type {
        AllergenType::Drug => Some("medication"),
        AllergenType::Food => Some("food"),
        AllergenType::Environment => Some("environment"),
        AllergenType::Other => None,
    }
}

fn allergen_type(category: &str) -> AllergenType {
    match category {
        "medication" => AllergenType::Drug,
        "food" => AllergenType::Food,
        "environment" => AllergenType::Environment,
        _ => AllergenType::Other,
    }
}

/// `mild` | `moderate` | `severe` for a severity concept, by configured uuid.
fn severity_code(severity: &SeverityConcepts, uuid: Uuid) -> Option<&'static str> {
    [
        (severity.mild, "mild"),
        (severity.moderate, "moderate"),
        (severity.severe, "severe"),
    ]
    .into_iter()
    .find(|(configured, _)| *configured == Some(uuid))
    .map(|(_, code)| code)
}

fn severity_uuid(severity: &SeverityConcepts, code: &str) -> Option<Uuid> {
    match code {
        "mild" => severity.mild,
        "moderate" => severity.moderate,
        "severe" => severity.severe,
        _ => None,
    }
}

fn criticality(severity: Option<&'static str>) -> &'static str {
    match severity {
        Some("severe") => "high",
        Some("mild" | "moderate") => "low",
        _ => "unable-to-assess",
    }
}

/// One reaction. Severity is filled in by [`AllergyTranslator`].
#[derive(Clone)]
struct ReactionTranslator {
    concept: ConceptTranslator,
}

impl ToFhirTranslator<AllergyReaction> for ReactionTranslator {
    type Resource = AllergyIntoleranceReaction;

    fn to_fhir_resource(&self, reaction: &AllergyReaction) -> TranslationResult<AllergyIntoleranceReaction> {
        let coded = (!reaction.reaction.uuid.is_nil()).then_some(&reaction.reaction);
        Ok(AllergyIntoleranceReaction {
            id: Some(reaction.uuid.to_string()),
            substance: None,
            manifestation: self
                .concept
                .coded_or_text(coded, reaction.reaction_non_coded.as_deref())?
                .into_iter()
                .collect(),
            severity: None,
        })
    }
}

impl ToDomainTranslator<AllergyReaction> for ReactionTranslator {
    type Resource = AllergyIntoleranceReaction;

    fn update_domain_type(
        &self,
        existing: &mut AllergyReaction,
        reaction: &AllergyIntoleranceReaction,
    ) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("AllergyIntolerance.reaction.id", reaction.id.as_deref(), existing.uuid)?;
        let Some(manifestation) = reaction.manifestation.first() else {
            return Err(TranslationError::MissingElement(
                "AllergyIntolerance.reaction.manifestation",
            ));
        };
        let (coded, non_coded) = self
            .concept
            .resolve_coded_or_text("AllergyIntolerance.reaction.manifestation", manifestation)?;
        existing.reaction = coded.unwrap_or_default();
        existing.reaction_non_coded = non_coded;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AllergyTranslator {
    config: Arc<TranslatorConfig>,
    concept: ConceptTranslator,
    reaction: ReactionTranslator,
    provenance: ProvenanceTranslator,
}

impl AllergyTranslator {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        let concept = ConceptTranslator::new(config.clone(), lookup);
        Self {
            reaction: ReactionTranslator {
                concept: concept.clone(),
            },
            provenance: ProvenanceTranslator::new(config.clone()),
            concept,
            config,
        }
    }

    fn status(system: &str, code: &str) -> CodeableConcept {
        CodeableConcept::from_coding(Coding::new(system, code))
    }
}

impl ToFhirTranslator<Allergy> for AllergyTranslator {
    type Resource = fhir::AllergyIntolerance;

    fn to_fhir_resource(&self, allergy: &Allergy) -> TranslationResult<fhir::AllergyIntolerance> {
        tracing::debug!(uuid = %allergy.uuid, "translating allergy to FHIR");

        let severity = allergy
            .severity
            .as_ref()
            .and_then(|s| severity_code(self.config.allergy_severity(), s.uuid));

        let mut reaction = allergy
            .reactions
            .iter()
            .map(|r| self.reaction.to_fhir_resource(r))
            .collect::<TranslationResult<Vec<_>>>()?;
        for r in &mut reaction {
            r.severity = severity.map(str::to_string);
        }

        Ok(fhir::AllergyIntolerance {
            id: Some(allergy.uuid.to_string()),
            meta: meta_from_audit(&allergy.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::AllergyIntolerance,
                uuid: allergy.uuid,
                audit: &allergy.audit,
            })?,
            clinical_status: Some(Self::status(
                ALLERGY_CLINICAL_STATUS_SYSTEM,
                if allergy.voided { "inactive" } else { "active" },
            )),
            verification_status: Some(Self::status(ALLERGY_VERIFICATION_STATUS_SYSTEM, "confirmed")),
            type_: Some("allergy".to_string()),
            category: category(allergy.allergen.allergen_type)
                .map(str::to_string)
                .into_iter()
                .collect(),
            criticality: allergy
                .severity
                .as_ref()
                .map(|_| criticality(severity).to_string()),
            code: self.concept.coded_or_text(
                allergy.allergen.coded_allergen.as_ref(),
                allergy.allergen.non_coded_allergen.as_deref(),
            )?,
            patient: Some(to_reference(ReferenceKind::Patient, &allergy.patient)),
            recorded_date: allergy.audit.date_created.as_ref().map(format_date_time),
            recorder: allergy.audit.creator.as_ref().map(user_reference),
            note: non_blank(allergy.comment.as_deref())
                .map(|text| Annotation {
                    text,
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            reaction,
        })
    }
}

impl ToDomainTranslator<Allergy> for AllergyTranslator {
    type Resource = fhir::AllergyIntolerance;

    fn update_domain_type(
        &self,
        existing: &mut Allergy,
        resource: &fhir::AllergyIntolerance,
    ) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("AllergyIntolerance.id", resource.id.as_deref(), existing.uuid)?;

        if let Some(status) = resource
            .clinical_status
            .as_ref()
            .and_then(|s| s.code_in(ALLERGY_CLINICAL_STATUS_SYSTEM))
        {
            existing.voided = status != "active";
        }

        existing.patient = subject_or_existing(
            "AllergyIntolerance.patient",
            resource.patient.as_ref(),
            &existing.patient,
        )?;

        if let Some(first) = resource.category.first() {
            existing.allergen.allergen_type = allergen_type(first);
        }
        match &resource.code {
            Some(code) => {
                let (coded, non_coded) =
                    self.concept.resolve_coded_or_text("AllergyIntolerance.code", code)?;
                existing.allergen = Allergen {
                    allergen_type: existing.allergen.allergen_type,
                    coded_allergen: coded,
                    non_coded_allergen: non_coded,
                };
            }
            None if existing.allergen.coded_allergen.is_none()
                && existing.allergen.non_coded_allergen.is_none() =>
            {
                return Err(TranslationError::MissingElement("AllergyIntolerance.code"))
            }
            None => {}
        }

        let severity = self.config.allergy_severity();
        let from_reaction = resource
            .reaction
            .iter()
            .find_map(|r| r.severity.as_deref())
            .and_then(|code| severity_uuid(severity, code));
        let from_criticality = match resource.criticality.as_deref() {
            Some("high") => severity.severe,
            Some("unable-to-assess") => severity.other,
            _ => None,
        };
        if let Some(uuid) = from_reaction.or(from_criticality) {
            existing.severity = Some(self.concept.by_uuid(uuid));
        }

        merge_by_uuid(
            &self.reaction,
            &mut existing.reactions,
            &resource.reaction,
            |r| r.id.as_deref(),
            |r| r.uuid,
        )?;

        if let Some(note) = resource.note.first() {
            existing.comment = non_blank(Some(note.text.as_str()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryLookup;
    use bridge_domain::{Concept, DomainRef, UserRef};
    use chrono::{TimeZone, Utc};

    fn concept(uuid: &str, name: &str) -> Concept {
        Concept::new(Uuid::parse_str(uuid).unwrap(), name)
    }

    fn penicillin() -> Concept {
        concept("71617bbb-aaaa-4aaa-aaaa-aaaaaaaaaaaa", "Penicillin")
    }
    fn rash() -> Concept {
        concept("512aaaaa-aaaa-4aaa-aaaa-aaaaaaaaaaaa", "Rash")
    }
    fn severe() -> Concept {
        concept("1500aaaa-aaaa-4aaa-aaaa-aaaaaaaaaaaa", "Severe")
    }
    fn mild() -> Concept {
        concept("1498aaaa-aaaa-4aaa-aaaa-aaaaaaaaaaaa", "Mild")
    }
    fn other_severity() -> Concept {
        concept("5622aaaa-aaaa-4aaa-aaaa-aaaaaaaaaaaa", "Other")
    }

    fn translator() -> AllergyTranslator {
        let config = TranslatorConfig::default()
            .with_contain_provenance(false)
            .with_allergy_severity(SeverityConcepts {
                mild: Some(mild().uuid),
                moderate: None,
                severe: Some(severe().uuid),
                other: Some(other_severity().uuid),
            });
        let lookup = InMemoryLookup::new()
            .with_concept(penicillin())
            .with_concept(rash())
            .with_concept(severe())
            .with_concept(mild())
            .with_concept(other_severity())
            .into_shared();
        AllergyTranslator::new(Arc::new(config), lookup)
    }

    fn penicillin_allergy() -> Allergy {
        Allergy {
            uuid: Uuid::new_v4(),
            patient: DomainRef::new(Uuid::new_v4()),
            allergen: Allergen {
                allergen_type: AllergenType::Drug,
                coded_allergen: Some(penicillin()),
                non_coded_allergen: None,
            },
            severity: Some(severe()),
            comment: Some("Reported by family".into()),
            reactions: vec![
                AllergyReaction {
                    uuid: Uuid::new_v4(),
                    reaction: rash(),
                    reaction_non_coded: None,
                },
                AllergyReaction {
                    uuid: Uuid::new_v4(),
                    reaction: Concept::default(),
                    reaction_non_coded: Some("Swollen lips".into()),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn translates_drug_allergy() {
        let out = translator()
            .to_fhir_resource(&penicillin_allergy())
            .expect("to fhir");

        assert!(out
            .clinical_status
            .as_ref()
            .expect("clinical status")
            .has_coding(ALLERGY_CLINICAL_STATUS_SYSTEM, "active"));
        assert!(out
            .verification_status
            .as_ref()
            .expect("verification status")
            .has_coding(ALLERGY_VERIFICATION_STATUS_SYSTEM, "confirmed"));
        assert_eq!(out.type_.as_deref(), Some("allergy"));
        assert_eq!(out.category, vec!["medication"]);
        assert_eq!(out.criticality.as_deref(), Some("high"));
        assert_eq!(out.reaction.len(), 2);
        assert_eq!(out.reaction[0].severity.as_deref(), Some("severe"));
        assert_eq!(
            out.reaction[1].manifestation[0].text.as_deref(),
            Some("Swollen lips")
        );
        assert_eq!(out.note[0].text, "Reported by family");
    }

    #[test]
    fn mild_severity_is_low_criticality() {
        let allergy = Allergy {
            severity: Some(mild()),
            ..penicillin_allergy()
        };
        let out = translator().to_fhir_resource(&allergy).expect("to fhir");
        assert_eq!(out.criticality.as_deref(), Some("low"));
    }

    #[test]
    fn unconfigured_severity_is_unable_to_assess() {
        let allergy = Allergy {
            severity: Some(concept("1499aaaa-aaaa-4aaa-aaaa-aaaaaaaaaaaa", "Moderate")),
            ..penicillin_allergy()
        };
        let out = translator().to_fhir_resource(&allergy).expect("to fhir");
        assert_eq!(out.criticality.as_deref(), Some("unable-to-assess"));
        assert_eq!(out.reaction[0].severity, None);
    }

    #[test]
    fn other_severity_is_unable_to_assess_both_ways() {
        let allergy = Allergy {
            severity: Some(other_severity()),
            ..penicillin_allergy()
        };
        let translator = translator();
        let out = translator.to_fhir_resource(&allergy).expect("to fhir");
        assert_eq!(out.criticality.as_deref(), Some("unable-to-assess"));
        assert!(out.reaction.iter().all(|r| r.severity.is_none()));

        let back: Allergy = translator.to_domain_type(&out).expect("to domain");
        assert_eq!(back.severity.map(|s| s.uuid), Some(other_severity().uuid));
    }

    #[test]
    fn other_allergen_has_no_category_and_keeps_free_text() {
        let allergy = Allergy {
            allergen: Allergen {
                allergen_type: AllergenType::Other,
                coded_allergen: None,
                non_coded_allergen: Some("Latex gloves".into()),
            },
            ..penicillin_allergy()
        };
        let out = translator().to_fhir_resource(&allergy).expect("to fhir");
        assert!(out.category.is_empty());
        assert_eq!(out.code.as_ref().and_then(|c| c.text.as_deref()), Some("Latex gloves"));
        assert!(out.code.as_ref().expect("code").coding.is_empty());
    }

    #[test]
    fn voided_allergy_is_inactive() {
        let allergy = Allergy {
            voided: true,
            ..penicillin_allergy()
        };
        let out = translator().to_fhir_resource(&allergy).expect("to fhir");
        assert!(out
            .clinical_status
            .expect("clinical status")
            .has_coding(ALLERGY_CLINICAL_STATUS_SYSTEM, "inactive"));
    }

    #[test]
    fn recorder_comes_from_creator() {
        let mut allergy = penicillin_allergy();
        allergy.audit.creator = Some(UserRef {
            uuid: Uuid::new_v4(),
            username: Some("nurse1".into()),
            person_name: None,
        });
        allergy.audit.date_created = Some(Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap());

        let out = translator().to_fhir_resource(&allergy).expect("to fhir");
        let recorder = out.recorder.expect("recorder");
        assert_eq!(recorder.display.as_deref(), Some("nurse1"));
        assert_eq!(out.recorded_date.as_deref(), Some("2024-01-05T09:00:00Z"));
    }

    #[test]
    fn round_trip_is_lossless() {
        let allergy = penicillin_allergy();
        let translator = translator();
        let fhir = translator.to_fhir_resource(&allergy).expect("to fhir");
        let back: Allergy = translator.to_domain_type(&fhir).expect("to domain");
        assert_eq!(back, allergy);
    }

    #[test]
    fn allergen_is_required() {
        let resource = fhir::AllergyIntolerance {
            patient: Some(fhir::Reference::new(format!("Patient/{}", Uuid::new_v4()))),
            ..Default::default()
        };
        let err = translator().to_domain_type(&resource).expect_err("no code");
        assert!(matches!(err, TranslationError::MissingElement("AllergyIntolerance.code")));
    }
}
