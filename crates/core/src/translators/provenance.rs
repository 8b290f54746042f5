//! Provenance derived from a record's audit trail. Only emitted, never read back.

use crate::config::TranslatorConfig;
use crate::constants::{
    DATA_OPERATION_SYSTEM, PARTICIPATION_TYPE_SYSTEM, PROVENANCE_PARTICIPANT_TYPE_SYSTEM,
};
use crate::datetime::format_date_time;
use crate::reference::{user_reference, ReferenceKind};
use crate::translator::ToFhirTranslator;
use crate::TranslationResult;
use bridge_domain::{AuditInfo, UserRef};
use chrono::{DateTime, Utc};
use fhir::{CodeableConcept, Coding, Provenance, ProvenanceAgent, Reference, Resource};
use std::sync::Arc;
use uuid::Uuid;

/// The record a provenance describes.
#[derive(Clone, Copy, Debug)]
pub struct AuditedRecord<'a> {
    pub kind: ReferenceKind,
    pub uuid: Uuid,
    pub audit: &'a AuditInfo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Activity {
    Create,
    Update,
}

impl Activity {
    fn coding(self) -> Coding {
        match self {
            Activity::Create => Coding::new(DATA_OPERATION_SYSTEM, "CREATE").with_display("create"),
            Activity::Update => Coding::new(DATA_OPERATION_SYSTEM, "UPDATE").with_display("revise"),
        }
    }
}

#[derive(Clone)]
pub struct ProvenanceTranslator {
    config: Arc<TranslatorConfig>,
}

impl ProvenanceTranslator {
    pub fn new(config: Arc<TranslatorConfig>) -> Self {
        Self { config }
    }

    /// Provenance for `contained`, or nothing when containment is switched off.
    pub fn contained(&self, record: AuditedRecord<'_>) -> TranslationResult<Vec<Resource>> {
        if !self.config.contain_provenance() {
            return Ok(Vec::new());
        }
        Ok(self
            .to_fhir_resource(&record)?
            .into_iter()
            .map(Resource::from)
            .collect())
    }

    fn build(
        record: &AuditedRecord<'_>,
        activity: Activity,
        recorded: &DateTime<Utc>,
        author: Option<&UserRef>,
    ) -> Provenance {
        let target = Reference {
            reference: Some(format!("{}/{}", record.kind.resource_type(), record.uuid)),
            type_: Some(record.kind.resource_type().to_string()),
            display: None,
        };

        let agent = author
            .map(|user| ProvenanceAgent {
                type_: Some(CodeableConcept::from_coding(
                    Coding::new(PROVENANCE_PARTICIPANT_TYPE_SYSTEM, "author").with_display("Author"),
                )),
                role: vec![CodeableConcept::from_coding(
                    Coding::new(PARTICIPATION_TYPE_SYSTEM, "AUT").with_display("author"),
                )],
                who: Some(user_reference(user)),
            })
            .into_iter()
            .collect();

        Provenance {
            id: Some(Uuid::new_v4().to_string()),
            meta: None,
            target: vec![target],
            recorded: Some(format_date_time(recorded)),
            activity: Some(CodeableConcept::from_coding(activity.coding())),
            agent,
        }
    }
}

impl<'a> ToFhirTranslator<AuditedRecord<'a>> for ProvenanceTranslator {
    type Resource = Vec<Provenance>;

    fn to_fhir_resource(&self, record: &AuditedRecord<'a>) -> TranslationResult<Vec<Provenance>> {
        let audit = record.audit;
        let mut provenance = Vec::with_capacity(2);

        if let Some(created) = &audit.date_created {
            provenance.push(Self::build(record, Activity::Create, created, audit.creator.as_ref()));
        }
        if let Some(changed) = &audit.date_changed {
            provenance.push(Self::build(record, Activity::Update, changed, audit.changed_by.as_ref()));
        }

        tracing::debug!(
            target_type = record.kind.resource_type(),
            count = provenance.len(),
            "built provenance"
        );
        Ok(provenance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn admin() -> UserRef {
        UserRef {
            uuid: Uuid::new_v4(),
            username: Some("admin".into()),
            person_name: Some("Super User".into()),
        }
    }

    fn audit() -> AuditInfo {
        AuditInfo {
            creator: Some(admin()),
            date_created: Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()),
            changed_by: Some(admin()),
            date_changed: Some(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()),
        }
    }

    #[test]
    fn builds_create_and_update_provenance() {
        let audit = audit();
        let record = AuditedRecord {
            kind: ReferenceKind::Patient,
            uuid: Uuid::new_v4(),
            audit: &audit,
        };
        let translator = ProvenanceTranslator::new(Arc::new(TranslatorConfig::default()));
        let provenance = translator.to_fhir_resource(&record).expect("to fhir");

        assert_eq!(provenance.len(), 2);
        let create = &provenance[0];
        let activity = create.activity.as_ref().expect("activity");
        assert!(activity.has_coding(DATA_OPERATION_SYSTEM, "CREATE"));
        assert_eq!(create.recorded.as_deref(), Some("2024-01-01T09:00:00Z"));
        assert_eq!(
            create.target[0].reference,
            Some(format!("Patient/{}", record.uuid))
        );

        let agent = &create.agent[0];
        assert!(agent
            .type_
            .as_ref()
            .expect("agent type")
            .has_coding(PROVENANCE_PARTICIPANT_TYPE_SYSTEM, "author"));
        assert!(agent.role[0].has_coding(PARTICIPATION_TYPE_SYSTEM, "AUT"));
        let who = agent.who.as_ref().expect("who");
        assert_eq!(
            who.reference,
            Some(format!("Practitioner/{}", audit.creator.as_ref().unwrap().uuid))
        );
        assert_eq!(who.display.as_deref(), Some("Super User"));

        assert!(provenance[1]
            .activity
            .as_ref()
            .expect("activity")
            .has_coding(DATA_OPERATION_SYSTEM, "UPDATE"));
    }

    #[test]
    fn no_audit_no_provenance() {
        let audit = AuditInfo::default();
        let record = AuditedRecord {
            kind: ReferenceKind::Location,
            uuid: Uuid::new_v4(),
            audit: &audit,
        };
        let translator = ProvenanceTranslator::new(Arc::new(TranslatorConfig::default()));
        assert!(translator.to_fhir_resource(&record).expect("to fhir").is_empty());
    }

    #[test]
    fn containment_follows_config() {
        let audit = audit();
        let record = AuditedRecord {
            kind: ReferenceKind::Encounter,
            uuid: Uuid::new_v4(),
            audit: &audit,
        };

        let on = ProvenanceTranslator::new(Arc::new(TranslatorConfig::default()));
        let contained = on.contained(record).expect("contained");
        assert_eq!(contained.len(), 2);
        assert_eq!(contained[0].resource_type(), "Provenance");

        let off = ProvenanceTranslator::new(Arc::new(
            TranslatorConfig::default().with_contain_provenance(false),
        ));
        assert!(off.contained(record).expect("contained").is_empty());
    }
}
