//! Patient demographics.
//!
//! Composes the identifier, name, address, telecom, gender and birthdate translators. On the
//! way back, list elements are merged into the existing patient by uuid so that an update
//! never duplicates a name or identifier the platform already holds.

use crate::config::TranslatorConfig;
use crate::datetime::{format_date_time, parse_date_time};
use crate::lookup::SharedLookup;
use crate::reference::ReferenceKind;
use crate::translator::{meta_from_audit, merge_by_uuid, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::address::PersonAddressTranslator;
use crate::translators::birthdate::{BirthDate, BirthDateTranslator};
use crate::translators::gender::GenderTranslator;
use crate::translators::identifier::PatientIdentifierTranslator;
use crate::translators::name::PersonNameTranslator;
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::translators::telecom::TelecomTranslator;
use crate::TranslationResult;
use bridge_domain::Patient;
use std::sync::Arc;

#[derive(Clone)]
pub struct PatientTranslator {
    identifier: PatientIdentifierTranslator,
    name: PersonNameTranslator,
    address: PersonAddressTranslator,
    telecom: TelecomTranslator,
    gender: GenderTranslator,
    birthdate: BirthDateTranslator,
    provenance: ProvenanceTranslator,
}

impl PatientTranslator {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        Self {
            identifier: PatientIdentifierTranslator::new(lookup.clone()),
            name: PersonNameTranslator,
            address: PersonAddressTranslator,
            telecom: TelecomTranslator::new(config.clone(), lookup),
            gender: GenderTranslator,
            birthdate: BirthDateTranslator,
            provenance: ProvenanceTranslator::new(config),
        }
    }
}

impl ToFhirTranslator<Patient> for PatientTranslator {
    type Resource = fhir::Patient;

    fn to_fhir_resource(&self, patient: &Patient) -> TranslationResult<fhir::Patient> {
        tracing::debug!(uuid = %patient.uuid, "translating patient to FHIR");

        let identifier = patient
            .identifiers
            .iter()
            .filter(|i| !i.voided)
            .map(|i| self.identifier.to_fhir_resource(i))
            .collect::<TranslationResult<Vec<_>>>()?;
        let name = patient
            .names
            .iter()
            .filter(|n| !n.voided)
            .map(|n| self.name.to_fhir_resource(n))
            .collect::<TranslationResult<Vec<_>>>()?;
        let address = patient
            .addresses
            .iter()
            .filter(|a| !a.voided)
            .map(|a| self.address.to_fhir_resource(a))
            .collect::<TranslationResult<Vec<_>>>()?;
        let telecom = patient
            .attributes
            .iter()
            .filter(|a| self.telecom.is_telecom(a))
            .map(|a| self.telecom.to_fhir_resource(a))
            .collect::<TranslationResult<Vec<_>>>()?;

        let birth_date = self.birthdate.to_fhir_resource(&BirthDate {
            date: patient.birthdate,
            estimated: patient.birthdate_estimated,
        })?;

        let (deceased_boolean, deceased_date_time) = match (patient.dead, &patient.death_date) {
            (true, Some(date)) => (None, Some(format_date_time(date))),
            (dead, _) => (Some(dead), None),
        };

        Ok(fhir::Patient {
            id: Some(patient.uuid.to_string()),
            meta: meta_from_audit(&patient.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::Patient,
                uuid: patient.uuid,
                audit: &patient.audit,
            })?,
            extension: Vec::new(),
            identifier,
            active: Some(!patient.voided),
            name,
            telecom,
            gender: self.gender.to_fhir_resource_opt(patient.gender.as_ref())?,
            birth_date,
            deceased_boolean,
            deceased_date_time,
            address,
        })
    }
}

impl ToDomainTranslator<Patient> for PatientTranslator {
    type Resource = fhir::Patient;

    fn update_domain_type(&self, existing: &mut Patient, resource: &fhir::Patient) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Patient.id", resource.id.as_deref(), existing.uuid)?;
        tracing::debug!(uuid = %existing.uuid, "translating FHIR Patient to domain");

        if let Some(active) = resource.active {
            existing.voided = !active;
        }

        merge_by_uuid(
            &self.identifier,
            &mut existing.identifiers,
            &resource.identifier,
            |i| i.id.as_deref(),
            |i| i.uuid,
        )?;
        merge_by_uuid(
            &self.name,
            &mut existing.names,
            &resource.name,
            |n| n.id.as_deref(),
            |n| n.uuid,
        )?;
        merge_by_uuid(
            &self.address,
            &mut existing.addresses,
            &resource.address,
            |a| a.id.as_deref(),
            |a| a.uuid,
        )?;
        let phones: Vec<_> = resource
            .telecom
            .iter()
            .filter(|c| c.system.as_deref().map_or(true, |s| s == "phone"))
            .cloned()
            .collect();
        if phones.len() < resource.telecom.len() {
            tracing::warn!(
                dropped = resource.telecom.len() - phones.len(),
                "non-phone telecom entries dropped"
            );
        }
        merge_by_uuid(
            &self.telecom,
            &mut existing.attributes,
            &phones,
            |c| c.id.as_deref(),
            |a| a.uuid,
        )?;

        if let Some(gender) = &resource.gender {
            self.gender.update_domain_type(&mut existing.gender, gender)?;
        }

        if let Some(birth_date) = &resource.birth_date {
            let parsed: BirthDate = self.birthdate.to_domain_type(birth_date)?;
            existing.birthdate = parsed.date;
            existing.birthdate_estimated = parsed.estimated;
        }

        if let Some(value) = &resource.deceased_date_time {
            existing.dead = true;
            existing.death_date = Some(parse_date_time("Patient.deceasedDateTime", value)?);
        } else if let Some(dead) = resource.deceased_boolean {
            existing.dead = dead;
            if !dead {
                existing.death_date = None;
            }
        }

        Ok(())
    }
}
