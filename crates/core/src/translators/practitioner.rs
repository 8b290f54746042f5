use crate::config::TranslatorConfig;
use crate::reference::ReferenceKind;
use crate::translator::{meta_from_audit, merge_by_uuid, non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::address::PersonAddressTranslator;
use crate::translators::birthdate::{BirthDate, BirthDateTranslator};
use crate::translators::gender::GenderTranslator;
use crate::translators::name::PersonNameTranslator;
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::TranslationResult;
use bridge_domain::Provider;
use fhir::Identifier;
use std::sync::Arc;

/// `Provider` <-> `Practitioner`.
#[derive(Clone)]
pub struct PractitionerTranslator {
    config: Arc<TranslatorConfig>,
    name: PersonNameTranslator,
    address: PersonAddressTranslator,
    gender: GenderTranslator,
    birthdate: BirthDateTranslator,
    provenance: ProvenanceTranslator,
}

impl PractitionerTranslator {
    pub fn new(config: Arc<TranslatorConfig>) -> Self {
        Self {
            provenance: ProvenanceTranslator::new(config.clone()),
            config,
            name: PersonNameTranslator,
            address: PersonAddressTranslator,
            gender: GenderTranslator,
            birthdate: BirthDateTranslator,
        }
    }
}

impl ToFhirTranslator<Provider> for PractitionerTranslator {
    type Resource = fhir::Practitioner;

    fn to_fhir_resource(&self, provider: &Provider) -> TranslationResult<fhir::Practitioner> {
        tracing::debug!(uuid = %provider.uuid, "translating provider to FHIR");

        let identifier = non_blank(provider.identifier.as_deref())
            .map(|value| Identifier {
                system: self.config.provider_identifier_system().map(str::to_string),
                value: Some(value),
                ..Default::default()
            })
            .into_iter()
            .collect();

        let name = provider
            .names
            .iter()
            .filter(|n| !n.voided)
            .map(|n| self.name.to_fhir_resource(n))
            .collect::<TranslationResult<Vec<_>>>()?;
        let address = provider
            .addresses
            .iter()
            .filter(|a| !a.voided)
            .map(|a| self.address.to_fhir_resource(a))
            .collect::<TranslationResult<Vec<_>>>()?;

        Ok(fhir::Practitioner {
            id: Some(provider.uuid.to_string()),
            meta: meta_from_audit(&provider.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::Practitioner,
                uuid: provider.uuid,
                audit: &provider.audit,
            })?,
            identifier,
            active: Some(!provider.retired),
            name,
            telecom: Vec::new(),
            address,
            gender: self.gender.to_fhir_resource_opt(provider.gender.as_ref())?,
            birth_date: self
                .birthdate
                .to_fhir_resource(&BirthDate {
                    date: provider.birthdate,
                    estimated: false,
                })?,
        })
    }
}

impl ToDomainTranslator<Provider> for PractitionerTranslator {
    type Resource = fhir::Practitioner;

    fn update_domain_type(&self, existing: &mut Provider, resource: &fhir::Practitioner) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Practitioner.id", resource.id.as_deref(), existing.uuid)?;

        let configured = self.config.provider_identifier_system();
        let identifier = resource
            .identifier
            .iter()
            .find(|i| configured.is_some() && i.system.as_deref() == configured)
            .or_else(|| resource.identifier.first());
        if let Some(value) = identifier.and_then(|i| non_blank(i.value.as_deref())) {
            existing.identifier = Some(value);
        }

        if let Some(active) = resource.active {
            existing.retired = !active;
        }

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

        if let Some(gender) = &resource.gender {
            self.gender.update_domain_type(&mut existing.gender, gender)?;
        }
        if let Some(birth_date) = &resource.birth_date {
            let parsed: BirthDate = self.birthdate.to_domain_type(birth_date)?;
            existing.birthdate = parsed.date;
        }
        Ok(())
    }
}
