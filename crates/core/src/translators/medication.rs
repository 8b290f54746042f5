use crate::config::TranslatorConfig;
use crate::constants::{DRUG_NAME_EXTENSION, DRUG_STRENGTH_EXTENSION};
use crate::lookup::SharedLookup;
use crate::reference::ReferenceKind;
use crate::translator::{meta_from_audit, non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::concept::ConceptTranslator;
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::Drug;
use fhir::datatypes::find_extension;
use fhir::Extension;
use std::sync::Arc;

/// `Drug` <-> `Medication`.
#[derive(Clone)]
pub struct MedicationTranslator {
    concept: ConceptTranslator,
    provenance: ProvenanceTranslator,
}

impl MedicationTranslator {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        Self {
            concept: ConceptTranslator::new(config.clone(), lookup),
            provenance: ProvenanceTranslator::new(config),
        }
    }
}

impl ToFhirTranslator<Drug> for MedicationTranslator {
    type Resource = fhir::Medication;

    fn to_fhir_resource(&self, drug: &Drug) -> TranslationResult<fhir::Medication> {
        tracing::debug!(uuid = %drug.uuid, "translating drug to FHIR");

        let extension = [
            (DRUG_NAME_EXTENSION, drug.name.as_deref()),
            (DRUG_STRENGTH_EXTENSION, drug.strength.as_deref()),
        ]
        .into_iter()
        .filter_map(|(url, value)| non_blank(value).map(|v| Extension::string(url, v)))
        .collect();

        Ok(fhir::Medication {
            id: Some(drug.uuid.to_string()),
            meta: meta_from_audit(&drug.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::Medication,
                uuid: drug.uuid,
                audit: &drug.audit,
            })?,
            extension,
            code: Some(self.concept.to_fhir_resource(&drug.concept)?),
            status: Some(if drug.retired { "inactive" } else { "active" }.to_string()),
            form: self.concept.to_fhir_resource_opt(drug.dosage_form.as_ref())?,
        })
    }
}

impl ToDomainTranslator<Drug> for MedicationTranslator {
    type Resource = fhir::Medication;

    fn update_domain_type(&self, existing: &mut Drug, resource: &fhir::Medication) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Medication.id", resource.id.as_deref(), existing.uuid)?;

        match &resource.code {
            Some(code) => existing.concept = self.concept.resolve_required("Medication.code", code)?,
            None if existing.concept.uuid.is_nil() => {
                return Err(TranslationError::MissingElement("Medication.code"))
            }
            None => {}
        }
        if let Some(form) = &resource.form {
            existing.dosage_form = Some(self.concept.resolve_required("Medication.form", form)?);
        }

        if let Some(status) = resource.status.as_deref() {
            existing.retired = status != "active";
        }

        if let Some(name) = find_extension(&resource.extension, DRUG_NAME_EXTENSION) {
            existing.name = non_blank(name.value_string.as_deref());
        }
        if let Some(strength) = find_extension(&resource.extension, DRUG_STRENGTH_EXTENSION) {
            existing.strength = non_blank(strength.value_string.as_deref());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryLookup;
    use bridge_domain::Concept;
    use uuid::Uuid;

    fn paracetamol() -> Concept {
        Concept::new(
            Uuid::parse_str("70116aaa-aaaa-4aaa-aaaa-aaaaaaaaaaaa").unwrap(),
            "Paracetamol",
        )
    }

    fn tablet() -> Concept {
        Concept::new(
            Uuid::parse_str("1513aaaa-aaaa-4aaa-aaaa-aaaaaaaaaaaa").unwrap(),
            "Tablet",
        )
    }

    fn translator() -> MedicationTranslator {
        MedicationTranslator::new(
            Arc::new(TranslatorConfig::default()),
            InMemoryLookup::new()
                .with_concept(paracetamol())
                .with_concept(tablet())
                .into_shared(),
        )
    }

    fn drug() -> Drug {
        Drug {
            uuid: Uuid::new_v4(),
            name: Some("Paracetamol 500mg tablet".into()),
            concept: paracetamol(),
            dosage_form: Some(tablet()),
            strength: Some("500mg".into()),
            ..Default::default()
        }
    }

    #[test]
    fn name_and_strength_become_extensions() {
        let out = translator().to_fhir_resource(&drug()).expect("to fhir");

        assert_eq!(out.status.as_deref(), Some("active"));
        assert_eq!(
            find_extension(&out.extension, DRUG_NAME_EXTENSION).and_then(|e| e.value_string.as_deref()),
            Some("Paracetamol 500mg tablet")
        );
        assert_eq!(
            find_extension(&out.extension, DRUG_STRENGTH_EXTENSION)
                .and_then(|e| e.value_string.as_deref()),
            Some("500mg")
        );
        assert_eq!(out.form.and_then(|f| f.text).as_deref(), Some("Tablet"));
    }

    #[test]
    fn retired_drug_is_inactive() {
        let mut drug = drug();
        drug.retired = true;
        drug.strength = None;
        let out = translator().to_fhir_resource(&drug).expect("to fhir");
        assert_eq!(out.status.as_deref(), Some("inactive"));
        assert_eq!(out.extension.len(), 1);
    }

    #[test]
    fn round_trip_is_lossless() {
        let drug = drug();
        let translator = translator();
        let fhir = translator.to_fhir_resource(&drug).expect("to fhir");
        let back: Drug = translator.to_domain_type(&fhir).expect("to domain");
        assert_eq!(back, drug);
    }

    #[test]
    fn code_is_required() {
        let err = translator()
            .to_domain_type(&fhir::Medication::default())
            .expect_err("no code");
        assert!(matches!(err, TranslationError::MissingElement("Medication.code")));
    }
}
