use crate::constants::IDENTIFIER_LOCATION_EXTENSION;
use crate::lookup::SharedLookup;
use crate::reference::{from_reference_opt, to_reference, ReferenceKind};
use crate::translator::{non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::PatientIdentifier;
use fhir::datatypes::find_extension;
use fhir::{CodeableConcept, Extension, Identifier};

/// `PatientIdentifier` <-> `Identifier`.
///
/// The identifier type travels as `type.text`, and the issuing location as an extension.
#[derive(Clone)]
pub struct PatientIdentifierTranslator {
    lookup: SharedLookup,
}

impl PatientIdentifierTranslator {
    pub fn new(lookup: SharedLookup) -> Self {
        Self { lookup }
    }
}

impl ToFhirTranslator<PatientIdentifier> for PatientIdentifierTranslator {
    type Resource = Identifier;

    fn to_fhir_resource(&self, identifier: &PatientIdentifier) -> TranslationResult<Identifier> {
        let extension = identifier
            .location
            .iter()
            .map(|location| {
                Extension::reference(
                    IDENTIFIER_LOCATION_EXTENSION,
                    to_reference(ReferenceKind::Location, location),
                )
            })
            .collect();

        let type_name = identifier.identifier_type.name.trim();

        Ok(Identifier {
            id: Some(identifier.uuid.to_string()),
            extension,
            use_: Some(if identifier.preferred { "official" } else { "usual" }.to_string()),
            type_: (!type_name.is_empty()).then(|| CodeableConcept::from_text(type_name)),
            system: None,
            value: non_blank(Some(identifier.identifier.as_str())),
        })
    }
}

impl ToDomainTranslator<PatientIdentifier> for PatientIdentifierTranslator {
    type Resource = Identifier;

    fn update_domain_type(&self, existing: &mut PatientIdentifier, identifier: &Identifier) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Identifier.id", identifier.id.as_deref(), existing.uuid)?;

        existing.identifier = non_blank(identifier.value.as_deref())
            .ok_or(TranslationError::MissingElement("Identifier.value"))?;

        let type_name = identifier
            .type_
            .as_ref()
            .and_then(|t| {
                t.text
                    .as_deref()
                    .or_else(|| t.coding.iter().find_map(|c| c.display.as_deref()))
            })
            .and_then(|name| non_blank(Some(name)))
            .ok_or(TranslationError::MissingElement("Identifier.type"))?;

        existing.identifier_type = self
            .lookup
            .identifier_type_by_name(&type_name)
            .ok_or(TranslationError::UnknownIdentifierType(type_name))?;

        let location = find_extension(&identifier.extension, IDENTIFIER_LOCATION_EXTENSION)
            .and_then(|ext| ext.value_reference.as_ref());
        if location.is_some() {
            existing.location = from_reference_opt(ReferenceKind::Location, location)?;
        }

        if let Some(use_) = identifier.use_.as_deref() {
            existing.preferred = use_ == "official";
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryLookup;
    use bridge_domain::{DomainRef, PatientIdentifierType};
    use uuid::Uuid;

    fn openmrs_id() -> PatientIdentifierType {
        PatientIdentifierType {
            uuid: Uuid::new_v4(),
            name: "OpenMRS ID".into(),
        }
    }

    fn identifier(identifier_type: PatientIdentifierType) -> PatientIdentifier {
        PatientIdentifier {
            uuid: Uuid::new_v4(),
            identifier: "100-8".into(),
            identifier_type,
            location: Some(DomainRef::with_display(Uuid::new_v4(), "Outpatient Clinic")),
            preferred: true,
            voided: false,
        }
    }

    #[test]
    fn carries_type_use_and_location() {
        let translator = PatientIdentifierTranslator::new(InMemoryLookup::new().into_shared());
        let out = translator
            .to_fhir_resource(&identifier(openmrs_id()))
            .expect("to fhir");

        assert_eq!(out.value.as_deref(), Some("100-8"));
        assert_eq!(out.use_.as_deref(), Some("official"));
        assert_eq!(out.type_.and_then(|t| t.text).as_deref(), Some("OpenMRS ID"));
        let ext = find_extension(&out.extension, IDENTIFIER_LOCATION_EXTENSION).expect("location");
        let location = ext.value_reference.as_ref().expect("reference");
        assert_eq!(location.display.as_deref(), Some("Outpatient Clinic"));
    }

    #[test]
    fn round_trip_resolves_type_through_lookup() {
        let id_type = openmrs_id();
        let translator = PatientIdentifierTranslator::new(
            InMemoryLookup::new().with_identifier_type(id_type.clone()).into_shared(),
        );
        let original = identifier(id_type);

        let fhir = translator.to_fhir_resource(&original).expect("to fhir");
        let back: PatientIdentifier = translator.to_domain_type(&fhir).expect("to domain");
        assert_eq!(back, original);
    }

    #[test]
    fn unknown_identifier_type_is_an_error() {
        let translator = PatientIdentifierTranslator::new(InMemoryLookup::new().into_shared());
        let fhir = translator
            .to_fhir_resource(&identifier(openmrs_id()))
            .expect("to fhir");

        let err = translator
            .to_domain_type(&fhir)
            .expect_err("type not in lookup");
        assert!(matches!(err, TranslationError::UnknownIdentifierType(name) if name == "OpenMRS ID"));
    }

    #[test]
    fn missing_value_is_an_error() {
        let translator = PatientIdentifierTranslator::new(InMemoryLookup::new().into_shared());
        let err = translator
            .to_domain_type(&Identifier::default())
            .expect_err("no value");
        assert!(matches!(err, TranslationError::MissingElement("Identifier.value")));
    }
}
