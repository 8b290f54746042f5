use crate::config::TranslatorConfig;
use crate::constants::LOCATION_TAG_SYSTEM;
use crate::reference::{from_reference_opt, to_reference, ReferenceKind};
use crate::translator::{meta_from_audit, non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::Location;
use fhir::{Address, Coding};
use std::sync::Arc;

#[derive(Clone)]
pub struct LocationTranslator {
    provenance: ProvenanceTranslator,
}

impl LocationTranslator {
    pub fn new(config: Arc<TranslatorConfig>) -> Self {
        Self {
            provenance: ProvenanceTranslator::new(config),
        }
    }

    fn address(location: &Location) -> Option<Address> {
        if !location.has_address() {
            return None;
        }
        Some(Address {
            line: [&location.address1, &location.address2]
                .into_iter()
                .filter_map(|l| non_blank(l.as_deref()))
                .collect(),
            city: non_blank(location.city_village.as_deref()),
            district: non_blank(location.county_district.as_deref()),
            state: non_blank(location.state_province.as_deref()),
            postal_code: non_blank(location.postal_code.as_deref()),
            country: non_blank(location.country.as_deref()),
            ..Default::default()
        })
    }
}

impl ToFhirTranslator<Location> for LocationTranslator {
    type Resource = fhir::Location;

    fn to_fhir_resource(&self, location: &Location) -> TranslationResult<fhir::Location> {
        tracing::debug!(uuid = %location.uuid, "translating location to FHIR");

        let tags: Vec<Coding> = location
            .tags
            .iter()
            .filter_map(|tag| non_blank(Some(tag.as_str())))
            .map(|tag| Coding::new(LOCATION_TAG_SYSTEM, tag.clone()).with_display(tag))
            .collect();
        let meta = match meta_from_audit(&location.audit) {
            Some(mut meta) => {
                meta.tag = tags;
                Some(meta)
            }
            None if !tags.is_empty() => Some(fhir::Meta {
                tag: tags,
                ..Default::default()
            }),
            None => None,
        };

        Ok(fhir::Location {
            id: Some(location.uuid.to_string()),
            meta,
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::Location,
                uuid: location.uuid,
                audit: &location.audit,
            })?,
            status: Some(if location.retired { "inactive" } else { "active" }.to_string()),
            name: non_blank(Some(location.name.as_str())),
            description: non_blank(location.description.as_deref()),
            address: Self::address(location),
            part_of: location
                .parent
                .as_ref()
                .map(|parent| to_reference(ReferenceKind::Location, parent)),
        })
    }
}

impl ToDomainTranslator<Location> for LocationTranslator {
    type Resource = fhir::Location;

    fn update_domain_type(&self, existing: &mut Location, resource: &fhir::Location) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Location.id", resource.id.as_deref(), existing.uuid)?;

        match non_blank(resource.name.as_deref()) {
            Some(name) => existing.name = name,
            None if existing.name.trim().is_empty() => {
                return Err(TranslationError::MissingElement("Location.name"))
            }
            None => {}
        }
        existing.description = non_blank(resource.description.as_deref());

        if let Some(status) = resource.status.as_deref() {
            existing.retired = status != "active";
        }

        if let Some(address) = &resource.address {
            let mut lines = address.line.iter().map(|l| non_blank(Some(l.as_str())));
            existing.address1 = lines.next().flatten();
            existing.address2 = lines.next().flatten();
            existing.city_village = non_blank(address.city.as_deref());
            existing.county_district = non_blank(address.district.as_deref());
            existing.state_province = non_blank(address.state.as_deref());
            existing.postal_code = non_blank(address.postal_code.as_deref());
            existing.country = non_blank(address.country.as_deref());
        }

        if resource.part_of.is_some() {
            existing.parent = from_reference_opt(ReferenceKind::Location, resource.part_of.as_ref())?;
        }

        if let Some(meta) = &resource.meta {
            let tags: Vec<String> = meta
                .tag
                .iter()
                .filter(|t| t.system.as_deref() == Some(LOCATION_TAG_SYSTEM))
                .filter_map(|t| non_blank(t.code.as_deref()))
                .collect();
            if !tags.is_empty() {
                existing.tags = tags;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_domain::DomainRef;
    use uuid::Uuid;

    fn ward() -> Location {
        Location {
            uuid: Uuid::new_v4(),
            name: "Ward 4".into(),
            description: Some("Medical ward".into()),
            address1: Some("Hospital Road".into()),
            city_village: Some("Eldoret".into()),
            country: Some("Kenya".into()),
            parent: Some(DomainRef::with_display(Uuid::new_v4(), "Moi Teaching Hospital")),
            tags: vec!["Login Location".into(), "Admission Location".into()],
            ..Default::default()
        }
    }

    fn translator() -> LocationTranslator {
        LocationTranslator::new(Arc::new(TranslatorConfig::default()))
    }

    #[test]
    fn translates_location() {
        let location = ward();
        let out = translator().to_fhir_resource(&location).expect("to fhir");

        assert_eq!(out.status.as_deref(), Some("active"));
        assert_eq!(out.name.as_deref(), Some("Ward 4"));
        let address = out.address.expect("address");
        assert_eq!(address.line, vec!["Hospital Road"]);
        assert_eq!(address.city.as_deref(), Some("Eldoret"));
        let part_of = out.part_of.expect("parent");
        assert_eq!(
            part_of.reference,
            Some(format!("Location/{}", location.parent.as_ref().unwrap().uuid))
        );
        let meta = out.meta.expect("meta with tags");
        assert_eq!(meta.tag.len(), 2);
        assert!(meta.tag[0].is(LOCATION_TAG_SYSTEM, "Login Location"));
    }

    #[test]
    fn location_without_address_has_none() {
        let location = Location {
            uuid: Uuid::new_v4(),
            name: "Pharmacy".into(),
            retired: true,
            ..Default::default()
        };
        let out = translator().to_fhir_resource(&location).expect("to fhir");
        assert!(out.address.is_none());
        assert!(out.meta.is_none());
        assert_eq!(out.status.as_deref(), Some("inactive"));
    }

    #[test]
    fn round_trip_is_lossless() {
        let location = ward();
        let translator = translator();
        let fhir = translator.to_fhir_resource(&location).expect("to fhir");
        let back: Location = translator.to_domain_type(&fhir).expect("to domain");
        assert_eq!(back, location);
    }

    #[test]
    fn name_is_required_for_new_locations() {
        let err = translator()
            .to_domain_type(&fhir::Location::default())
            .expect_err("no name");
        assert!(matches!(err, TranslationError::MissingElement("Location.name")));
    }
}
