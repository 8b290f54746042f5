use crate::translator::{non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::TranslationResult;
use bridge_domain::PersonName;
use fhir::HumanName;

const USE_OFFICIAL: &str = "official";
const USE_USUAL: &str = "usual";

/// `PersonName` <-> `HumanName`. Given and middle names share `given[]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PersonNameTranslator;

impl ToFhirTranslator<PersonName> for PersonNameTranslator {
    type Resource = HumanName;

    fn to_fhir_resource(&self, name: &PersonName) -> TranslationResult<HumanName> {
        let given = [&name.given_name, &name.middle_name]
            .into_iter()
            .filter_map(|part| non_blank(part.as_deref()))
            .collect();
        let full_name = name.full_name();

        Ok(HumanName {
            id: Some(name.uuid.to_string()),
            use_: Some(if name.preferred { USE_OFFICIAL } else { USE_USUAL }.to_string()),
            text: (!full_name.is_empty()).then_some(full_name),
            family: non_blank(name.family_name.as_deref()),
            given,
            prefix: non_blank(name.prefix.as_deref()).into_iter().collect(),
            suffix: non_blank(name.suffix.as_deref()).into_iter().collect(),
        })
    }
}

impl ToDomainTranslator<PersonName> for PersonNameTranslator {
    type Resource = HumanName;

    fn update_domain_type(&self, existing: &mut PersonName, name: &HumanName) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("HumanName.id", name.id.as_deref(), existing.uuid)?;

        let mut given = name.given.iter().filter_map(|g| non_blank(Some(g.as_str())));
        existing.given_name = given.next();
        let middle: Vec<String> = given.collect();
        existing.middle_name = (!middle.is_empty()).then(|| middle.join(" "));

        existing.family_name = non_blank(name.family.as_deref());
        existing.prefix = non_blank(name.prefix.first().map(String::as_str));
        existing.suffix = non_blank(name.suffix.first().map(String::as_str));

        if let Some(use_) = name.use_.as_deref() {
            existing.preferred = use_ == USE_OFFICIAL;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sarah() -> PersonName {
        PersonName {
            uuid: Uuid::new_v4(),
            prefix: Some("Dr".into()),
            given_name: Some("Sarah".into()),
            middle_name: Some("Jane".into()),
            family_name: Some("Williams".into()),
            preferred: true,
            ..Default::default()
        }
    }

    #[test]
    fn maps_parts_into_human_name() {
        let name = PersonNameTranslator.to_fhir_resource(&sarah()).expect("to fhir");
        assert_eq!(name.given, vec!["Sarah", "Jane"]);
        assert_eq!(name.family.as_deref(), Some("Williams"));
        assert_eq!(name.prefix, vec!["Dr"]);
        assert!(name.suffix.is_empty());
        assert_eq!(name.text.as_deref(), Some("Dr Sarah Jane Williams"));
        assert_eq!(name.use_.as_deref(), Some("official"));
    }

    #[test]
    fn non_preferred_names_are_usual() {
        let mut name = sarah();
        name.preferred = false;
        let out = PersonNameTranslator.to_fhir_resource(&name).expect("to fhir");
        assert_eq!(out.use_.as_deref(), Some("usual"));
    }

    #[test]
    fn round_trip_keeps_uuid_and_parts() {
        let original = sarah();
        let fhir = PersonNameTranslator.to_fhir_resource(&original).expect("to fhir");
        let back: PersonName = PersonNameTranslator.to_domain_type(&fhir).expect("to domain");
        assert_eq!(back, original);
    }

    #[test]
    fn extra_given_names_become_middle_name() {
        let fhir = HumanName {
            given: vec!["Anna".into(), "Maria".into(), "Luisa".into()],
            ..Default::default()
        };
        let back: PersonName = PersonNameTranslator.to_domain_type(&fhir).expect("to domain");
        assert_eq!(back.given_name.as_deref(), Some("Anna"));
        assert_eq!(back.middle_name.as_deref(), Some("Maria Luisa"));
        assert!(!back.uuid.is_nil());
    }
}
