//! FHIR `Reference` handling.
//!
//! Domain records link to each other by uuid ([`DomainRef`]); FHIR links by a relative
//! reference such as `Patient/90a8d1ea-...`. These helpers convert between the two and pull
//! the type and id back out of the many reference spellings FHIR allows.

use crate::{TranslationError, TranslationResult};
use bridge_domain::{DomainRef, Patient, Provider, UserRef};
use fhir::Reference;
use uuid::Uuid;

/// The resource types a domain link can point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
    Patient,
    Practitioner,
    Encounter,
    Location,
    Medication,
    MedicationRequest,
    Observation,
    AllergyIntolerance,
    Condition,
}

impl ReferenceKind {
    pub fn resource_type(self) -> &'static str {
        match self {
            ReferenceKind::Patient => "Patient",
            ReferenceKind::Practitioner => "Practitioner",
            ReferenceKind::Encounter => "Encounter",
            ReferenceKind::Location => "Location",
            ReferenceKind::Medication => "Medication",
            ReferenceKind::MedicationRequest => "MedicationRequest",
            ReferenceKind::Observation => "Observation",
            ReferenceKind::AllergyIntolerance => "AllergyIntolerance",
            ReferenceKind::Condition => "Condition",
        }
    }
}

/// `<Type>/<uuid>` reference carrying the link's display text.
pub fn to_reference(kind: ReferenceKind, domain: &DomainRef) -> Reference {
    Reference {
        reference: Some(format!("{}/{}", kind.resource_type(), domain.uuid)),
        type_: Some(kind.resource_type().to_string()),
        display: domain.display.clone(),
    }
}

/// A system user as the `Practitioner` who authored or recorded something.
pub fn user_reference(user: &UserRef) -> Reference {
    to_reference(
        ReferenceKind::Practitioner,
        &DomainRef::with_display(user.uuid, user.display()),
    )
}

/// The resource type a reference points at.
///
/// An explicit `type` wins. Otherwise the path segment before the id is used. Contained
/// (`#id`) and bare-id references have no type.
pub fn reference_type(reference: &Reference) -> Option<&str> {
    if let Some(explicit) = reference.type_.as_deref() {
        return Some(explicit);
    }

    let raw = reference.reference.as_deref()?.trim();
    if raw.starts_with('#') {
        return None;
    }

    let segments = path_segments(raw);
    match segments.len() {
        0 | 1 => None,
        n => Some(segments[n - 2]),
    }
}

/// The logical id a reference points at.
pub fn reference_id(reference: &Reference) -> Option<&str> {
    let raw = reference.reference.as_deref()?.trim();

    if let Some(local) = raw.strip_prefix('#') {
        return Some(local).filter(|id| !id.is_empty());
    }
    if let Some(urn) = raw.strip_prefix("urn:uuid:") {
        return Some(urn).filter(|id| !id.is_empty());
    }

    path_segments(raw).last().copied()
}

/// Resolve a reference to a domain link of the given kind.
///
/// # Errors
///
/// Returns [`TranslationError::InvalidReference`] when the reference names another resource
/// type, has no id, or the id is not a uuid.
pub fn from_reference(kind: ReferenceKind, reference: &Reference) -> TranslationResult<DomainRef> {
    if let Some(found) = reference_type(reference) {
        if found != kind.resource_type() {
            return Err(TranslationError::InvalidReference(format!(
                "expected a {} reference, got {}",
                kind.resource_type(),
                found
            )));
        }
    }

    let id = reference_id(reference).ok_or_else(|| {
        TranslationError::InvalidReference(format!(
            "{} reference has no id",
            kind.resource_type()
        ))
    })?;

    let uuid = Uuid::parse_str(id).map_err(|_| {
        TranslationError::InvalidReference(format!(
            "{} reference id '{}' is not a uuid",
            kind.resource_type(),
            id
        ))
    })?;

    Ok(DomainRef {
        uuid,
        display: reference.display.clone(),
    })
}

/// `None` in, `None` out.
pub fn from_reference_opt(
    kind: ReferenceKind,
    reference: Option<&Reference>,
) -> TranslationResult<Option<DomainRef>> {
    reference.map(|r| from_reference(kind, r)).transpose()
}

/// `"<given> <family> (Identifier: <preferred identifier>)"`.
pub fn patient_display(patient: &Patient) -> Option<String> {
    let name = patient.preferred_name().map(|name| {
        [&name.given_name, &name.family_name]
            .into_iter()
            .flatten()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    });
    let identifier = patient.preferred_identifier().map(|i| i.identifier.as_str());
    with_identifier(name, identifier)
}

/// `"<name> (Identifier: <provider identifier>)"`.
pub fn practitioner_display(provider: &Provider) -> Option<String> {
    let name = provider.preferred_name().map(|name| name.full_name());
    with_identifier(name, provider.identifier.as_deref())
}

fn with_identifier(name: Option<String>, identifier: Option<&str>) -> Option<String> {
    let name = name.filter(|n| !n.is_empty());
    let identifier = identifier.map(str::trim).filter(|i| !i.is_empty());
    match (name, identifier) {
        (Some(name), Some(id)) => Some(format!("{name} (Identifier: {id})")),
        (Some(name), None) => Some(name),
        (None, Some(id)) => Some(format!("(Identifier: {id})")),
        (None, None) => None,
    }
}

/// Path segments with any `/_history/<version>` suffix removed.
fn path_segments(raw: &str) -> Vec<&str> {
    let path = match raw.find("/_history/") {
        Some(index) => &raw[..index],
        None => raw,
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_domain::{PatientIdentifier, PersonName};

    const ID: &str = "90a8d1ea-3180-41d9-adb0-70a834d4e0f6";

    fn reference(raw: &str) -> Reference {
        Reference::new(raw)
    }

    #[test]
    fn to_reference_sets_type_and_display() {
        let uuid = Uuid::parse_str(ID).unwrap();
        let r = to_reference(
            ReferenceKind::Patient,
            &DomainRef::with_display(uuid, "Sarah Williams"),
        );
        assert_eq!(r.reference.as_deref(), Some(format!("Patient/{ID}").as_str()));
        assert_eq!(r.type_.as_deref(), Some("Patient"));
        assert_eq!(r.display.as_deref(), Some("Sarah Williams"));
    }

    #[test]
    fn type_comes_from_explicit_type_first() {
        let mut r = reference(&format!("Location/{ID}"));
        r.type_ = Some("Patient".into());
        assert_eq!(reference_type(&r), Some("Patient"));
    }

    #[test]
    fn type_and_id_from_relative_absolute_and_history_forms() {
        for raw in [
            format!("Patient/{ID}"),
            format!("http://example.org/fhir/Patient/{ID}"),
            format!("Patient/{ID}/_history/3"),
        ] {
            let r = reference(&raw);
            assert_eq!(reference_type(&r), Some("Patient"), "{raw}");
            assert_eq!(reference_id(&r), Some(ID), "{raw}");
        }
    }

    #[test]
    fn contained_and_bare_references_have_no_type() {
        let contained = reference("#prov1");
        assert_eq!(reference_type(&contained), None);
        assert_eq!(reference_id(&contained), Some("prov1"));

        let bare = reference(ID);
        assert_eq!(reference_type(&bare), None);
        assert_eq!(reference_id(&bare), Some(ID));

        let urn = reference(&format!("urn:uuid:{ID}"));
        assert_eq!(reference_type(&urn), None);
        assert_eq!(reference_id(&urn), Some(ID));
    }

    #[test]
    fn from_reference_checks_type_and_uuid() {
        let ok = from_reference(ReferenceKind::Patient, &reference(&format!("Patient/{ID}")))
            .expect("valid reference");
        assert_eq!(ok.uuid.to_string(), ID);

        let err = from_reference(ReferenceKind::Patient, &reference(&format!("Location/{ID}")))
            .expect_err("wrong type");
        assert!(matches!(err, TranslationError::InvalidReference(msg) if msg.contains("Location")));

        let err = from_reference(ReferenceKind::Patient, &reference("Patient/123"))
            .expect_err("not a uuid");
        assert!(matches!(err, TranslationError::InvalidReference(msg) if msg.contains("123")));

        let err = from_reference(ReferenceKind::Patient, &Reference::default())
            .expect_err("empty reference");
        assert!(matches!(err, TranslationError::InvalidReference(_)));
    }

    #[test]
    fn from_reference_opt_passes_none_through() {
        assert_eq!(from_reference_opt(ReferenceKind::Encounter, None).unwrap(), None);
    }

    #[test]
    fn patient_display_includes_preferred_identifier() {
        let patient = Patient {
            names: vec![PersonName {
                given_name: Some("Sarah".into()),
                middle_name: Some("Jane".into()),
                family_name: Some("Williams".into()),
                ..Default::default()
            }],
            identifiers: vec![PatientIdentifier {
                identifier: "100-8".into(),
                preferred: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            patient_display(&patient).as_deref(),
            Some("Sarah Williams (Identifier: 100-8)")
        );
        assert_eq!(patient_display(&Patient::default()), None);
    }

    #[test]
    fn practitioner_display_uses_provider_identifier() {
        let provider = Provider {
            identifier: Some("CLIN-1".into()),
            names: vec![PersonName {
                given_name: Some("Jake".into()),
                family_name: Some("Smith".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            practitioner_display(&provider).as_deref(),
            Some("Jake Smith (Identifier: CLIN-1)")
        );
    }
}
