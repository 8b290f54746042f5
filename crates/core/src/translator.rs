//! The two-method translator contract every component implements.
//!
//! A translator converts one domain shape into one FHIR shape (`ToFhirTranslator`) and,
//! where the reverse makes sense, applies a FHIR shape onto a domain object
//! (`ToDomainTranslator`). Absent input always gives absent output.

use crate::datetime::format_date_time;
use crate::{TranslationError, TranslationResult};
use bridge_domain::AuditInfo;
use bridge_types::ResourceId;
use fhir::Meta;
use uuid::Uuid;

/// Domain to FHIR.
pub trait ToFhirTranslator<D> {
    type Resource;

    fn to_fhir_resource(&self, domain: &D) -> TranslationResult<Self::Resource>;

    /// `None` in, `None` out.
    fn to_fhir_resource_opt(&self, domain: Option<&D>) -> TranslationResult<Option<Self::Resource>> {
        domain.map(|d| self.to_fhir_resource(d)).transpose()
    }
}

/// FHIR to domain.
///
/// Implementors only write [`update_domain_type`](Self::update_domain_type); the
/// constructing forms start from `D::default()` and apply the resource onto it.
pub trait ToDomainTranslator<D> {
    type Resource;

    /// Apply `resource` onto `existing`, keeping whatever the resource does not carry.
    fn update_domain_type(&self, existing: &mut D, resource: &Self::Resource) -> TranslationResult<()>;

    fn to_domain_type(&self, resource: &Self::Resource) -> TranslationResult<D>
    where
        D: Default,
    {
        let mut domain = D::default();
        self.update_domain_type(&mut domain, resource)?;
        Ok(domain)
    }

    /// `None` in, `None` out.
    fn to_domain_type_opt(&self, resource: Option<&Self::Resource>) -> TranslationResult<Option<D>>
    where
        D: Default,
    {
        resource.map(|r| self.to_domain_type(r)).transpose()
    }
}

/// Resolve the uuid of a domain object from a FHIR logical id.
///
/// A present id must be a legal FHIR id and a uuid. A missing id keeps `existing`, or mints a
/// fresh v4 uuid when `existing` is still nil.
pub(crate) fn resolve_uuid(
    field: &'static str,
    id: Option<&str>,
    existing: Uuid,
) -> TranslationResult<Uuid> {
    match id {
        Some(id) => {
            let id = ResourceId::parse(id.trim())
                .map_err(|source| TranslationError::InvalidResourceId { field, source })?;
            Uuid::parse_str(id.as_str()).map_err(|_| TranslationError::InvalidUuid {
                field,
                value: id.to_string(),
            })
        }
        None if existing.is_nil() => Ok(Uuid::new_v4()),
        None => Ok(existing),
    }
}

/// `meta.lastUpdated` from the record's audit trail.
pub(crate) fn meta_from_audit(audit: &AuditInfo) -> Option<Meta> {
    audit.last_updated().map(|updated| Meta {
        last_updated: Some(format_date_time(&updated)),
        ..Default::default()
    })
}

/// Trimmed copy of `value`, or `None` when blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Index of the element in `items` whose uuid equals the FHIR element id.
pub(crate) fn position_by_id<T>(
    items: &[T],
    id: Option<&str>,
    uuid_of: impl Fn(&T) -> Uuid,
) -> Option<usize> {
    let id = Uuid::parse_str(id?.trim()).ok()?;
    items.iter().position(|item| uuid_of(item) == id)
}

/// Apply `incoming` FHIR list elements onto `existing` domain elements.
///
/// An element whose id matches the uuid of an existing element updates it in place; any
/// other element is translated fresh and appended.
pub(crate) fn merge_by_uuid<D, R, T>(
    translator: &T,
    existing: &mut Vec<D>,
    incoming: &[R],
    id_of: impl Fn(&R) -> Option<&str>,
    uuid_of: impl Fn(&D) -> Uuid,
) -> TranslationResult<()>
where
    D: Default,
    T: ToDomainTranslator<D, Resource = R>,
{
    for element in incoming {
        match position_by_id(existing, id_of(element), &uuid_of) {
            Some(index) => translator.update_domain_type(&mut existing[index], element)?,
            None => existing.push(translator.to_domain_type(element)?),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct Upper;

    impl ToFhirTranslator<String> for Upper {
        type Resource = String;

        fn to_fhir_resource(&self, domain: &String) -> TranslationResult<String> {
            Ok(domain.to_uppercase())
        }
    }

    impl ToDomainTranslator<String> for Upper {
        type Resource = String;

        fn update_domain_type(&self, existing: &mut String, resource: &String) -> TranslationResult<()> {
            *existing = resource.to_lowercase();
            Ok(())
        }
    }

    #[test]
    fn none_in_none_out() {
        assert_eq!(Upper.to_fhir_resource_opt(None).unwrap(), None);
        assert_eq!(Upper.to_domain_type_opt(None).unwrap(), None);
    }

    #[test]
    fn to_domain_type_starts_from_default() {
        let domain = Upper.to_domain_type(&"ABC".to_string()).expect("translate");
        assert_eq!(domain, "abc");
        let fhir = Upper.to_fhir_resource_opt(Some(&domain)).expect("translate");
        assert_eq!(fhir.as_deref(), Some("ABC"));
    }

    #[test]
    fn resolve_uuid_rejects_non_uuid_ids() {
        let err = resolve_uuid("Patient.id", Some("abc"), Uuid::nil()).expect_err("not a uuid");
        assert!(matches!(err, TranslationError::InvalidUuid { field: "Patient.id", .. }));
    }

    #[test]
    fn resolve_uuid_rejects_illegal_ids() {
        let err = resolve_uuid("Patient.id", Some("Patient/123"), Uuid::nil()).expect_err("illegal id");
        assert!(matches!(
            err,
            TranslationError::InvalidResourceId { field: "Patient.id", .. }
        ));
    }

    #[test]
    fn resolve_uuid_keeps_existing_or_mints_new() {
        let existing = Uuid::new_v4();
        assert_eq!(resolve_uuid("id", None, existing).unwrap(), existing);
        assert!(!resolve_uuid("id", None, Uuid::nil()).unwrap().is_nil());
    }

    #[test]
    fn meta_uses_last_updated() {
        let audit = AuditInfo {
            date_created: Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()),
            ..Default::default()
        };
        let meta = meta_from_audit(&audit).expect("meta");
        assert_eq!(meta.last_updated.as_deref(), Some("2024-05-01T08:00:00Z"));
        assert!(meta_from_audit(&AuditInfo::default()).is_none());
    }

    #[test]
    fn position_by_id_matches_uuid() {
        let ids = [Uuid::new_v4(), Uuid::new_v4()];
        let target = ids[1].to_string();
        assert_eq!(position_by_id(&ids, Some(&target), |u| *u), Some(1));
        assert_eq!(position_by_id(&ids, Some("nope"), |u| *u), None);
        assert_eq!(position_by_id(&ids, None, |u| *u), None);
    }
}
