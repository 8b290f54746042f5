use crate::constants::URN_UUID_PREFIX;
use crate::translator::ToFhirTranslator;
use crate::TranslationResult;
use fhir::{Bundle, BundleEntry, Resource};
use uuid::Uuid;

const COLLECTION: &str = "collection";

/// Wraps already-translated resources in a `collection` Bundle.
#[derive(Clone, Copy, Debug, Default)]
pub struct BundleTranslator;

impl BundleTranslator {
    /// The resources of every entry, in order. Entries without a resource are skipped.
    pub fn resources(bundle: &Bundle) -> impl Iterator<Item = &Resource> {
        bundle.entry.iter().filter_map(|entry| entry.resource.as_ref())
    }
}

impl ToFhirTranslator<Vec<Resource>> for BundleTranslator {
    type Resource = Bundle;

    fn to_fhir_resource(&self, resources: &Vec<Resource>) -> TranslationResult<Bundle> {
        tracing::debug!(entries = resources.len(), "building collection bundle");

        let entry = resources
            .iter()
            .map(|resource| BundleEntry {
                full_url: resource.id().map(|id| format!("{URN_UUID_PREFIX}{id}")),
                resource: Some(resource.clone()),
            })
            .collect();

        Ok(Bundle {
            id: Some(Uuid::new_v4().to_string()),
            meta: None,
            type_: Some(COLLECTION.to_string()),
            total: None,
            entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: Option<&str>) -> Resource {
        Resource::Location(fhir::Location {
            id: id.map(str::to_string),
            name: Some("Ward 4".into()),
            ..Default::default()
        })
    }

    #[test]
    fn entries_get_urn_uuid_full_urls() {
        let id = Uuid::new_v4().to_string();
        let bundle = BundleTranslator
            .to_fhir_resource(&vec![location(Some(&id)), location(None)])
            .expect("bundle");

        assert_eq!(bundle.type_.as_deref(), Some("collection"));
        assert_eq!(bundle.entry.len(), 2);
        assert_eq!(bundle.entry[0].full_url, Some(format!("urn:uuid:{id}")));
        assert_eq!(bundle.entry[1].full_url, None);
        assert_eq!(BundleTranslator::resources(&bundle).count(), 2);
    }

    #[test]
    fn empty_bundle_has_no_entries() {
        let bundle = BundleTranslator.to_fhir_resource(&Vec::new()).expect("bundle");
        assert!(bundle.entry.is_empty());
        assert!(bundle.id.is_some());
    }
}
