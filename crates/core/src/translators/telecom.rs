use crate::config::TranslatorConfig;
use crate::lookup::SharedLookup;
use crate::translator::{non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::TranslationResult;
use bridge_domain::{PersonAttribute, PersonAttributeType};
use fhir::ContactPoint;
use std::sync::Arc;

/// Telephone numbers are person attributes of the configured type.
#[derive(Clone)]
pub struct TelecomTranslator {
    config: Arc<TranslatorConfig>,
    lookup: SharedLookup,
}

impl TelecomTranslator {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        Self { config, lookup }
    }

    /// True for non-voided attributes of the configured telecom type.
    pub fn is_telecom(&self, attribute: &PersonAttribute) -> bool {
        !attribute.voided
            && attribute
                .attribute_type
                .name
                .trim()
                .eq_ignore_ascii_case(self.config.telecom_attribute_type())
    }

    fn attribute_type(&self) -> PersonAttributeType {
        let name = self.config.telecom_attribute_type();
        self.lookup.attribute_type_by_name(name).unwrap_or_else(|| {
            tracing::warn!(attribute_type = name, "telecom attribute type not found in lookup");
            PersonAttributeType {
                name: name.to_string(),
                ..Default::default()
            }
        })
    }
}

impl ToFhirTranslator<PersonAttribute> for TelecomTranslator {
    type Resource = ContactPoint;

    fn to_fhir_resource(&self, attribute: &PersonAttribute) -> TranslationResult<ContactPoint> {
        Ok(ContactPoint {
            id: Some(attribute.uuid.to_string()),
            system: Some("phone".to_string()),
            value: non_blank(Some(attribute.value.as_str())),
            use_: None,
            rank: None,
        })
    }
}

impl ToDomainTranslator<PersonAttribute> for TelecomTranslator {
    type Resource = ContactPoint;

    fn update_domain_type(&self, existing: &mut PersonAttribute, contact: &ContactPoint) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("ContactPoint.id", contact.id.as_deref(), existing.uuid)?;
        existing.value = contact.value.as_deref().unwrap_or_default().trim().to_string();
        if existing.attribute_type.name.is_empty() {
            existing.attribute_type = self.attribute_type();
        }
        Ok(())
    }
}
