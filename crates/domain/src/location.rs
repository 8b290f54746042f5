use crate::common::{AuditInfo, DomainRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical place where care is delivered (facility, ward, room).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub uuid: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_village: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Enclosing location, e.g. the hospital a ward belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<DomainRef>,
    /// Location tags such as `Login Location` or `Visit Location`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub retired: bool,
    pub audit: AuditInfo,
}

impl Location {
    pub fn has_address(&self) -> bool {
        [
            &self.address1,
            &self.address2,
            &self.city_village,
            &self.county_district,
            &self.state_province,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .any(|field| field.is_some())
    }
}
