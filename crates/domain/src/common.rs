//! Cross-cutting pieces shared by every domain record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A link from one domain record to another.
///
/// `display` is the human-readable label the linked record would show in a list, for
/// example `"Sarah Williams (Identifier: 100-8)"` for a patient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainRef {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl DomainRef {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            display: None,
        }
    }

    pub fn with_display(uuid: Uuid, display: impl Into<String>) -> Self {
        Self {
            uuid,
            display: Some(display.into()),
        }
    }
}

/// A system user who created or changed a record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRef {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Display name of the person behind the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
}

impl UserRef {
    /// Best label for this user: the person name, then the username, then the uuid.
    pub fn display(&self) -> String {
        self.person_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| self.uuid.to_string())
    }
}

/// Creation and modification metadata carried by every auditable record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<UserRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_changed: Option<DateTime<Utc>>,
}

impl AuditInfo {
    /// The most recent audit timestamp: `date_changed`, else `date_created`.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.date_changed.or(self.date_created)
    }

    pub fn is_empty(&self) -> bool {
        self.creator.is_none()
            && self.date_created.is_none()
            && self.changed_by.is_none()
            && self.date_changed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn last_updated_prefers_date_changed() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let changed = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();

        let mut audit = AuditInfo {
            date_created: Some(created),
            ..Default::default()
        };
        assert_eq!(audit.last_updated(), Some(created));

        audit.date_changed = Some(changed);
        assert_eq!(audit.last_updated(), Some(changed));
    }

    #[test]
    fn user_display_falls_back_to_username_then_uuid() {
        let uuid = Uuid::parse_str("a4f91c6d-3b2e-4c5f-9d7a-1e8b6c0a9f12").unwrap();
        let mut user = UserRef {
            uuid,
            username: Some("admin".into()),
            person_name: Some("Super User".into()),
        };
        assert_eq!(user.display(), "Super User");

        user.person_name = None;
        assert_eq!(user.display(), "admin");

        user.username = None;
        assert_eq!(user.display(), uuid.to_string());
    }

    #[test]
    fn missing_json_fields_take_defaults() {
        let audit: AuditInfo = serde_json::from_str("{}").expect("empty audit");
        assert!(audit.is_empty());
    }
}
