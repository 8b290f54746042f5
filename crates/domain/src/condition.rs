use crate::common::{AuditInfo, DomainRef};
use crate::concept::Concept;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value that is either a dictionary concept or free text entered by the user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodedOrFreeText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coded: Option<Concept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_coded: Option<String>,
}

impl CodedOrFreeText {
    pub fn is_empty(&self) -> bool {
        self.coded.is_none() && self.non_coded.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionClinicalStatus {
    #[default]
    Active,
    Inactive,
    HistoryOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionVerificationStatus {
    Provisional,
    Confirmed,
}

/// An entry on the patient's problem list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub uuid: Uuid,
    pub patient: DomainRef,
    pub condition: CodedOrFreeText,
    pub clinical_status: ConditionClinicalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<ConditionVerificationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_detail: Option<String>,
    pub voided: bool,
    pub audit: AuditInfo,
}
