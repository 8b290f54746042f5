//! Observations (`Obs`): a single recorded clinical fact about a person.

use crate::common::{AuditInfo, DomainRef};
use crate::concept::Concept;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The recorded value. Which variant is used follows the concept's datatype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ObsValue {
    Numeric(f64),
    Text(String),
    Coded(Concept),
    Boolean(bool),
    Datetime(DateTime<Utc>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObsStatus {
    Preliminary,
    #[default]
    Final,
    Amended,
}

/// How a result compares to its reference range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObsInterpretation {
    Normal,
    Abnormal,
    CriticallyAbnormal,
    High,
    CriticallyHigh,
    Low,
    CriticallyLow,
    OffScaleHigh,
    OffScaleLow,
    SignificantChangeDown,
    SignificantChangeUp,
    Susceptible,
    Resistant,
    Intermediate,
    Positive,
    Negative,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Obs {
    pub uuid: Uuid,
    pub person: DomainRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<DomainRef>,
    pub concept: Concept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obs_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ObsValue>,
    pub status: ObsStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<ObsInterpretation>,
    /// Child observations when this obs is a group (e.g. a blood pressure panel).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_members: Vec<DomainRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub voided: bool,
    pub audit: AuditInfo,
}

impl Obs {
    pub fn is_group(&self) -> bool {
        !self.group_members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_tagged_with_its_type() {
        let json = serde_json::to_value(ObsValue::Numeric(37.5)).unwrap();
        assert_eq!(json["type"], "numeric");
        assert_eq!(json["value"], 37.5);
    }

    #[test]
    fn status_defaults_to_final() {
        let obs: Obs = serde_json::from_str("{}").unwrap();
        assert_eq!(obs.status, ObsStatus::Final);
        assert!(!obs.is_group());
    }
}
