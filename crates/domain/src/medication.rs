//! Drugs and drug orders.

use crate::common::{AuditInfo, DomainRef};
use crate::concept::Concept;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A formulary entry: a concept with a concrete form and strength.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Drug {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub concept: Concept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage_form: Option<Concept>,
    /// Free-text strength, e.g. `500mg`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    pub retired: bool,
    pub audit: AuditInfo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderAction {
    #[default]
    New,
    Revise,
    Discontinue,
    Renew,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderUrgency {
    #[default]
    Routine,
    Stat,
    OnScheduledDate,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugOrder {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub patient: DomainRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<DomainRef>,
    /// Provider who placed the order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderer: Option<DomainRef>,
    pub concept: Concept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drug: Option<DomainRef>,
    pub action: OrderAction,
    pub urgency: OrderUrgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_activated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_expire_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_stopped: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosing_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_units: Option<Concept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Concept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Concept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_units: Option<Concept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_refills: Option<u32>,
    /// The order this one revises or discontinues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_order: Option<DomainRef>,
    pub voided: bool,
    pub audit: AuditInfo,
}

impl DrugOrder {
    /// True once `date_stopped` has passed at `now`.
    pub fn is_stopped_at(&self, now: DateTime<Utc>) -> bool {
        self.date_stopped.is_some_and(|stopped| stopped <= now)
    }

    /// True once `auto_expire_date` has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.auto_expire_date.is_some_and(|expiry| expiry <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stop_and_expiry_are_inclusive_of_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let order = DrugOrder {
            date_stopped: Some(now),
            auto_expire_date: Some(now + chrono::Duration::days(1)),
            ..Default::default()
        };

        assert!(order.is_stopped_at(now));
        assert!(!order.is_expired_at(now));
        assert!(order.is_expired_at(now + chrono::Duration::days(1)));
    }
}
