//! Encounters and the visits that group them.

use crate::common::{AuditInfo, DomainRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterType {
    pub uuid: Uuid,
    pub name: String,
}

/// A provider taking part in an encounter, with an optional role such as `Clinician`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterProvider {
    pub provider: DomainRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A single interaction between a patient and the care system, e.g. a consultation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encounter {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_type: Option<EncounterType>,
    pub patient: DomainRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<DomainRef>,
    /// The visit this encounter belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit: Option<DomainRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<EncounterProvider>,
    pub voided: bool,
    pub audit: AuditInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitType {
    pub uuid: Uuid,
    pub name: String,
}

/// A period of care (outpatient day, inpatient stay) grouping encounters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visit {
    pub uuid: Uuid,
    /// Required when the visit is published to FHIR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_type: Option<VisitType>,
    pub patient: DomainRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<DomainRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped: Option<DateTime<Utc>>,
    pub voided: bool,
    pub audit: AuditInfo,
}

impl Visit {
    pub fn is_open(&self) -> bool {
        self.stopped.is_none()
    }
}
