//! Domain <-> FHIR translators.
//!
//! Leaf translators handle one datatype (a name, an address, a concept); resource translators
//! compose them into whole resources. [`Translators`] builds the full set from one
//! configuration and one lookup and dispatches on record kind or `resourceType`.

pub mod address;
pub mod allergy;
pub mod birthdate;
pub mod bundle;
pub mod concept;
pub mod condition;
pub mod encounter;
pub mod gender;
pub mod identifier;
pub mod location;
pub mod medication;
pub mod medication_request;
pub mod name;
pub mod observation;
pub mod patient;
pub mod practitioner;
pub mod provenance;
pub mod telecom;
pub mod visit;

pub use allergy::AllergyTranslator;
pub use bundle::BundleTranslator;
pub use concept::ConceptTranslator;
pub use condition::ConditionTranslator;
pub use encounter::EncounterTranslator;
pub use location::LocationTranslator;
pub use medication::MedicationTranslator;
pub use medication_request::MedicationRequestTranslator;
pub use observation::ObservationTranslator;
pub use patient::PatientTranslator;
pub use practitioner::PractitionerTranslator;
pub use provenance::ProvenanceTranslator;
pub use visit::VisitTranslator;

use crate::config::TranslatorConfig;
use crate::lookup::SharedLookup;
use crate::translator::{ToDomainTranslator, ToFhirTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::{Allergy, Condition, Drug, DrugOrder, Encounter, Location, Obs, Patient, Provider, Visit};
use fhir::Resource;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The kinds of domain record that can be translated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Patient,
    Provider,
    Location,
    Encounter,
    Visit,
    Obs,
    Drug,
    DrugOrder,
    Allergy,
    Condition,
}

impl RecordKind {
    pub const ALL: [RecordKind; 10] = [
        RecordKind::Patient,
        RecordKind::Provider,
        RecordKind::Location,
        RecordKind::Encounter,
        RecordKind::Visit,
        RecordKind::Obs,
        RecordKind::Drug,
        RecordKind::DrugOrder,
        RecordKind::Allergy,
        RecordKind::Condition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Patient => "patient",
            RecordKind::Provider => "provider",
            RecordKind::Location => "location",
            RecordKind::Encounter => "encounter",
            RecordKind::Visit => "visit",
            RecordKind::Obs => "obs",
            RecordKind::Drug => "drug",
            RecordKind::DrugOrder => "drug_order",
            RecordKind::Allergy => "allergy",
            RecordKind::Condition => "condition",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| TranslationError::InvalidInput(format!("unknown record kind '{s}'")))
    }
}

/// A domain record of any kind, serialised as `{"kind": ..., "record": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum DomainRecord {
    Patient(Patient),
    Provider(Provider),
    Location(Location),
    Encounter(Encounter),
    Visit(Visit),
    Obs(Obs),
    Drug(Drug),
    DrugOrder(DrugOrder),
    Allergy(Allergy),
    Condition(Condition),
}

impl DomainRecord {
    /// Parse the bare JSON of a record of `kind`.
    pub fn from_value(kind: RecordKind, value: serde_json::Value) -> TranslationResult<Self> {
        fn parse<T: serde::de::DeserializeOwned>(
            kind: RecordKind,
            value: serde_json::Value,
        ) -> TranslationResult<T> {
            serde_json::from_value(value).map_err(|source| TranslationError::InvalidRecord {
                kind: kind.as_str(),
                source,
            })
        }

        Ok(match kind {
            RecordKind::Patient => DomainRecord::Patient(parse(kind, value)?),
            RecordKind::Provider => DomainRecord::Provider(parse(kind, value)?),
            RecordKind::Location => DomainRecord::Location(parse(kind, value)?),
            RecordKind::Encounter => DomainRecord::Encounter(parse(kind, value)?),
            RecordKind::Visit => DomainRecord::Visit(parse(kind, value)?),
            RecordKind::Obs => DomainRecord::Obs(parse(kind, value)?),
            RecordKind::Drug => DomainRecord::Drug(parse(kind, value)?),
            RecordKind::DrugOrder => DomainRecord::DrugOrder(parse(kind, value)?),
            RecordKind::Allergy => DomainRecord::Allergy(parse(kind, value)?),
            RecordKind::Condition => DomainRecord::Condition(parse(kind, value)?),
        })
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            DomainRecord::Patient(_) => RecordKind::Patient,
            DomainRecord::Provider(_) => RecordKind::Provider,
            DomainRecord::Location(_) => RecordKind::Location,
            DomainRecord::Encounter(_) => RecordKind::Encounter,
            DomainRecord::Visit(_) => RecordKind::Visit,
            DomainRecord::Obs(_) => RecordKind::Obs,
            DomainRecord::Drug(_) => RecordKind::Drug,
            DomainRecord::DrugOrder(_) => RecordKind::DrugOrder,
            DomainRecord::Allergy(_) => RecordKind::Allergy,
            DomainRecord::Condition(_) => RecordKind::Condition,
        }
    }
}

/// Every resource translator, built from one configuration and one lookup.
#[derive(Clone)]
pub struct Translators {
    patient: PatientTranslator,
    practitioner: PractitionerTranslator,
    location: LocationTranslator,
    encounter: EncounterTranslator,
    visit: VisitTranslator,
    observation: ObservationTranslator,
    medication: MedicationTranslator,
    medication_request: MedicationRequestTranslator,
    allergy: AllergyTranslator,
    condition: ConditionTranslator,
}

impl Translators {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        Self {
            patient: PatientTranslator::new(config.clone(), lookup.clone()),
            practitioner: PractitionerTranslator::new(config.clone()),
            location: LocationTranslator::new(config.clone()),
            encounter: EncounterTranslator::new(config.clone()),
            visit: VisitTranslator::new(config.clone()),
            observation: ObservationTranslator::new(config.clone(), lookup.clone()),
            medication: MedicationTranslator::new(config.clone(), lookup.clone()),
            medication_request: MedicationRequestTranslator::new(config.clone(), lookup.clone()),
            allergy: AllergyTranslator::new(config.clone(), lookup.clone()),
            condition: ConditionTranslator::new(config, lookup),
        }
    }

    /// Translate one domain record into its FHIR resource.
    pub fn to_fhir(&self, record: &DomainRecord) -> TranslationResult<Resource> {
        Ok(match record {
            DomainRecord::Patient(r) => self.patient.to_fhir_resource(r)?.into(),
            DomainRecord::Provider(r) => self.practitioner.to_fhir_resource(r)?.into(),
            DomainRecord::Location(r) => self.location.to_fhir_resource(r)?.into(),
            DomainRecord::Encounter(r) => self.encounter.to_fhir_resource(r)?.into(),
            DomainRecord::Visit(r) => self.visit.to_fhir_resource(r)?.into(),
            DomainRecord::Obs(r) => self.observation.to_fhir_resource(r)?.into(),
            DomainRecord::Drug(r) => self.medication.to_fhir_resource(r)?.into(),
            DomainRecord::DrugOrder(r) => self.medication_request.to_fhir_resource(r)?.into(),
            DomainRecord::Allergy(r) => self.allergy.to_fhir_resource(r)?.into(),
            DomainRecord::Condition(r) => self.condition.to_fhir_resource(r)?.into(),
        })
    }

    /// Translate several records into a `collection` Bundle.
    pub fn to_fhir_bundle(&self, records: &[DomainRecord]) -> TranslationResult<fhir::Bundle> {
        let resources = records
            .iter()
            .map(|record| self.to_fhir(record))
            .collect::<TranslationResult<Vec<_>>>()?;
        BundleTranslator.to_fhir_resource(&resources)
    }

    /// Translate a FHIR resource into domain records.
    ///
    /// A Bundle yields one record per entry; any other resource yields exactly one. An
    /// `Encounter` carrying a visit-type coding becomes a [`Visit`].
    pub fn to_domain(&self, resource: &Resource) -> TranslationResult<Vec<DomainRecord>> {
        let record = match resource {
            Resource::Bundle(bundle) => {
                let mut records = Vec::with_capacity(bundle.entry.len());
                for entry in BundleTranslator::resources(bundle) {
                    records.extend(self.to_domain(entry)?);
                }
                return Ok(records);
            }
            Resource::Patient(r) => DomainRecord::Patient(self.patient.to_domain_type(r)?),
            Resource::Practitioner(r) => DomainRecord::Provider(self.practitioner.to_domain_type(r)?),
            Resource::Location(r) => DomainRecord::Location(self.location.to_domain_type(r)?),
            Resource::Encounter(r) if self.visit.is_visit(r) => {
                DomainRecord::Visit(self.visit.to_domain_type(r)?)
            }
            Resource::Encounter(r) => DomainRecord::Encounter(self.encounter.to_domain_type(r)?),
            Resource::Observation(r) => DomainRecord::Obs(self.observation.to_domain_type(r)?),
            Resource::Medication(r) => DomainRecord::Drug(self.medication.to_domain_type(r)?),
            Resource::MedicationRequest(r) => {
                DomainRecord::DrugOrder(self.medication_request.to_domain_type(r)?)
            }
            Resource::AllergyIntolerance(r) => DomainRecord::Allergy(self.allergy.to_domain_type(r)?),
            Resource::Condition(r) => DomainRecord::Condition(self.condition.to_domain_type(r)?),
            Resource::Provenance(_) => {
                return Err(TranslationError::InvalidInput(
                    "Provenance has no domain counterpart".into(),
                ))
            }
        };
        tracing::debug!(
            resource_type = resource.resource_type(),
            kind = %record.kind(),
            "translated resource to domain"
        );
        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryLookup;
    use serde_json::json;
    use uuid::Uuid;

    fn translators() -> Translators {
        Translators::new(
            Arc::new(TranslatorConfig::default().with_contain_provenance(false)),
            InMemoryLookup::new().into_shared(),
        )
    }

    #[test]
    fn record_kind_parses_loosely() {
        assert_eq!("drug-order".parse::<RecordKind>().expect("kind"), RecordKind::DrugOrder);
        assert_eq!(" Patient ".parse::<RecordKind>().expect("kind"), RecordKind::Patient);
        let err = "practitioner".parse::<RecordKind>().expect_err("not a kind");
        assert!(matches!(err, TranslationError::InvalidInput(_)));
    }

    #[test]
    fn malformed_record_names_its_kind() {
        let err = DomainRecord::from_value(RecordKind::Location, json!({"name": 42}))
            .expect_err("name must be a string");
        assert!(matches!(err, TranslationError::InvalidRecord { kind: "location", .. }));
    }

    #[test]
    fn visit_and_encounter_are_told_apart() {
        let translators = translators();
        let patient = Uuid::new_v4();
        let visit = DomainRecord::from_value(
            RecordKind::Visit,
            json!({
                "uuid": Uuid::new_v4(),
                "visit_type": {"uuid": Uuid::new_v4(), "name": "Outpatient"},
                "patient": {"uuid": patient},
            }),
        )
        .expect("visit record");
        let encounter = DomainRecord::from_value(
            RecordKind::Encounter,
            json!({"uuid": Uuid::new_v4(), "patient": {"uuid": patient}}),
        )
        .expect("encounter record");

        let bundle = translators
            .to_fhir_bundle(&[visit.clone(), encounter.clone()])
            .expect("bundle");
        assert_eq!(bundle.entry.len(), 2);

        let back = translators
            .to_domain(&Resource::Bundle(bundle))
            .expect("to domain");
        let kinds: Vec<RecordKind> = back.iter().map(DomainRecord::kind).collect();
        assert_eq!(kinds, vec![RecordKind::Visit, RecordKind::Encounter]);
        assert_eq!(back[0], visit);
        assert_eq!(back[1], encounter);
    }

    #[test]
    fn untyped_visit_is_not_published_as_an_encounter() {
        let visit = DomainRecord::from_value(
            RecordKind::Visit,
            json!({"uuid": Uuid::new_v4(), "patient": {"uuid": Uuid::new_v4()}}),
        )
        .expect("visit record");

        let err = translators().to_fhir(&visit).expect_err("visit type missing");
        assert!(matches!(err, TranslationError::MissingElement("Visit.visitType")));
        let err = translators().to_fhir_bundle(&[visit]).expect_err("visit type missing");
        assert!(matches!(err, TranslationError::MissingElement("Visit.visitType")));
    }

    #[test]
    fn provenance_cannot_become_a_record() {
        let err = translators()
            .to_domain(&Resource::Provenance(fhir::Provenance::default()))
            .expect_err("provenance");
        assert!(matches!(err, TranslationError::InvalidInput(_)));
    }

    #[test]
    fn records_serialise_with_their_kind() {
        let record = DomainRecord::Location(Location {
            uuid: Uuid::new_v4(),
            name: "Ward 4".into(),
            ..Default::default()
        });
        let value = serde_json::to_value(&record).expect("serialise");
        assert_eq!(value["kind"], "location");
        assert_eq!(value["record"]["name"], "Ward 4");
    }
}
