//! # Bridge domain model
//!
//! Record types of the host EHR platform, reduced to the fields the FHIR translators read
//! and write.
//!
//! Records link to one another through [`DomainRef`] rather than owning each other, so an
//! encounter carries the patient's uuid and display text, not the whole patient. Every record
//! derives serde so that the CLI can read and write it as JSON; missing fields fall back to
//! their defaults.

pub mod allergy;
pub mod common;
pub mod concept;
pub mod condition;
pub mod encounter;
pub mod location;
pub mod medication;
pub mod obs;
pub mod person;

pub use allergy::{Allergen, AllergenType, Allergy, AllergyReaction};
pub use common::{AuditInfo, DomainRef, UserRef};
pub use concept::{Concept, ConceptDatatype, ConceptMapType, ConceptMapping, ConceptNumeric};
pub use condition::{
    CodedOrFreeText, Condition, ConditionClinicalStatus, ConditionVerificationStatus,
};
pub use encounter::{Encounter, EncounterProvider, EncounterType, Visit, VisitType};
pub use location::Location;
pub use medication::{Drug, DrugOrder, OrderAction, OrderUrgency};
pub use obs::{Obs, ObsInterpretation, ObsStatus, ObsValue};
pub use person::{
    Gender, Patient, PatientIdentifier, PatientIdentifierType, PersonAddress, PersonAttribute,
    PersonAttributeType, PersonName, Provider,
};

pub use uuid::Uuid;
