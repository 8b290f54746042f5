//! FHIR R4 resource wire models.

pub mod bundle;
pub mod clinical;
pub mod encounter;
pub mod location;
pub mod medication;
pub mod observation;
pub mod patient;
pub mod provenance;

pub use bundle::{Bundle, BundleEntry};
pub use clinical::{AllergyIntolerance, AllergyIntoleranceReaction, Condition};
pub use encounter::{Encounter, EncounterLocation, EncounterParticipant};
pub use location::Location;
pub use medication::{DispenseRequest, Medication, MedicationRequest};
pub use observation::{Observation, ObservationReferenceRange};
pub use patient::{Patient, Practitioner};
pub use provenance::{Provenance, ProvenanceAgent};
