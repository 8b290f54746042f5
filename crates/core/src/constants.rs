//! Code system URLs and extension URLs used throughout the translators.
//!
//! Kept in one place so that every translator emits the same systems and so that the reverse
//! direction recognises exactly what the forward direction produces.

pub const DEFAULT_ENCOUNTER_TYPE_SYSTEM: &str = "http://fhir.openmrs.org/code-system/encounter-type";
pub const DEFAULT_VISIT_TYPE_SYSTEM: &str = "http://fhir.openmrs.org/code-system/visit-type";

pub const IDENTIFIER_LOCATION_EXTENSION: &str =
    "http://fhir.openmrs.org/ext/patient/identifier#location";
pub const DRUG_NAME_EXTENSION: &str = "http://fhir.openmrs.org/ext/medicine#drugName";
pub const DRUG_STRENGTH_EXTENSION: &str = "http://fhir.openmrs.org/ext/medicine#strength";

pub const ACT_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";
pub const DATA_OPERATION_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-DataOperation";
pub const PARTICIPATION_TYPE_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/v3-ParticipationType";
pub const PROVENANCE_PARTICIPANT_TYPE_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/provenance-participant-type";
pub const OBSERVATION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";
pub const OBSERVATION_INTERPRETATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/v3-ObservationInterpretation";
pub const REFERENCE_RANGE_MEANING_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/referencerange-meaning";
pub const ALLERGY_CLINICAL_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/allergyintolerance-clinical";
pub const ALLERGY_VERIFICATION_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/allergyintolerance-verification";
pub const CONDITION_CLINICAL_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub const CONDITION_VERIFICATION_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
/// Platform-owned code system for the absolute (physiologically possible) reference range.
pub const REFERENCE_RANGE_TYPE_SYSTEM: &str = "http://fhir.openmrs.org/code-system/reference-range-type";
pub const LOCATION_TAG_SYSTEM: &str = "http://fhir.openmrs.org/ext/location-tag";
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

/// Prefix for bundle entry `fullUrl`s of resources identified by uuid.
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// Environment variable naming the YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "FHIR_BRIDGE_CONFIG";
