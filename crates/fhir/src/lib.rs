//! FHIR R4 wire/boundary support.
//!
//! This crate provides **wire models** for the FHIR R4 resources the bridge translates to
//! and from, plus strict JSON parse/render helpers.
//!
//! This crate focuses on:
//! - faithful JSON shape (camelCase element names, `resourceType` tagging, `value[x]` choices)
//! - strict deserialisation: unknown elements are rejected and the failing path is reported
//! - nothing else; mapping to and from domain records lives in `bridge-core`

pub mod datatypes;
pub mod resource;
pub mod resources;

pub use datatypes::{
    Address, Annotation, CodeableConcept, Coding, ContactPoint, DoseAndRate, Dosage, Extension,
    HumanName, Identifier, Meta, Period, Quantity, Reference, Timing,
};
pub use resource::{FhirResource, Resource};
pub use resources::{
    AllergyIntolerance, AllergyIntoleranceReaction, Bundle, BundleEntry, Condition,
    DispenseRequest, Encounter, EncounterLocation, EncounterParticipant, Location, Medication,
    MedicationRequest, Observation, ObservationReferenceRange, Patient, Practitioner, Provenance,
    ProvenanceAgent,
};

use serde::Serialize;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// FHIR JSON parse/render operations.
///
/// This is a zero-sized type used for namespacing. All methods are associated functions.
pub struct Fhir;

impl Fhir {
    /// Parse any supported resource from JSON text.
    ///
    /// The `resourceType` element selects the wire struct; the remaining elements are then
    /// deserialised strictly, with `serde_path_to_error` surfacing the failing path.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the text is not a JSON object,
    /// - `resourceType` is missing or names an unsupported resource,
    /// - any element has an unexpected type or is unknown.
    pub fn parse_any(json_text: &str) -> FhirResult<Resource> {
        let (resource_type, body) = split_resource_type(json_text)?;
        Resource::from_untagged_value(&resource_type, body)
    }

    /// Parse a resource of a known type from JSON text.
    ///
    /// # Errors
    ///
    /// As [`Fhir::parse_any`], and additionally [`FhirError::InvalidInput`] when the
    /// `resourceType` is not `T::RESOURCE_TYPE`.
    pub fn parse<T: FhirResource>(json_text: &str) -> FhirResult<T> {
        let (resource_type, body) = split_resource_type(json_text)?;
        if resource_type != T::RESOURCE_TYPE {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType '{}', got '{}'",
                T::RESOURCE_TYPE,
                resource_type
            )));
        }
        resource::deserialize_tracked(&resource_type, body)
    }

    /// Render a resource as pretty-printed JSON, with `resourceType` as the first element.
    pub fn render<T: FhirResource>(resource: &T) -> FhirResult<String> {
        let tagged = Tagged {
            resource_type: T::RESOURCE_TYPE,
            resource,
        };
        serde_json::to_string_pretty(&tagged)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise {}: {e}", T::RESOURCE_TYPE)))
    }

    /// Render a resource as a JSON value, with `resourceType` set.
    pub fn to_value<T: FhirResource>(resource: &T) -> FhirResult<serde_json::Value> {
        let tagged = Tagged {
            resource_type: T::RESOURCE_TYPE,
            resource,
        };
        Ok(serde_json::to_value(&tagged)?)
    }

    /// Render an already-wrapped [`Resource`] as pretty-printed JSON.
    pub fn render_resource(resource: &Resource) -> FhirResult<String> {
        serde_json::to_string_pretty(resource).map_err(|e| {
            FhirError::Translation(format!(
                "Failed to serialise {}: {e}",
                resource.resource_type()
            ))
        })
    }
}

#[derive(Serialize)]
struct Tagged<'a, T: Serialize> {
    #[serde(rename = "resourceType")]
    resource_type: &'static str,
    #[serde(flatten)]
    resource: &'a T,
}

/// Splits the `resourceType` element off a JSON object, returning it with the remaining body.
fn split_resource_type(json_text: &str) -> FhirResult<(String, serde_json::Value)> {
    let mut value: serde_json::Value = serde_json::from_str(json_text)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| FhirError::InvalidInput("FHIR resource must be a JSON object".into()))?;

    let resource_type = match object.remove("resourceType") {
        Some(serde_json::Value::String(rt)) => rt,
        Some(other) => {
            return Err(FhirError::InvalidInput(format!(
                "resourceType must be a string, got {other}"
            )))
        }
        None => return Err(FhirError::InvalidInput("missing resourceType".into())),
    };

    Ok((resource_type, value))
}
