//! The polymorphic [`Resource`] enum and the [`FhirResource`] trait tying each wire struct to
//! its `resourceType`.

use crate::resources::{
    AllergyIntolerance, Bundle, Condition, Encounter, Location, Medication, MedicationRequest,
    Observation, Patient, Practitioner, Provenance,
};
use crate::{FhirError, FhirResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Any resource this crate understands, tagged on `resourceType`.
///
/// Used for top-level parsing, `contained` and bundle entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    AllergyIntolerance(AllergyIntolerance),
    Bundle(Bundle),
    Condition(Condition),
    Encounter(Encounter),
    Location(Location),
    Medication(Medication),
    MedicationRequest(MedicationRequest),
    Observation(Observation),
    Patient(Patient),
    Practitioner(Practitioner),
    Provenance(Provenance),
}

/// A wire struct that corresponds to exactly one `resourceType`.
pub trait FhirResource: Serialize + DeserializeOwned + Sized {
    const RESOURCE_TYPE: &'static str;

    fn id(&self) -> Option<&str>;

    fn into_resource(self) -> Resource;

    /// Unwraps `resource` if it holds this type; otherwise hands it back unchanged.
    fn from_resource(resource: Resource) -> Result<Self, Resource>;
}

macro_rules! fhir_resources {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl FhirResource for $variant {
                const RESOURCE_TYPE: &'static str = stringify!($variant);

                fn id(&self) -> Option<&str> {
                    self.id.as_deref()
                }

                fn into_resource(self) -> Resource {
                    Resource::$variant(self)
                }

                fn from_resource(resource: Resource) -> Result<Self, Resource> {
                    match resource {
                        Resource::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }

            impl From<$variant> for Resource {
                fn from(value: $variant) -> Self {
                    Resource::$variant(value)
                }
            }
        )+

        impl Resource {
            /// The `resourceType` of the wrapped resource.
            pub fn resource_type(&self) -> &'static str {
                match self {
                    $(Resource::$variant(_) => stringify!($variant),)+
                }
            }

            pub fn id(&self) -> Option<&str> {
                match self {
                    $(Resource::$variant(inner) => inner.id.as_deref(),)+
                }
            }

            /// Resource type names this crate can parse.
            pub fn supported_types() -> &'static [&'static str] {
                &[$(stringify!($variant)),+]
            }

            /// Deserialises the body of a resource (with `resourceType` already removed)
            /// as `resource_type`, tracking the path of any failing field.
            pub(crate) fn from_untagged_value(
                resource_type: &str,
                body: serde_json::Value,
            ) -> FhirResult<Self> {
                match resource_type {
                    $(stringify!($variant) => deserialize_tracked::<$variant>(resource_type, body).map(Resource::$variant),)+
                    other => Err(FhirError::InvalidInput(format!(
                        "Unsupported resourceType '{other}'"
                    ))),
                }
            }
        }
    };
}

fhir_resources!(
    AllergyIntolerance,
    Bundle,
    Condition,
    Encounter,
    Location,
    Medication,
    MedicationRequest,
    Observation,
    Patient,
    Practitioner,
    Provenance,
);

/// Deserialises `body` into `T`, reporting the failing path (e.g. `name[0].given`) on error.
pub(crate) fn deserialize_tracked<T: DeserializeOwned>(
    resource_type: &str,
    body: serde_json::Value,
) -> FhirResult<T> {
    match serde_path_to_error::deserialize::<_, T>(body) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(FhirError::Translation(format!(
                "{resource_type} schema mismatch at {path}: {source}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_matches_variant_name() {
        let resource = Resource::from(Patient {
            id: Some("abc".into()),
            ..Default::default()
        });
        assert_eq!(resource.resource_type(), "Patient");
        assert_eq!(resource.id(), Some("abc"));
    }

    #[test]
    fn from_resource_hands_back_other_types() {
        let resource = Resource::from(Location::default());
        let back = Patient::from_resource(resource).expect_err("not a patient");
        assert_eq!(back.resource_type(), "Location");
    }

    #[test]
    fn contained_resources_carry_their_tag() {
        let patient = Patient {
            id: Some("p1".into()),
            contained: vec![Resource::from(Provenance {
                id: Some("prov1".into()),
                ..Default::default()
            })],
            ..Default::default()
        };

        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["contained"][0]["resourceType"], "Provenance");

        let back: Patient = serde_json::from_value(json).unwrap();
        assert_eq!(back, patient);
    }

    #[test]
    fn supported_types_lists_every_variant() {
        assert_eq!(Resource::supported_types().len(), 11);
        assert!(Resource::supported_types().contains(&"MedicationRequest"));
    }
}
