//! Administrative gender: platform single-letter codes to FHIR `AdministrativeGender`.

use crate::translator::{ToDomainTranslator, ToFhirTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::Gender;

#[derive(Clone, Copy, Debug, Default)]
pub struct GenderTranslator;

impl GenderTranslator {
    fn to_wire(gender: Gender) -> &'static str {
        match gender {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }

    fn from_wire(code: &str) -> Option<Gender> {
        match code.trim() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            "unknown" => Some(Gender::Unknown),
            _ => None,
        }
    }
}

impl ToFhirTranslator<Gender> for GenderTranslator {
    type Resource = String;

    fn to_fhir_resource(&self, gender: &Gender) -> TranslationResult<String> {
        Ok(Self::to_wire(*gender).to_string())
    }
}

impl ToDomainTranslator<Option<Gender>> for GenderTranslator {
    type Resource = String;

    fn update_domain_type(&self, existing: &mut Option<Gender>, code: &String) -> TranslationResult<()> {
        let gender = Self::from_wire(code).ok_or_else(|| TranslationError::UnknownCode {
            field: "gender",
            code: code.clone(),
        })?;
        *existing = Some(gender);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_gender_both_ways() {
        for gender in [Gender::Male, Gender::Female, Gender::Other, Gender::Unknown] {
            let code = GenderTranslator.to_fhir_resource(&gender).expect("to fhir");
            let back: Option<Gender> = GenderTranslator.to_domain_type(&code).expect("to domain");
            assert_eq!(back, Some(gender));
        }
        assert_eq!(GenderTranslator.to_fhir_resource(&Gender::Female).unwrap(), "female");
    }

    #[test]
    fn rejects_unknown_code() {
        let err = GenderTranslator
            .to_domain_type(&"F".to_string())
            .expect_err("platform code is not a FHIR code");
        assert!(matches!(err, TranslationError::UnknownCode { field: "gender", .. }));
    }
}
