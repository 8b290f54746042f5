//! Birth dates, which the platform may record as estimated.

use crate::datetime::{format_date, parse_date, DatePrecision};
use crate::translator::{ToDomainTranslator, ToFhirTranslator};
use crate::TranslationResult;
use chrono::NaiveDate;

/// A birth date with the platform's "estimated" flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BirthDate {
    pub date: Option<NaiveDate>,
    pub estimated: bool,
}

impl BirthDate {
    pub fn exact(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            estimated: false,
        }
    }
}

/// Estimated dates go out at year precision; FHIR has no other way to say "about".
#[derive(Clone, Copy, Debug, Default)]
pub struct BirthDateTranslator;

impl ToFhirTranslator<BirthDate> for BirthDateTranslator {
    type Resource = Option<String>;

    fn to_fhir_resource(&self, birthdate: &BirthDate) -> TranslationResult<Option<String>> {
        let precision = if birthdate.estimated {
            DatePrecision::Year
        } else {
            DatePrecision::Day
        };
        Ok(birthdate.date.map(|date| format_date(&date, precision)))
    }
}

impl ToDomainTranslator<BirthDate> for BirthDateTranslator {
    type Resource = String;

    fn update_domain_type(&self, existing: &mut BirthDate, value: &String) -> TranslationResult<()> {
        let (date, precision) = parse_date("birthDate", value)?;
        existing.date = Some(date);
        existing.estimated = precision != DatePrecision::Day;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TranslationError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn exact_dates_use_day_precision() {
        let out = BirthDateTranslator
            .to_fhir_resource(&BirthDate::exact(date(1992, 3, 20)))
            .expect("to fhir");
        assert_eq!(out.as_deref(), Some("1992-03-20"));
    }

    #[test]
    fn estimated_dates_use_year_precision() {
        let birthdate = BirthDate {
            date: Some(date(1992, 3, 20)),
            estimated: true,
        };
        let out = BirthDateTranslator.to_fhir_resource(&birthdate).expect("to fhir");
        assert_eq!(out.as_deref(), Some("1992"));
    }

    #[test]
    fn missing_date_gives_no_element() {
        let out = BirthDateTranslator
            .to_fhir_resource(&BirthDate::default())
            .expect("to fhir");
        assert_eq!(out, None);
    }

    #[test]
    fn partial_dates_are_marked_estimated() {
        let parsed = BirthDateTranslator
            .to_domain_type(&"1992-03".to_string())
            .expect("to domain");
        assert_eq!(parsed.date, Some(date(1992, 3, 1)));
        assert!(parsed.estimated);

        let parsed = BirthDateTranslator
            .to_domain_type(&"1992-03-20".to_string())
            .expect("to domain");
        assert!(!parsed.estimated);
    }

    #[test]
    fn rejects_malformed_dates() {
        let err = BirthDateTranslator
            .to_domain_type(&"20/03/1992".to_string())
            .expect_err("not a FHIR date");
        assert!(matches!(err, TranslationError::InvalidDate { field: "birthDate", .. }));
    }
}
