//! FHIR `date` / `dateTime` / `instant` conversions.
//!
//! FHIR dates may be partial (`2024`, `2024-03`). The platform stores full dates plus an
//! "estimated" flag, so partial values are expanded to the first day of the period and
//! reported as imprecise.

use crate::{TranslationError, TranslationResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Precision of a parsed FHIR date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// Render an instant as a FHIR `dateTime` (`2024-03-20T10:15:00Z`).
pub fn format_date_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render a date at the requested precision.
pub fn format_date(value: &NaiveDate, precision: DatePrecision) -> String {
    match precision {
        DatePrecision::Year => format!("{:04}", value.year()),
        DatePrecision::Month => format!("{:04}-{:02}", value.year(), value.month()),
        DatePrecision::Day => value.format("%Y-%m-%d").to_string(),
    }
}

/// Parse a FHIR `date` (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
pub fn parse_date(field: &'static str, value: &str) -> TranslationResult<(NaiveDate, DatePrecision)> {
    let invalid = || TranslationError::InvalidDate {
        field,
        value: value.to_string(),
    };

    let parts: Vec<&str> = value.trim().split('-').collect();
    let number = |s: &str| {
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse::<u32>().map_err(|_| invalid())
    };

    let (year, month, day, precision) = match parts.as_slice() {
        [y] if y.len() == 4 => (number(y)?, 1, 1, DatePrecision::Year),
        [y, m] if y.len() == 4 && m.len() == 2 => (number(y)?, number(m)?, 1, DatePrecision::Month),
        [y, m, d] if y.len() == 4 && m.len() == 2 && d.len() == 2 => {
            (number(y)?, number(m)?, number(d)?, DatePrecision::Day)
        }
        _ => return Err(invalid()),
    };

    let year = i32::try_from(year).map_err(|_| invalid())?;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    Ok((date, precision))
}

/// Parse a FHIR `dateTime` or `instant`.
///
/// Accepts RFC 3339 with an offset, a local timestamp without offset (read as UTC), or a
/// partial date (midnight UTC at the start of the period).
pub fn parse_date_time(field: &'static str, value: &str) -> TranslationResult<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    let (date, _) = parse_date(field, trimmed)?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| TranslationError::InvalidDate {
        field,
        value: value.to_string(),
    })?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// `Option`-lifting form of [`parse_date_time`].
pub fn parse_optional_date_time(
    field: &'static str,
    value: Option<&str>,
) -> TranslationResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_date_time(field, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_date_time_in_utc_with_z() {
        let value = Utc.with_ymd_and_hms(2024, 3, 20, 10, 15, 0).unwrap();
        assert_eq!(format_date_time(&value), "2024-03-20T10:15:00Z");
    }

    #[test]
    fn formats_date_at_each_precision() {
        let date = NaiveDate::from_ymd_opt(1992, 3, 20).unwrap();
        assert_eq!(format_date(&date, DatePrecision::Year), "1992");
        assert_eq!(format_date(&date, DatePrecision::Month), "1992-03");
        assert_eq!(format_date(&date, DatePrecision::Day), "1992-03-20");
    }

    #[test]
    fn parses_partial_dates() {
        let (date, precision) = parse_date("birthDate", "1992").expect("year");
        assert_eq!(date, NaiveDate::from_ymd_opt(1992, 1, 1).unwrap());
        assert_eq!(precision, DatePrecision::Year);

        let (date, precision) = parse_date("birthDate", "1992-03").expect("month");
        assert_eq!(date, NaiveDate::from_ymd_opt(1992, 3, 1).unwrap());
        assert_eq!(precision, DatePrecision::Month);

        let (_, precision) = parse_date("birthDate", "1992-03-20").expect("day");
        assert_eq!(precision, DatePrecision::Day);
    }

    #[test]
    fn rejects_impossible_dates() {
        for bad in ["1992-02-30", "92-03-20", "1992-3-20", "yesterday", ""] {
            let err = parse_date("birthDate", bad).expect_err(bad);
            assert!(matches!(err, TranslationError::InvalidDate { field: "birthDate", .. }));
        }
    }

    #[test]
    fn rejects_signed_date_parts() {
        for bad in ["+199", "1992-+3", "1992-03-+1"] {
            let err = parse_date("birthDate", bad).expect_err(bad);
            assert!(matches!(err, TranslationError::InvalidDate { field: "birthDate", .. }));
        }
        assert!(parse_date_time("effectiveDateTime", "+199").is_err());
    }

    #[test]
    fn parses_date_times_with_and_without_offset() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 20, 8, 15, 0).unwrap();
        assert_eq!(
            parse_date_time("effective", "2024-03-20T10:15:00+02:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_date_time("effective", "2024-03-20T08:15:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_date_time("effective", "2024-03-20").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn optional_date_time_passes_none_through() {
        assert_eq!(parse_optional_date_time("issued", None).unwrap(), None);
    }
}
