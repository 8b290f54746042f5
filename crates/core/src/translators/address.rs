use crate::datetime::{format_date_time, parse_optional_date_time};
use crate::translator::{non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::TranslationResult;
use bridge_domain::PersonAddress;
use fhir::{Address, Period};

/// `PersonAddress` <-> `Address`. `address1..3` become `line[]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PersonAddressTranslator;

impl ToFhirTranslator<PersonAddress> for PersonAddressTranslator {
    type Resource = Address;

    fn to_fhir_resource(&self, address: &PersonAddress) -> TranslationResult<Address> {
        let line = [&address.address1, &address.address2, &address.address3]
            .into_iter()
            .filter_map(|l| non_blank(l.as_deref()))
            .collect();

        let period = Period {
            start: address.start_date.as_ref().map(format_date_time),
            end: address.end_date.as_ref().map(format_date_time),
        };

        Ok(Address {
            id: Some(address.uuid.to_string()),
            use_: address.preferred.then(|| "home".to_string()),
            text: None,
            line,
            city: non_blank(address.city_village.as_deref()),
            district: non_blank(address.county_district.as_deref()),
            state: non_blank(address.state_province.as_deref()),
            postal_code: non_blank(address.postal_code.as_deref()),
            country: non_blank(address.country.as_deref()),
            period: (!period.is_empty()).then_some(period),
        })
    }
}

impl ToDomainTranslator<PersonAddress> for PersonAddressTranslator {
    type Resource = Address;

    fn update_domain_type(&self, existing: &mut PersonAddress, address: &Address) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("Address.id", address.id.as_deref(), existing.uuid)?;

        let mut lines = address.line.iter().map(|l| non_blank(Some(l.as_str())));
        existing.address1 = lines.next().flatten();
        existing.address2 = lines.next().flatten();
        existing.address3 = lines.next().flatten();
        if address.line.len() > 3 {
            tracing::warn!(
                lines = address.line.len(),
                "address has more than three lines; extra lines dropped"
            );
        }

        existing.city_village = non_blank(address.city.as_deref());
        existing.county_district = non_blank(address.district.as_deref());
        existing.state_province = non_blank(address.state.as_deref());
        existing.postal_code = non_blank(address.postal_code.as_deref());
        existing.country = non_blank(address.country.as_deref());

        if let Some(period) = &address.period {
            existing.start_date = parse_optional_date_time("Address.period.start", period.start.as_deref())?;
            existing.end_date = parse_optional_date_time("Address.period.end", period.end.as_deref())?;
        }
        if let Some(use_) = address.use_.as_deref() {
            existing.preferred = use_ == "home";
        }
        Ok(())
    }
}
