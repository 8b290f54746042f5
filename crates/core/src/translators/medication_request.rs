//! Drug orders as `MedicationRequest`s.
//!
//! FHIR status is not stored on the order; it is derived from the order's dates and action
//! at the moment of translation, so the same order reads `active` today and `completed` once
//! its expiry date passes. Unit and frequency concepts travel as the concept uuid in the
//! `Quantity.code` or `Timing.code` so the reverse direction can resolve them again.

use crate::config::TranslatorConfig;
use crate::datetime::{format_date_time, parse_optional_date_time};
use crate::lookup::SharedLookup;
use crate::reference::{from_reference_opt, to_reference, ReferenceKind};
use crate::translator::{meta_from_audit, non_blank, resolve_uuid, ToDomainTranslator, ToFhirTranslator};
use crate::translators::concept::ConceptTranslator;
use crate::translators::encounter::subject_or_existing;
use crate::translators::provenance::{AuditedRecord, ProvenanceTranslator};
use crate::{TranslationError, TranslationResult};
use bridge_domain::{Concept, DrugOrder, OrderAction, OrderUrgency};
use chrono::{DateTime, Utc};
use fhir::{
    CodeableConcept, Coding, DispenseRequest, DoseAndRate, Dosage, Identifier, Period, Quantity, Timing,
};
use std::sync::Arc;

const INTENT_ORDER: &str = "order";

/// Request status of `order` as seen at `now`.
fn status_at(order: &DrugOrder, now: DateTime<Utc>) -> &'static str {
    if order.voided {
        "entered-in-error"
    } else if order.is_stopped_at(now) {
        "stopped"
    } else if order.is_expired_at(now) {
        "completed"
    } else if order.action == OrderAction::Discontinue {
        "cancelled"
    } else {
        "active"
    }
}

fn priority(urgency: OrderUrgency) -> &'static str {
    match urgency {
        OrderUrgency::Stat => "stat",
        OrderUrgency::Routine | OrderUrgency::OnScheduledDate => "routine",
    }
}

/// A quantity whose unit is a dictionary concept.
fn concept_quantity(value: Option<f64>, units: Option<&Concept>) -> Option<Quantity> {
    if value.is_none() && units.is_none() {
        return None;
    }
    Some(Quantity {
        value,
        unit: units.and_then(|u| u.display_name.clone()),
        system: None,
        code: units.map(|u| u.uuid.to_string()),
    })
}

#[derive(Clone)]
pub struct MedicationRequestTranslator {
    concept: ConceptTranslator,
    provenance: ProvenanceTranslator,
}

impl MedicationRequestTranslator {
    pub fn new(config: Arc<TranslatorConfig>, lookup: SharedLookup) -> Self {
        Self {
            concept: ConceptTranslator::new(config.clone(), lookup),
            provenance: ProvenanceTranslator::new(config),
        }
    }

    /// Translate `order` with its status evaluated at `now`.
    pub fn to_fhir_resource_at(
        &self,
        order: &DrugOrder,
        now: DateTime<Utc>,
    ) -> TranslationResult<fhir::MedicationRequest> {
        let status = status_at(order, now);
        tracing::debug!(uuid = %order.uuid, status, "translating drug order to FHIR");

        let (medication_reference, medication_codeable_concept) = match &order.drug {
            Some(drug) => (Some(to_reference(ReferenceKind::Medication, drug)), None),
            None => (None, Some(self.concept.to_fhir_resource(&order.concept)?)),
        };

        let dosage = Dosage {
            text: non_blank(order.dosing_instructions.as_deref()),
            timing: self
                .concept
                .to_fhir_resource_opt(order.frequency.as_ref())?
                .map(|code| Timing { code: Some(code) }),
            route: self.concept.to_fhir_resource_opt(order.route.as_ref())?,
            dose_and_rate: concept_quantity(order.dose, order.dose_units.as_ref())
                .map(|dose| DoseAndRate {
                    dose_quantity: Some(dose),
                })
                .into_iter()
                .collect(),
        };
        let has_dosage = dosage != Dosage::default();

        let validity = Period {
            start: order.date_activated.as_ref().map(format_date_time),
            end: order.auto_expire_date.as_ref().map(format_date_time),
        };
        let dispense = DispenseRequest {
            validity_period: (!validity.is_empty()).then_some(validity),
            number_of_repeats_allowed: order.num_refills,
            quantity: concept_quantity(order.quantity, order.quantity_units.as_ref()),
        };
        let has_dispense = dispense != DispenseRequest::default();

        Ok(fhir::MedicationRequest {
            id: Some(order.uuid.to_string()),
            meta: meta_from_audit(&order.audit),
            contained: self.provenance.contained(AuditedRecord {
                kind: ReferenceKind::MedicationRequest,
                uuid: order.uuid,
                audit: &order.audit,
            })?,
            identifier: non_blank(order.order_number.as_deref())
                .map(|number| Identifier {
                    use_: Some("usual".into()),
                    value: Some(number),
                    ..Default::default()
                })
                .into_iter()
                .collect(),
            status: Some(status.to_string()),
            intent: Some(INTENT_ORDER.to_string()),
            priority: Some(priority(order.urgency).to_string()),
            medication_codeable_concept,
            medication_reference,
            subject: Some(to_reference(ReferenceKind::Patient, &order.patient)),
            encounter: order
                .encounter
                .as_ref()
                .map(|e| to_reference(ReferenceKind::Encounter, e)),
            authored_on: order.date_activated.as_ref().map(format_date_time),
            requester: order
                .orderer
                .as_ref()
                .map(|p| to_reference(ReferenceKind::Practitioner, p)),
            prior_prescription: order
                .previous_order
                .as_ref()
                .map(|p| to_reference(ReferenceKind::MedicationRequest, p)),
            dosage_instruction: if has_dosage { vec![dosage] } else { Vec::new() },
            dispense_request: has_dispense.then_some(dispense),
        })
    }

    fn quantity_units(&self, field: &'static str, quantity: &Quantity) -> TranslationResult<Option<Concept>> {
        let Some(code) = quantity.code.as_deref() else {
            return Ok(None);
        };
        let codeable = CodeableConcept {
            coding: vec![Coding {
                system: quantity.system.clone(),
                code: Some(code.to_string()),
                ..Default::default()
            }],
            text: quantity.unit.clone(),
        };
        self.concept.resolve_required(field, &codeable).map(Some)
    }
}

impl ToFhirTranslator<DrugOrder> for MedicationRequestTranslator {
    type Resource = fhir::MedicationRequest;

    fn to_fhir_resource(&self, order: &DrugOrder) -> TranslationResult<fhir::MedicationRequest> {
        self.to_fhir_resource_at(order, Utc::now())
    }
}

impl ToDomainTranslator<DrugOrder> for MedicationRequestTranslator {
    type Resource = fhir::MedicationRequest;

    fn update_domain_type(
        &self,
        existing: &mut DrugOrder,
        resource: &fhir::MedicationRequest,
    ) -> TranslationResult<()> {
        existing.uuid = resolve_uuid("MedicationRequest.id", resource.id.as_deref(), existing.uuid)?;

        if let Some(intent) = resource.intent.as_deref().filter(|i| *i != INTENT_ORDER) {
            tracing::warn!(intent, "medication request intent is not 'order'; translating as an order");
        }

        match resource.status.as_deref() {
            Some("entered-in-error") => existing.voided = true,
            Some("cancelled") => {
                existing.voided = false;
                existing.action = OrderAction::Discontinue;
            }
            Some("active" | "on-hold" | "draft") => {
                existing.voided = false;
                if existing.action == OrderAction::Discontinue {
                    existing.action = OrderAction::New;
                }
            }
            Some(_) => existing.voided = false,
            None => {}
        }

        match resource.priority.as_deref() {
            Some("stat" | "asap" | "urgent") => existing.urgency = OrderUrgency::Stat,
            Some("routine") if existing.urgency == OrderUrgency::Stat => {
                existing.urgency = OrderUrgency::Routine
            }
            _ => {}
        }

        if resource.medication_reference.is_some() {
            existing.drug = from_reference_opt(ReferenceKind::Medication, resource.medication_reference.as_ref())?;
        }
        if let Some(codeable) = &resource.medication_codeable_concept {
            existing.concept = self.concept.resolve_required("MedicationRequest.medicationCodeableConcept", codeable)?;
        }
        if existing.drug.is_none() && existing.concept.uuid.is_nil() {
            return Err(TranslationError::MissingElement("MedicationRequest.medication[x]"));
        }

        existing.patient = subject_or_existing(
            "MedicationRequest.subject",
            resource.subject.as_ref(),
            &existing.patient,
        )?;
        if resource.encounter.is_some() {
            existing.encounter = from_reference_opt(ReferenceKind::Encounter, resource.encounter.as_ref())?;
        }
        if resource.requester.is_some() {
            existing.orderer = from_reference_opt(ReferenceKind::Practitioner, resource.requester.as_ref())?;
        }
        if resource.prior_prescription.is_some() {
            existing.previous_order = from_reference_opt(
                ReferenceKind::MedicationRequest,
                resource.prior_prescription.as_ref(),
            )?;
        }
        if resource.authored_on.is_some() {
            existing.date_activated =
                parse_optional_date_time("MedicationRequest.authoredOn", resource.authored_on.as_deref())?;
        }
        if let Some(number) = resource.identifier.iter().find_map(|i| non_blank(i.value.as_deref())) {
            existing.order_number = Some(number);
        }

        if let Some(dosage) = resource.dosage_instruction.first() {
            existing.dosing_instructions = non_blank(dosage.text.as_deref());
            existing.route = dosage
                .route
                .as_ref()
                .map(|route| self.concept.resolve_required("MedicationRequest.dosageInstruction.route", route))
                .transpose()?;
            existing.frequency = dosage
                .timing
                .as_ref()
                .and_then(|t| t.code.as_ref())
                .map(|code| self.concept.resolve_required("MedicationRequest.dosageInstruction.timing.code", code))
                .transpose()?;
            if let Some(dose) = dosage.dose_and_rate.first().and_then(|d| d.dose_quantity.as_ref()) {
                existing.dose = dose.value;
                existing.dose_units =
                    self.quantity_units("MedicationRequest.dosageInstruction.doseQuantity", dose)?;
            }
        }

        if let Some(dispense) = &resource.dispense_request {
            existing.num_refills = dispense.number_of_repeats_allowed;
            if let Some(quantity) = &dispense.quantity {
                existing.quantity = quantity.value;
                existing.quantity_units =
                    self.quantity_units("MedicationRequest.dispenseRequest.quantity", quantity)?;
            }
            if let Some(validity) = &dispense.validity_period {
                existing.auto_expire_date = parse_optional_date_time(
                    "MedicationRequest.dispenseRequest.validityPeriod.end",
                    validity.end.as_deref(),
                )?;
            }
        }
        Ok(())
    }
}
