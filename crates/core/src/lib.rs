//! # Bridge Core
//!
//! Bidirectional translation between the EHR platform's domain records and FHIR R4.
//!
//! This crate contains the translation logic only:
//! - the [`ToFhirTranslator`] / [`ToDomainTranslator`] contract and one translator per
//!   datatype and resource
//! - reference, date and concept handling shared by the translators
//! - translator configuration ([`TranslatorConfig`]) and the [`DomainLookup`] the reverse
//!   direction needs to resolve codes and names
//!
//! **No transport concerns**: reading files, talking to a server or printing output belongs in
//! the `fhir-bridge` binary.

pub mod config;
pub mod constants;
pub mod datetime;
pub mod error;
pub mod lookup;
pub mod reference;
pub mod translator;
pub mod translators;

pub use config::{ConceptSource, SeverityConcepts, TranslatorConfig};
pub use error::{TranslationError, TranslationResult};
pub use lookup::{DomainLookup, InMemoryLookup, SharedLookup};
pub use translator::{ToDomainTranslator, ToFhirTranslator};
pub use translators::{DomainRecord, RecordKind, Translators};
