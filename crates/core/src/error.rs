/// Errors raised while translating between domain records and FHIR resources.
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid UUID in {field}: '{value}'")]
    InvalidUuid { field: &'static str, value: String },

    #[error("invalid id in {field}: {source}")]
    InvalidResourceId {
        field: &'static str,
        #[source]
        source: bridge_types::TextError,
    },

    #[error("invalid date in {field}: '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("unknown code '{code}' for {field}")]
    UnknownCode { field: &'static str, code: String },

    #[error("missing required element: {0}")]
    MissingElement(&'static str),

    #[error("unknown identifier type: '{0}'")]
    UnknownIdentifierType(String),

    #[error("invalid {kind} record: {source}")]
    InvalidRecord {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration file: {0}")]
    ConfigRead(std::io::Error),

    #[error("failed to parse configuration YAML: {0}")]
    ConfigYaml(serde_yaml::Error),

    #[error("failed to read lookup fixture: {0}")]
    LookupRead(std::io::Error),

    #[error("failed to parse lookup fixture: {0}")]
    LookupJson(serde_json::Error),
}

pub type TranslationResult<T> = std::result::Result<T, TranslationError>;
