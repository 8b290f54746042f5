use anyhow::Context;
use bridge_core::constants::CONFIG_PATH_ENV;
use bridge_core::{DomainRecord, InMemoryLookup, RecordKind, TranslatorConfig, Translators};
use clap::{Parser, Subcommand};
use fhir::Fhir;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fhir-bridge")]
#[command(about = "Translate EHR domain records to and from FHIR R4")]
struct Cli {
    /// Translator configuration file (defaults to $FHIR_BRIDGE_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate domain JSON into FHIR JSON; an array becomes a collection Bundle
    ToFhir {
        /// Record kind, e.g. patient, obs, drug_order
        #[arg(long)]
        kind: RecordKind,
        /// Input file, or - for stdin
        input: PathBuf,
    },
    /// Translate a FHIR resource or Bundle into domain JSON
    ToDomain {
        /// JSON fixture of concepts, identifier types and attribute types
        #[arg(long)]
        lookup: Option<PathBuf>,
        /// Input file, or - for stdin
        input: PathBuf,
    },
    /// Load and validate the translator configuration
    CheckConfig,
}

/// Entry point for the `fhir-bridge` CLI.
///
/// # Environment Variables
/// - `FHIR_BRIDGE_CONFIG`: YAML translator configuration (overridden by `--config`)
/// - `RUST_LOG`: log filter; logs go to stderr so stdout stays valid JSON
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
    let config = TranslatorConfig::resolve(config_path.as_deref())
        .with_context(|| match &config_path {
            Some(path) => format!("loading configuration from {}", path.display()),
            None => "building default configuration".to_string(),
        })?;

    match cli.command {
        Some(Commands::ToFhir { kind, input }) => {
            let translators = Translators::new(Arc::new(config), InMemoryLookup::new().into_shared());
            let output = to_fhir(&translators, kind, &read_input(&input)?)?;
            println!("{output}");
        }
        Some(Commands::ToDomain { lookup, input }) => {
            let lookup = match lookup {
                Some(path) => InMemoryLookup::load(&path)
                    .with_context(|| format!("loading lookup fixture {}", path.display()))?,
                None => InMemoryLookup::new(),
            };
            let translators = Translators::new(Arc::new(config), lookup.into_shared());
            let output = to_domain(&translators, &read_input(&input)?)?;
            println!("{output}");
        }
        Some(Commands::CheckConfig) => {
            println!("{}", describe_config(&config));
        }
        None => {
            println!("Use 'fhir-bridge --help' for commands");
        }
    }

    Ok(())
}

/// `RUST_LOG` plus defaults: CLI progress at info, dropped-data warnings from the translators.
fn log_filter() -> anyhow::Result<tracing_subscriber::EnvFilter> {
    Ok(tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("fhir_bridge=info".parse()?)
        .add_directive("bridge_core=warn".parse()?))
}

/// Read `path`, or stdin when `path` is `-`.
fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Domain JSON (one record, or an array of records of the same kind) to FHIR JSON.
fn to_fhir(translators: &Translators, kind: RecordKind, text: &str) -> anyhow::Result<String> {
    let value: serde_json::Value = serde_json::from_str(text).context("input is not valid JSON")?;

    match value {
        serde_json::Value::Array(items) => {
            let records = items
                .into_iter()
                .map(|item| DomainRecord::from_value(kind, item))
                .collect::<Result<Vec<_>, _>>()?;
            tracing::info!(kind = %kind, records = records.len(), "translating records to a Bundle");
            let bundle = translators.to_fhir_bundle(&records)?;
            Ok(Fhir::render(&bundle)?)
        }
        value => {
            let record = DomainRecord::from_value(kind, value)?;
            let resource = translators.to_fhir(&record)?;
            tracing::info!(kind = %kind, resource_type = resource.resource_type(), "translated record");
            Ok(Fhir::render_resource(&resource)?)
        }
    }
}

/// FHIR JSON to domain JSON. A single resource gives one record; a Bundle gives an array.
fn to_domain(translators: &Translators, text: &str) -> anyhow::Result<String> {
    let resource = Fhir::parse_any(text)?;
    let is_bundle = matches!(resource, fhir::Resource::Bundle(_));
    let records = translators.to_domain(&resource)?;
    tracing::info!(
        resource_type = resource.resource_type(),
        records = records.len(),
        "translated resource"
    );

    let output = match records.as_slice() {
        [single] if !is_bundle => serde_json::to_string_pretty(single)?,
        _ => serde_json::to_string_pretty(&records)?,
    };
    Ok(output)
}

fn describe_config(config: &TranslatorConfig) -> String {
    let mut lines = vec!["Configuration OK".to_string(), "Concept sources:".to_string()];
    lines.extend(
        config
            .concept_sources()
            .iter()
            .map(|source| format!("  {} -> {}", source.name, source.url)),
    );
    lines.push(format!("Telecom attribute type: {}", config.telecom_attribute_type()));
    lines.push(format!("Encounter type system: {}", config.encounter_type_system()));
    lines.push(format!("Visit type system: {}", config.visit_type_system()));
    lines.push(format!("Default encounter class: {}", config.default_encounter_class()));
    lines.push(format!(
        "Provider identifier system: {}",
        config.provider_identifier_system().unwrap_or("(none)")
    ));
    lines.push(format!("Contain provenance: {}", config.contain_provenance()));
    lines.join("\n")
}
