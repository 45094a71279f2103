use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use erx_core::config::{address_prefix_from_env_value, id_source_from_env_value};
use erx_core::{DocumentAssembler, EngineConfig, IdSourceKind, ReferenceRewriter};
use erx_fhir::{AssembledBundle, Dispensation, Prescription};

const ENV_ADDRESS_PREFIX: &str = "ERX_ADDRESS_PREFIX";
const ENV_ID_SOURCE: &str = "ERX_ID_SOURCE";

#[derive(Parser)]
#[command(name = "erx")]
#[command(about = "Assemble e-prescription and dispensation bundles")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct EngineArgs {
    /// Prefix of every full address, overrides ERX_ADDRESS_PREFIX (default: urn:uuid:)
    #[arg(long, global = true)]
    address_prefix: Option<String>,
    /// Identifier source (random | sequential), overrides ERX_ID_SOURCE
    #[arg(long, global = true)]
    id_source: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a dispensation data bundle
    Dispense {
        /// Dispensation YAML file
        input: PathBuf,
    },
    /// Build a prescription bundle
    Prescription {
        /// Prescription YAML file
        input: PathBuf,
    },
    /// Build a prescription bundle and swap its coverage
    ChangeCoverage {
        /// Prescription YAML file
        prescription: PathBuf,
        /// Replacement coverage YAML file
        coverage: PathBuf,
    },
}

/// Entry point for the `erx` command line tool.
///
/// Bundle JSON goes to stdout, logs go to stderr.
///
/// # Environment Variables
/// - `ERX_ADDRESS_PREFIX`: prefix of full addresses (default: "urn:uuid:")
/// - `ERX_ID_SOURCE`: `random` or `sequential` (default: "random")
/// - `RUST_LOG`: log filter (default directive: "erx=info")
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("erx=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = engine_config(&cli.engine, |key| std::env::var(key).ok())?;
    tracing::info!(
        address_prefix = config.address_prefix(),
        id_source = config.id_source().as_str(),
        "++ Starting erx"
    );

    let bundle = run(&cli.command, &config)?;
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}

/// Resolves engine configuration: command line flags first, then environment, then defaults.
fn engine_config(
    args: &EngineArgs,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<EngineConfig> {
    let address_prefix =
        address_prefix_from_env_value(args.address_prefix.clone().or_else(|| env(ENV_ADDRESS_PREFIX)));
    let id_source: IdSourceKind =
        id_source_from_env_value(args.id_source.clone().or_else(|| env(ENV_ID_SOURCE)))?;

    EngineConfig::new(&address_prefix, id_source)
        .with_context(|| format!("invalid address prefix '{address_prefix}'"))
}

fn run(command: &Commands, config: &EngineConfig) -> anyhow::Result<Value> {
    let assembler = DocumentAssembler::from_config(config);

    let bundle = match command {
        Commands::Dispense { input } => {
            let data = Dispensation::parse(&read_input(input)?)?;
            Dispensation::assemble(&assembler, &data, None)?
        }
        Commands::Prescription { input } => {
            let data = Prescription::parse(&read_input(input)?)?;
            Prescription::assemble(&assembler, &data, None)?
        }
        Commands::ChangeCoverage {
            prescription,
            coverage,
        } => {
            let data = Prescription::parse(&read_input(prescription)?)?;
            let coverage = Prescription::parse_coverage(&read_input(coverage)?)?;
            let assembled = Prescription::assemble(&assembler, &data, None)?;
            Prescription::change_coverage(
                &ReferenceRewriter::from_config(config),
                &assembled,
                &coverage,
            )?
        }
    };

    render(&bundle, &assembler)
}

fn render(bundle: &AssembledBundle, assembler: &DocumentAssembler) -> anyhow::Result<Value> {
    let bundle_id = assembler.allocator().allocate()?;
    Ok(bundle.to_json(bundle_id, Utc::now()))
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PRESCRIPTION: &str = r#"
prescription_id: 160.000.100.000.001.05
patient: { given: Ludger, family: Königsstein, kvnr: X234567890, birth_date: 1935-06-22 }
practitioner: { given: Hans, family: Topp-Glücklich, lanr: "838382202" }
organization: { name: Hausarztpraxis, bsnr: "031234567" }
coverage: { payor_name: AOK Rheinland/Hamburg, payor_iknr: "104212059" }
medication: { pzn: "04773414", name: Ibuprofen 600 mg }
request: { authored_on: 2024-05-01, quantity: 1 }
"#;

    const DISPENSATION: &str = r#"
prescription_id: 200.100.000.000.081.90
pharmacy: { name: Adler-Apotheke, iknr: "308412345" }
invoice: { lines: [{ pzn: "06313728", gross_price: 28.85, vat_rate: 19 }] }
medication: { pzn: "06313728", name: Sumatriptan, quantity: 1, handed_over: 2024-05-02 }
"#;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn sequential() -> EngineConfig {
        EngineConfig::new("urn:uuid:", IdSourceKind::Sequential).unwrap()
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let config = engine_config(&EngineArgs::default(), no_env).unwrap();
        assert_eq!(config.address_prefix(), "urn:uuid:");
        assert_eq!(config.id_source(), IdSourceKind::Random);
    }

    #[test]
    fn flags_override_environment() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_ADDRESS_PREFIX, "https://env.example/fhir/"),
            (ENV_ID_SOURCE, "random"),
        ]);
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let from_env = engine_config(&EngineArgs::default(), lookup).unwrap();
        assert_eq!(from_env.address_prefix(), "https://env.example/fhir/");

        let args = EngineArgs {
            address_prefix: Some("https://flag.example/".into()),
            id_source: Some("sequential".into()),
        };
        let from_flags = engine_config(&args, lookup).unwrap();
        assert_eq!(from_flags.address_prefix(), "https://flag.example/");
        assert_eq!(from_flags.id_source(), IdSourceKind::Sequential);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let args = EngineArgs {
            address_prefix: Some("no-separator".into()),
            id_source: None,
        };
        assert!(engine_config(&args, no_env).is_err());

        let args = EngineArgs {
            address_prefix: None,
            id_source: Some("counter".into()),
        };
        assert!(engine_config(&args, no_env).is_err());
    }

    #[test]
    fn parses_subcommands_and_global_flags() {
        let cli = Cli::try_parse_from([
            "erx",
            "change-coverage",
            "rx.yaml",
            "coverage.yaml",
            "--id-source",
            "sequential",
        ])
        .unwrap();
        assert_eq!(cli.engine.id_source.as_deref(), Some("sequential"));
        assert!(matches!(
            cli.command,
            Commands::ChangeCoverage { ref prescription, .. } if prescription == Path::new("rx.yaml")
        ));
    }

    #[test]
    fn dispense_renders_bundle_from_file() {
        let input = yaml_file(DISPENSATION);
        let bundle = run(
            &Commands::Dispense {
                input: input.path().to_path_buf(),
            },
            &sequential(),
        )
        .unwrap();

        assert_eq!(bundle["type"], "document");
        assert_eq!(bundle["entry"].as_array().unwrap().len(), 4);
        assert_eq!(bundle["id"], "00000000-0000-4000-8000-000000000005");
    }

    #[test]
    fn change_coverage_renders_rewritten_bundle() {
        let prescription = yaml_file(PRESCRIPTION);
        let coverage = yaml_file("payor_name: Techniker Krankenkasse\npayor_iknr: \"101575519\"\n");

        let bundle = run(
            &Commands::ChangeCoverage {
                prescription: prescription.path().to_path_buf(),
                coverage: coverage.path().to_path_buf(),
            },
            &sequential(),
        )
        .unwrap();

        let coverage_url = "urn:uuid:00000000-0000-4000-8000-000000000008";
        assert_eq!(bundle["entry"][5]["fullUrl"], coverage_url);
        assert_eq!(
            bundle["entry"][1]["resource"]["insurance"][0]["reference"],
            coverage_url
        );
    }

    #[test]
    fn missing_input_file_names_the_path() {
        let err = run(
            &Commands::Prescription {
                input: PathBuf::from("/nonexistent/rx.yaml"),
            },
            &sequential(),
        )
        .expect_err("file does not exist");
        assert!(err.to_string().contains("/nonexistent/rx.yaml"));
    }
}
