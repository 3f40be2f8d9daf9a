use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use ferrum_r4::r4::FHIR_VERSION;
use ferrum_r4::{FhirJson, Resource};
use tracing::{debug, info};

mod logging;

use logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "fhir-r4",
    about = "Inspect FHIR R4 resource documents",
    version,
    arg_required_else_help = true
)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, env = "FHIR_R4_LOG", default_value = "warn")]
    log_level: String,
    /// Log line format.
    #[arg(long, global = true, env = "FHIR_R4_LOG_FORMAT", value_enum, default_value = "human")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a resource and print it as indented JSON.
    Show {
        /// Path to a resource JSON file (or "-" for stdin).
        resource: PathBuf,
        /// Print compact JSON instead.
        #[arg(long, action = ArgAction::SetTrue)]
        compact: bool,
    },

    /// List modifier extensions; fails when any is not understood.
    Modifiers {
        /// Path to a resource JSON file (or "-" for stdin).
        resource: PathBuf,
        /// Extension url the caller understands. Repeatable.
        #[arg(short = 'u', long = "understand", value_name = "URL")]
        understood: Vec<String>,
    },

    /// List contained resources and local references that do not resolve.
    Contained {
        /// Path to a resource JSON file (or "-" for stdin).
        resource: PathBuf,
    },

    /// Print CLI version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

/// Run a command; `Ok(false)` means the resource was read but failed the check.
fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::Version => {
            println!("{} (FHIR {})", env!("CARGO_PKG_VERSION"), FHIR_VERSION);
            Ok(true)
        }
        Commands::Show { resource, compact } => {
            let resource = load_resource(&resource)?;
            if compact {
                println!("{}", resource.to_json_string()?);
            } else {
                println!("{}", resource);
            }
            Ok(true)
        }
        Commands::Modifiers {
            resource,
            understood,
        } => {
            let resource = load_resource(&resource)?;
            let understood: Vec<&str> = understood.iter().map(String::as_str).collect();
            Ok(run_modifiers(&resource, &understood))
        }
        Commands::Contained { resource } => {
            let resource = load_resource(&resource)?;
            run_contained(&resource)
        }
    }
}

fn run_modifiers(resource: &Resource, understood: &[&str]) -> bool {
    let mut all_understood = true;
    for (path, extension) in resource.collect_modifier_extensions() {
        let known = understood.contains(&extension.url.as_str());
        all_understood &= known;
        println!(
            "{}\t{}\t{}",
            if known { "ok" } else { "UNKNOWN" },
            path,
            extension.url
        );
    }
    info!(all_understood, "modifier extension check finished");
    all_understood
}

fn run_contained(resource: &Resource) -> Result<bool> {
    let mut holders: Vec<&Resource> = vec![resource];
    if let Resource::Bundle(bundle) = resource {
        holders.extend(bundle.resources());
    }

    for holder in holders {
        for contained in holder.contained() {
            println!(
                "{}/{}\t#{}\t{}",
                holder.resource_type(),
                holder.id().unwrap_or("-"),
                contained.id().unwrap_or(""),
                contained.resource_type()
            );
        }
    }

    let unresolved = resource.unresolved_local_references()?;
    for reference in &unresolved {
        println!("unresolved\t{}", reference);
    }
    Ok(unresolved.is_empty())
}

fn load_resource(path: &Path) -> Result<Resource> {
    let contents = if path.to_string_lossy() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read JSON resource from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read resource file '{}'", path.display()))?
    };

    let resource = Resource::from_json_str(&contents)
        .with_context(|| format!("Not a supported FHIR R4 resource: {}", path.display()))?;
    debug!(
        resource_type = resource.resource_type(),
        id = resource.id().unwrap_or(""),
        "loaded resource"
    );
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(value: serde_json::Value) -> Resource {
        Resource::from_json_value(&value).unwrap()
    }

    #[test]
    fn test_cli_parses_repeated_understand() {
        let cli = Cli::try_parse_from([
            "fhir-r4",
            "modifiers",
            "patient.json",
            "-u",
            "http://example.org/a",
            "--understand",
            "http://example.org/b",
        ])
        .unwrap();
        match cli.command {
            Commands::Modifiers { understood, .. } => assert_eq!(understood.len(), 2),
            _ => panic!("expected modifiers command"),
        }
        assert_eq!(cli.log_format, LogFormat::Human);
    }

    #[test]
    fn test_modifiers_check() {
        let patient = resource(json!({
            "resourceType": "Patient",
            "modifierExtension": [{"url": "http://example.org/no-consent", "valueBoolean": true}]
        }));
        assert!(!run_modifiers(&patient, &[]));
        assert!(run_modifiers(&patient, &["http://example.org/no-consent"]));
    }

    #[test]
    fn test_contained_reports_unresolved() {
        let condition = resource(json!({
            "resourceType": "Condition",
            "contained": [{"resourceType": "Patient", "id": "p1"}],
            "subject": {"reference": "#p1"},
            "asserter": {"reference": "#missing"}
        }));
        assert!(!run_contained(&condition).unwrap());
    }
}
