use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use oci_inventory::config::{Config, RunConfig};
use oci_inventory::error::FailurePolicy;
use oci_inventory::export::{run_prefix, CsvExporter};
use oci_inventory::inventory::RegionDriver;
use oci_inventory::oci::{
    default_key_file, default_token_file, format_api_error, OciClient, RequestSigner,
    SecurityTokenSigner,
};
use oci_inventory::resource::{default_schema, PropertySchema, ResourceKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Export OCI instances, boot volumes and block volumes to CSV
#[derive(Parser, Debug)]
#[command(name = "oci-inventory", version, about, long_about = None)]
struct Args {
    /// Compartment to start from (defaults to the tenancy root)
    compartment_id: Option<String>,

    /// Home region used for identity calls
    #[arg(short, long)]
    region: Option<String>,

    /// File holding the session security token
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Session private key that signs requests
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Only collect the home region
    #[arg(long)]
    home_region_only: bool,

    /// Do not descend into sub-compartments
    #[arg(long)]
    no_recursive: bool,

    /// Resource kinds to collect (default: all)
    #[arg(long, value_enum, value_delimiter = ',')]
    kinds: Vec<ResourceKind>,

    /// Property schema file (YAML or JSON)
    #[arg(long)]
    properties: Option<PathBuf>,

    /// Directory the report is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Override the timestamp prefix of the report
    #[arg(long)]
    prefix: Option<String>,

    /// Abort when a compartment cannot be listed
    #[arg(long)]
    strict_compartments: bool,

    /// Log and skip failed instance/volume listings instead of aborting
    #[arg(long)]
    skip_inventory_errors: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.as_str().to_ascii_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);

    let guard = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            builder.with_writer(non_blocking).with_ansi(false).init();
            Some(guard)
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            None
        }
    };

    tracing::debug!("oci-inventory started with log level: {:?}", level);
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_deref())?;

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", format_api_error(&err));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load();
    let prefix = args.prefix.clone().unwrap_or_else(|| run_prefix(Local::now()));

    let region = args
        .region
        .clone()
        .unwrap_or_else(|| config.effective_region());
    let token_file = args
        .token_file
        .clone()
        .or_else(|| config.effective_token_file())
        .or_else(default_token_file)
        .context("No security token file configured. Set OCI_SECURITY_TOKEN_FILE")?;
    let key_file = args
        .key_file
        .clone()
        .or_else(|| config.effective_key_file())
        .or_else(default_key_file)
        .context("No session key configured. Set OCI_SESSION_KEY_FILE")?;

    let signer = SecurityTokenSigner::new(&token_file, &key_file)?;
    tracing::info!("Authenticated for tenancy {}", signer.tenancy_id());
    let mut client = OciClient::new(Arc::new(signer), &region)?;
    if let Some(endpoint) = config.endpoint_override() {
        tracing::info!("Using endpoint override {}", endpoint);
        client = client.with_endpoint(&endpoint);
    }

    let run_config = run_config(&args, &config);

    let mut schema = match args.properties.as_ref().or(config.properties_file.as_ref()) {
        Some(path) => PropertySchema::load(path)?,
        None => default_schema().clone(),
    };
    schema.retain_kinds(&run_config.kinds);

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    tracing::info!("Using region: {}, prefix: {}", region, prefix);

    let driver = RegionDriver::new(run_config, client);
    let inventory = driver.run().await?;

    for ((region, kind), count) in inventory.counts() {
        tracing::info!("{} {}: {}", region, kind, count);
    }
    tracing::info!(
        "{} resources in {} compartments",
        inventory.records.len(),
        inventory.compartments.len()
    );

    let exporter = CsvExporter::new(&schema, &prefix);
    let path = exporter.write_file(&output_dir, &inventory.records, &inventory.compartments)?;
    println!("{}", path.display());

    Ok(())
}

/// Fold CLI flags over the persisted defaults
fn run_config(args: &Args, config: &Config) -> RunConfig {
    let kinds = if args.kinds.is_empty() {
        ResourceKind::ALL.to_vec()
    } else {
        args.kinds.clone()
    };

    RunConfig {
        root_compartment_id: args.compartment_id.clone(),
        recursive: !args.no_recursive && config.recursive.unwrap_or(true),
        home_region_only: args.home_region_only || config.home_region_only.unwrap_or(false),
        kinds,
        compartment_failures: if args.strict_compartments {
            FailurePolicy::Abort
        } else {
            FailurePolicy::BestEffort
        },
        inventory_failures: if args.skip_inventory_errors {
            FailurePolicy::BestEffort
        } else {
            FailurePolicy::Abort
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["oci-inventory"]);
        let run = run_config(&args, &Config::default());
        assert_eq!(run, RunConfig::default());
    }

    #[test]
    fn test_cli_flags_override_config() {
        let args = Args::parse_from([
            "oci-inventory",
            "ocid1.compartment.oc1..x",
            "--home-region-only",
            "--no-recursive",
            "--kinds",
            "instance,volume",
            "--strict-compartments",
            "--skip-inventory-errors",
        ]);
        let run = run_config(&args, &Config::default());

        assert_eq!(run.root_compartment_id.as_deref(), Some("ocid1.compartment.oc1..x"));
        assert!(run.home_region_only);
        assert!(!run.recursive);
        assert_eq!(run.kinds, vec![ResourceKind::Instance, ResourceKind::Volume]);
        assert_eq!(run.compartment_failures, FailurePolicy::Abort);
        assert_eq!(run.inventory_failures, FailurePolicy::BestEffort);
    }

    #[test]
    fn test_config_file_toggles_apply() {
        let args = Args::parse_from(["oci-inventory"]);
        let config = Config {
            recursive: Some(false),
            home_region_only: Some(true),
            ..Default::default()
        };
        let run = run_config(&args, &config);
        assert!(!run.recursive);
        assert!(run.home_region_only);
    }
}
