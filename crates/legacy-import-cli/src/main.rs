//! legacy-import CLI - legacy database to inventory-API import runner.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use legacy_import::orchestrator::registry;
use legacy_import::{
    ApiClient, Config, ImportContext, ImportError, LegacyReader, MysqlReader, Orchestrator,
    ProgressLog, Selection,
};
use tracing::info;

/// Exit code for a run that completed but recorded row-level errors.
const EXIT_COMPLETED_WITH_ERRORS: u8 = 2;

#[derive(Parser)]
#[command(name = "legacy-import")]
#[command(about = "Legacy cultural-heritage database import pipeline")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the tracker file for cross-run deduplication
    #[arg(long)]
    tracker_file: Option<PathBuf>,

    /// Output JSON report to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the import phases for the configured schema variant
    Run {
        /// Validate and report without writing to the target system
        #[arg(long)]
        dry_run: bool,

        /// Per-importer row limit
        #[arg(long)]
        limit: Option<usize>,

        /// Write detailed structured log entries to this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Run a single importer
        #[arg(long)]
        only: Option<String>,

        /// Skip importers before this one
        #[arg(long)]
        start_at: Option<String>,

        /// Stop after this importer
        #[arg(long)]
        stop_at: Option<String>,
    },

    /// List importers in execution order
    ListImporters,

    /// Test legacy database and target API connectivity
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, ImportError> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let log_file = match &cli.command {
        Commands::Run { log_file, .. } => {
            log_file.clone().or_else(|| config.import.log_file.clone())
        }
        _ => None,
    };
    setup_logging(&cli.verbosity, &cli.log_format, log_file.as_deref())
        .map_err(ImportError::Config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            dry_run,
            limit,
            log_file: _,
            only,
            start_at,
            stop_at,
        } => {
            let dry_run = dry_run || config.import.dry_run;
            let limit = limit.or(config.import.limit);
            let tracker_file = cli
                .tracker_file
                .clone()
                .or_else(|| config.import.tracker_file.clone());

            let reader = Arc::new(MysqlReader::connect(&config.legacy).await?);
            let client = ApiClient::new(&config.target)?;

            let progress = if cli.output_json {
                ProgressLog::silent()
            } else {
                ProgressLog::new()
            };
            let ctx = ImportContext::new(reader.clone(), Arc::new(client))
                .with_dry_run(dry_run)
                .with_limit(limit)
                .with_progress(progress);

            let orchestrator = Orchestrator::new(config.legacy.variant)
                .with_selection(Selection {
                    only,
                    start_at,
                    stop_at,
                })
                .with_tracker_file(tracker_file);

            let outcome = orchestrator.run(&ctx).await;
            reader.close().await;
            let report = outcome?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report.render_summary());
            }

            Ok(if report.has_errors() {
                ExitCode::from(EXIT_COMPLETED_WITH_ERRORS)
            } else {
                ExitCode::SUCCESS
            })
        }

        Commands::ListImporters => {
            println!("Importers for variant {}:", config.legacy.variant.as_str());
            for entry in registry(config.legacy.variant) {
                println!(
                    "  {:<14} {:<20} {}",
                    entry.importer.name(),
                    entry.phase,
                    entry.importer.description()
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::HealthCheck => {
            let mut healthy = true;

            let started = Instant::now();
            match MysqlReader::connect(&config.legacy).await {
                Ok(reader) => {
                    let outcome = reader.ping().await;
                    reader.close().await;
                    match outcome {
                        Ok(()) => println!(
                            "  Legacy database: OK ({}ms)",
                            started.elapsed().as_millis()
                        ),
                        Err(e) => {
                            healthy = false;
                            println!("  Legacy database: FAILED\n    Error: {e}");
                        }
                    }
                }
                Err(e) => {
                    healthy = false;
                    println!("  Legacy database: FAILED\n    Error: {e}");
                }
            }

            let started = Instant::now();
            let client = ApiClient::new(&config.target)?;
            match client.ping().await {
                Ok(()) => println!("  Target API: OK ({}ms)", started.elapsed().as_millis()),
                Err(e) => {
                    healthy = false;
                    println!("  Target API: FAILED\n    Error: {e}");
                }
            }

            println!(
                "\n  Overall: {}",
                if healthy { "HEALTHY" } else { "UNHEALTHY" }
            );
            if healthy {
                Ok(ExitCode::SUCCESS)
            } else {
                Err(ImportError::Config("health check failed".to_string()))
            }
        }
    }
}

fn setup_logging(verbosity: &str, format: &str, log_file: Option<&Path>) -> Result<(), String> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity));

    // Console logs go to stderr so the per-row progress symbols own stdout.
    let stderr_layer = if format == "json" {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let mut layers = vec![stderr_layer];
    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("opening log file {}: {e}", path.display()))?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .init();
    Ok(())
}
