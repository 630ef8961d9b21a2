use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_genotypes::app::App;
use kira_genotypes::config::ConfigLoader;
use kira_genotypes::enumerate::StopReason;
use kira_genotypes::error::KiraError;
use kira_genotypes::output::{HumanOutput, JsonOutput, LogSink, OutputMode};
use kira_genotypes::snpedia::SnpediaHttpClient;
use kira_genotypes::store::Store;

/// Exit code for an enumeration that stopped on a remote failure.
const EXIT_ENUMERATION_ABORTED: u8 = 3;

#[derive(Parser)]
#[command(name = "kira-gt")]
#[command(about = "Harvest SNPedia genotypes and fold them into rsid and gene lookups")]
#[command(version, author)]
struct Cli {
    /// Config file (defaults to kira-gt.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print stage results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Append genotype identifiers from the category listing")]
    Enumerate,
    #[command(about = "Fetch attributes for identifiers not yet in the record stream")]
    Fetch,
    #[command(about = "Rebuild the by-rsid and by-gene lookup snapshots")]
    Fold,
    #[command(about = "Zip the by-rsid snapshot")]
    Package,
    #[command(about = "Match a raw DNA export against the by-rsid snapshot")]
    Match { file: Utf8PathBuf },
    #[command(about = "Run enumerate, fetch and fold in order")]
    Run,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(kira) = report.downcast_ref::<KiraError>() {
                return ExitCode::from(map_exit_code(kira));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::ConfigRead(_) | KiraError::ConfigParse(_) | KiraError::InvalidPattern(_) => 2,
        err if err.is_remote() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = Store::new(&config);
    tracing::debug!(data_dir = %store.root(), "resolved store");
    let client = SnpediaHttpClient::new(&config)?;
    let app = App::new(store, config, client);

    match cli.command {
        Commands::Enumerate => {
            let result = app.enumerate(&LogSink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_enumerate(&result),
            }
            Ok(enumeration_exit(&result.summary.stop))
        }
        Commands::Fetch => {
            let result = app.fetch(&LogSink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_fetch(&result),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fold => {
            let result = app.fold(&LogSink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_fold(&result),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Package => {
            let result = app.package(&LogSink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_package(&result),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Match { file } => {
            let result = app.match_dna(&file, &LogSink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_match(&result),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run => {
            let result = app.run(&LogSink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&result).into_diagnostic()?,
                OutputMode::Human => {
                    HumanOutput::print_enumerate(&result.enumerate);
                    HumanOutput::print_fetch(&result.fetch);
                    HumanOutput::print_fold(&result.fold);
                }
            }
            Ok(enumeration_exit(&result.enumerate.summary.stop))
        }
    }
}

fn enumeration_exit(stop: &StopReason) -> ExitCode {
    match stop {
        StopReason::Aborted { .. } => ExitCode::from(EXIT_ENUMERATION_ABORTED),
        _ => ExitCode::SUCCESS,
    }
}
