use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_metadata_loader::app::App;
use kira_metadata_loader::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use kira_metadata_loader::domain::ImportSource;
use kira_metadata_loader::error::KiraError;
use kira_metadata_loader::importer::ObjectsImporter;
use kira_metadata_loader::output::{JsonOutput, LogProgress};
use kira_metadata_loader::retriever::{DatabaseXmlRetriever, EnaApiRetriever, XmlRetriever};
use kira_metadata_loader::store::Store;

#[derive(Parser)]
#[command(name = "kira-ml")]
#[command(about = "Import SRA/ENA study and analysis metadata into a local catalog")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Import every accession listed in a file")]
    Import(ImportArgs),
    #[command(about = "Print catalog row counts")]
    Stats(StatsArgs),
}

#[derive(Args)]
struct ImportArgs {
    #[arg(long)]
    accessions: Utf8PathBuf,

    #[arg(long, value_enum)]
    source: Option<ImportSource>,

    #[arg(long)]
    store: Option<Utf8PathBuf>,

    #[arg(long)]
    database: Option<Utf8PathBuf>,

    #[arg(long)]
    api_base_url: Option<String>,

    #[arg(long)]
    abort_on_storage_error: bool,
}

#[derive(Args)]
struct StatsArgs {
    #[arg(long)]
    store: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::AccessionFileRead(_) | KiraError::ConfigRead(_) | KiraError::ConfigParse(_) => 2,
        KiraError::StoreOpen { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => run_import(cli.config.as_deref(), args),
        Commands::Stats(args) => run_stats(cli.config.as_deref(), args),
    }
}

fn run_import(config_path: Option<&str>, args: ImportArgs) -> miette::Result<()> {
    let overrides = ConfigOverrides {
        source: args.source,
        store_path: args.store,
        database_path: args.database,
        api_base_url: args.api_base_url,
        abort_on_storage_error: args.abort_on_storage_error,
    };
    let resolved = ConfigLoader::resolve(config_path, &overrides)?;
    let store = open_store(&resolved.store_path)?;
    let retriever = build_retriever(&resolved)?;

    let importer = ObjectsImporter::new(retriever, store, resolved.source.into())
        .with_study_taxonomy(resolved.study_taxonomy.clone());
    let app = App::new(importer).abort_on_storage_error(resolved.abort_on_storage_error);

    let report = app.import_file(args.accessions.as_std_path(), &LogProgress)?;
    JsonOutput::print_report(&report).into_diagnostic()?;
    Ok(())
}

fn run_stats(config_path: Option<&str>, args: StatsArgs) -> miette::Result<()> {
    let overrides = ConfigOverrides {
        store_path: args.store,
        ..ConfigOverrides::default()
    };
    let config = ConfigLoader::load(config_path)?;
    let store_path = overrides
        .store_path
        .or_else(|| config.store.path.map(Utf8PathBuf::from))
        .unwrap_or_else(|| Utf8PathBuf::from(kira_metadata_loader::config::DEFAULT_STORE_PATH));
    let store = open_store(&store_path)?;
    JsonOutput::print_stats(&store.counts()?).into_diagnostic()?;
    Ok(())
}

fn open_store(path: &Utf8Path) -> Result<Store, KiraError> {
    Store::open(path).map_err(|err| KiraError::StoreOpen {
        path: path.to_string(),
        message: err.to_string(),
    })
}

fn build_retriever(resolved: &ResolvedConfig) -> Result<Box<dyn XmlRetriever>, KiraError> {
    match resolved.source {
        ImportSource::Api => Ok(Box::new(EnaApiRetriever::new(
            &resolved.api_base_url,
            resolved.api_timeout,
            resolved.api_max_retries,
        )?)),
        ImportSource::Database => {
            let path = resolved.database_path.as_deref().ok_or_else(|| {
                KiraError::ConfigParse("the database source requires a database path".to_string())
            })?;
            Ok(Box::new(DatabaseXmlRetriever::open(path)?))
        }
    }
}
