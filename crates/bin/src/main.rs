//! Fare CLI binary.
//!
//! Runs the pipeline stages one at a time: load raw months, process them
//! into train and test sets, train and register a model, summarise the
//! sets, and serve predictions.

mod integration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use fare::ProjectConfig;
use fare_data::{BlobStore, NycTaxiFetcher, months_ago};
use fare_features::{DataProcessor, SplitConfig};
use fare_model::{ModelTrainer, Tags};
use fare_output::{DataSummaryReport, ExportFormat, Exporter};
use fare_serve::{AppState, ServeConfig};
use indicatif::{ProgressBar, ProgressStyle};
use integration::loader::{LoadSummary, load_months};
use integration::paths;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "fare")]
#[command(about = "Fare: taxi fare feature pipeline and prediction service", long_about = None)]
#[command(version)]
struct Cli {
    /// Project configuration file
    #[arg(long, global = true, default_value = "project-config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every configured year and month into the raw bucket
    LoadData {
        /// Download from a mirror instead of the TLC host
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Load the month published `--days-back` days ago
    LoadMonthly {
        /// Days before today
        #[arg(long, default_value = "90")]
        days_back: i64,

        /// Download from a mirror instead of the TLC host
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Build features from the raw bucket and write train and test sets
    Process {
        /// Fraction of rows held out
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Shuffle seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Train, evaluate and register a model
    Train {
        /// Commit the model is trained from
        #[arg(long)]
        git_sha: String,

        /// Branch the model is trained from
        #[arg(long)]
        git_branch: String,
    },

    /// Compare the train set (reference) with the test set (current)
    Report {
        /// Write to a file; format follows the extension (.json, .csv, .md)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Serve predictions from the latest registered model
    Serve {
        /// Bind host, overrides API_HOST
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides API_PORT
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fare=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> CliResult {
    let cli = Cli::parse();
    let config = ProjectConfig::from_yaml(&cli.config)?;
    info!(
        config = %cli.config.display(),
        experiment = %config.experiment_name,
        "Loaded project configuration"
    );

    match cli.command {
        Commands::LoadData { base_url } => load_data(&config, base_url).await?,
        Commands::LoadMonthly {
            days_back,
            base_url,
        } => load_monthly(&config, days_back, base_url).await?,
        Commands::Process { test_size, seed } => {
            process_data(&config, SplitConfig { test_size, seed })?;
        }
        Commands::Train {
            git_sha,
            git_branch,
        } => train_model(&config, Tags::new(git_sha, git_branch))?,
        Commands::Report { output } => create_report(&config, output.as_deref())?,
        Commands::Serve { host, port } => serve(&config, host, port).await?,
    }

    Ok(())
}

fn fetcher(config: &ProjectConfig, base_url: Option<String>) -> CliResult<NycTaxiFetcher> {
    let fetcher = NycTaxiFetcher::new(&config.taxi_type)?;
    Ok(match base_url {
        Some(url) => fetcher.with_base_url(url),
        None => fetcher,
    })
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb
}

fn finish(pb: &ProgressBar, summary: LoadSummary) -> CliResult {
    pb.finish_with_message(format!(
        "{} uploaded, {} skipped, {} failed",
        summary.uploaded.len(),
        summary.skipped.len(),
        summary.failed.len()
    ));

    if summary.is_success() {
        return Ok(());
    }
    let failed: Vec<String> = summary
        .failed
        .iter()
        .map(|(name, e)| format!("{name}: {e}"))
        .collect();
    Err(format!("failed to load {}", failed.join("; ")).into())
}

async fn load_data(config: &ProjectConfig, base_url: Option<String>) -> CliResult {
    let fetcher = fetcher(config, base_url)?;
    let store = paths::open_bucket(&config.raw_data_bucket);
    let months = config.months();

    info!(
        bucket = %config.raw_data_bucket,
        dir = %store.dir().display(),
        months = months.len(),
        "Loading raw trip data"
    );

    let pb = progress_bar(months.len() as u64);
    let summary = load_months(&fetcher, &store, &months, &config.raw_schema, Some(&pb)).await;
    finish(&pb, summary)
}

async fn load_monthly(
    config: &ProjectConfig,
    days_back: i64,
    base_url: Option<String>,
) -> CliResult {
    let fetcher = fetcher(config, base_url)?;
    let store = paths::open_bucket(&config.raw_data_bucket);
    let month = months_ago(Utc::now().date_naive(), days_back);

    info!(year = month.0, month = month.1, days_back, "Loading monthly trip data");

    let pb = progress_bar(1);
    let summary = load_months(&fetcher, &store, &[month], &config.raw_schema, Some(&pb)).await;
    if !summary.is_success() {
        warn!(
            year = month.0,
            month = month.1,
            "Data might not be published yet for this month"
        );
    }
    finish(&pb, summary)
}

fn process_data(config: &ProjectConfig, split: SplitConfig) -> CliResult {
    let raw_store = paths::open_bucket(&config.raw_data_bucket);
    let processed_store = paths::open_bucket(&config.processed_data_bucket);

    let raw = raw_store.read_many(&config.taxi_type)?;
    let processor = DataProcessor::new(config.feature_config());
    let mut partitions = processor.run(raw, split)?;

    processed_store.upload(&mut partitions.train, &config.train_file_name)?;
    processed_store.upload(&mut partitions.test, &config.test_file_name)?;

    println!(
        "Wrote {} train and {} test rows to bucket {}",
        partitions.train.height(),
        partitions.test.height(),
        config.processed_data_bucket
    );
    Ok(())
}

fn train_model(config: &ProjectConfig, tags: Tags) -> CliResult {
    let processed_store = paths::open_bucket(&config.processed_data_bucket);
    let train_set = processed_store.read_one(&config.train_file_name)?;
    let test_set = processed_store.read_one(&config.test_file_name)?;

    let store = paths::open_tracking_store()?;
    let mut trainer = ModelTrainer::new(train_set, test_set, config.trainer_config(), tags);
    let outcome = trainer.train(&store)?;
    let version = trainer.register_model(&store)?;

    println!("Run:     {}", outcome.run_id);
    for (name, value) in outcome.metrics.as_pairs() {
        println!("{name:<8} {value:.4}");
    }
    println!("Model:   {} version {}", version.name, version.version);
    println!("Source:  {}", version.source_uri());
    Ok(())
}

fn create_report(config: &ProjectConfig, output: Option<&Path>) -> CliResult {
    let processed_store = paths::open_bucket(&config.processed_data_bucket);
    let reference = processed_store.read_one(&config.train_file_name)?;
    let current = processed_store.read_one(&config.test_file_name)?;

    let report = DataSummaryReport::build(&reference, &current, &config.data_definition())?;

    match output {
        Some(path) => {
            let format = ExportFormat::from_path(path)?;
            report.export_to_file(path, format)?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{}", report.to_markdown()),
    }
    Ok(())
}

async fn serve(config: &ProjectConfig, host: Option<String>, port: Option<u16>) -> CliResult {
    let mut serve_config = ServeConfig::from_env(paths::tracking_db_path(), config.model_name());
    if let Some(host) = host {
        serve_config.host = host;
    }
    if let Some(port) = port {
        serve_config.port = port;
    }

    let state = {
        let store = paths::open_tracking_store()?;
        AppState::from_registry(&store, &serve_config).unwrap_or_else(|e| {
            warn!(error = %e, model = %serve_config.model_name, "Serving without a model");
            AppState::new()
        })
    };

    fare_serve::serve(&serve_config, Arc::new(state)).await?;
    Ok(())
}
