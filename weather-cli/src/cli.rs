use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use weather_core::{
    CityName, Config, PipelineRunner, ProviderId, SnapshotStore,
    provider::provider_from_config,
    store::{MemoryObjectStore, S3ObjectStore},
};

use crate::{chart, output, prompt};

/// Bucket name used by `--dry-run` when none is configured.
const DRY_RUN_BUCKET: &str = "dry-run";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Fetch weather per city and archive snapshots to S3")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch weather for each city and save one snapshot per city.
    Run(RunArgs),

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Create the configured bucket if it does not exist yet.
    EnsureBucket,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Provider to use: "openweather" (current) or "weatherapi" (forecast).
    #[arg(long)]
    pub provider: Option<String>,

    /// City to fetch; repeat for several. Replaces the configured list.
    #[arg(long = "city", value_name = "NAME")]
    pub cities: Vec<String>,

    /// Don't ask whether to add another city.
    #[arg(short, long)]
    pub yes: bool,

    /// Fetch only; write nothing.
    #[arg(long)]
    pub no_store: bool,

    /// Write snapshots to an in-memory bucket and list the keys instead of using S3.
    #[arg(long, conflicts_with = "no_store")]
    pub dry_run: bool,

    /// Print a temperature bar chart after the run.
    #[arg(long)]
    pub chart: bool,

    /// Exit with an error if any city failed.
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Run(args) => run_pipeline(args).await,
            Command::Configure { provider } => configure(&provider),
            Command::EnsureBucket => {
                let config = Config::from_env()?;
                let bucket = config.bucket()?;
                let backend = S3ObjectStore::connect(config.region()).await;
                let store = SnapshotStore::new(Box::new(backend), bucket, config.region());
                store
                    .ensure_bucket()
                    .await
                    .with_context(|| format!("Could not ensure bucket '{bucket}'"))?;
                println!("Bucket {} is ready in {}", store.bucket(), store.region());
                Ok(())
            }
        }
    }
}

fn resolve_provider(requested: Option<&str>, config: &Config) -> Result<ProviderId> {
    match requested.or(config.default_provider.as_deref()) {
        Some(name) => ProviderId::try_from(name),
        None => Ok(ProviderId::OpenWeather),
    }
}

fn resolve_cities(args: &RunArgs, config: &Config) -> Result<Vec<CityName>> {
    if !args.cities.is_empty() {
        return CityName::parse_all(args.cities.iter().cloned());
    }

    let mut cities = config.cities()?;
    if !args.yes {
        prompt::offer_extra_city(&mut cities)?;
    }
    Ok(cities)
}

async fn run_pipeline(args: RunArgs) -> Result<()> {
    let config = Config::from_env()?;

    let provider_id = resolve_provider(args.provider.as_deref(), &config)?;
    let provider = provider_from_config(provider_id, &config)?;
    let cities = resolve_cities(&args, &config)?;

    let dry_run_backend = MemoryObjectStore::new();
    let store = if args.no_store {
        None
    } else if args.dry_run {
        let bucket = config.storage.bucket.as_deref().unwrap_or(DRY_RUN_BUCKET);
        Some(SnapshotStore::new(Box::new(dry_run_backend.clone()), bucket, config.region()))
    } else {
        let bucket = config.bucket()?;
        let backend = S3ObjectStore::connect(config.region()).await;
        Some(SnapshotStore::new(Box::new(backend), bucket, config.region()))
    };

    if let Some(store) = &store {
        // Snapshot writes will report their own failures.
        if let Err(e) = store.ensure_bucket().await {
            tracing::warn!(error = %e, "continuing without a confirmed bucket");
        }
    }

    let mut runner = PipelineRunner::new(provider.as_ref());
    if let Some(store) = &store {
        runner = runner.with_store(store);
    }
    let result = runner.run(&cities).await;

    let bucket = store.as_ref().map(SnapshotStore::bucket);
    for outcome in &result.outcomes {
        println!("{}", output::render_outcome(outcome, bucket));
    }

    if args.chart {
        print!("{}", chart::render(&chart::bars(&result.outcomes)));
        println!();
    }

    if args.dry_run {
        let bucket = bucket.unwrap_or(DRY_RUN_BUCKET);
        println!("Dry run: {} object(s) would be written", dry_run_backend.keys(bucket).len());
        for key in dry_run_backend.keys(bucket) {
            println!("  s3://{bucket}/{key}");
        }
    }

    println!("{}", result.summary());
    println!("{}", result.message());

    if args.strict && !result.all_succeeded() {
        anyhow::bail!("{} of {} cities failed", result.failures(), result.outcomes.len());
    }

    Ok(())
}

fn configure(provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;

    // Start from the file alone so values from the environment are not persisted.
    let mut config = Config::load()?;
    if config.is_provider_configured(id) {
        println!("Replacing the existing API key for {id}");
    }

    let key = prompt::api_key(id)?;
    config.upsert_provider_api_key(id, key);

    if config.default_provider_id().ok() != Some(id) && prompt::make_default(id)? {
        config.set_default_provider(id);
    }

    let path = config.save()?;
    println!("Saved {id} credentials to {}", path.display());
    Ok(())
}
