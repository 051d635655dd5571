use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use outreach_common::config::{
    parse_delay, DEFAULT_BATCH_SIZE, DEFAULT_MODEL, DEFAULT_PER_TYPE,
};
use outreach_common::{default_cities, load_city_file, CitySeed, Config};
use outreach_scout::dedup::DedupIndex;
use outreach_scout::enrichment::{Enricher, EnrichmentSettings};
use outreach_scout::llm::{OpenAiGenerator, OpenAiReconciler};
use outreach_scout::matcher::CityMatcher;
use outreach_scout::pipeline::{merge_dataset, GenerationCoordinator, GenerationSettings};
use outreach_scout::store::FsShardStore;

const MAX_COMPLETION_TOKENS: u32 = 16_384;

#[derive(Parser)]
#[command(name = "outreach-scout", about = "Build a deduplicated outreach contact directory")]
#[command(version)]
struct Cli {
    /// City tokens to generate for (fuzzy-matched); all known cities when omitted
    #[arg(long, num_args = 1..)]
    cities: Vec<String>,

    /// JSON city list replacing the built-in seed list
    #[arg(long)]
    cities_file: Option<PathBuf>,

    /// Root directory for shard files
    #[arg(long, default_value = "out")]
    out: PathBuf,

    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Contacts requested per (city, partner type) shard
    #[arg(long, default_value_t = DEFAULT_PER_TYPE)]
    per_type: usize,

    /// Seconds to wait after each generation call
    #[arg(long, default_value = "0.6", value_parser = parse_delay)]
    delay: Duration,

    /// Model calls per shard while the shard is short of --per-type records
    #[arg(long, default_value_t = 1)]
    max_attempts: usize,

    /// Merge every shard into one deduplicated file and exit
    #[arg(long)]
    merge: bool,

    #[arg(long, default_value = "merged_contacts.csv")]
    merge_output: PathBuf,

    /// Fill in missing Twitter handles across all shards
    #[arg(long)]
    enrich: bool,

    /// Fill in missing Twitter handles in a single contacts file
    #[arg(long, conflicts_with = "enrich")]
    enrich_file: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seconds to wait between enrichment batches
    #[arg(long, default_value = "1.0", value_parser = parse_delay)]
    enrich_delay: Duration,

    /// Print the known city slugs and exit
    #[arg(long)]
    list_cities: bool,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        config.model = self.model.clone();
        config.output_root = self.out.clone();
        config.per_type = self.per_type;
        config.max_attempts = self.max_attempts;
        config.generation_delay = self.delay;
        config.merge_output = self.merge_output.clone();
        config.batch_size = self.batch_size;
        config.enrichment_delay = self.enrich_delay;
        config
    }

    fn seeds(&self) -> Result<Vec<CitySeed>> {
        Ok(match &self.cities_file {
            Some(path) => load_city_file(path)?,
            None => default_cities(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("outreach=info".parse()?))
        .init();

    let cli = Cli::parse();

    if cli.list_cities {
        let matcher = CityMatcher::new(cli.seeds()?);
        for slug in matcher.known_slugs() {
            println!("{slug}");
        }
        return Ok(());
    }

    if cli.merge {
        let config = cli.apply(Config::offline());
        config.validate()?;
        config.log_redacted();

        let store = FsShardStore::new(&config.output_root);
        let stats = merge_dataset(&store, &config.merge_output)?;
        println!("{stats}");
        return Ok(());
    }

    if cli.enrich || cli.enrich_file.is_some() {
        let config = cli.apply(Config::from_env()?);
        config.validate()?;
        config.log_redacted();

        let reconciler = OpenAiReconciler::new(openai(&config));
        let enricher = Enricher::new(
            &reconciler,
            EnrichmentSettings {
                batch_size: config.batch_size,
                delay: config.enrichment_delay,
            },
        );
        let stats = match &cli.enrich_file {
            Some(path) => enricher.enrich_file(path).await?,
            None => enricher.enrich_shards(&FsShardStore::new(&config.output_root)).await?,
        };
        println!("{stats}");
        return Ok(());
    }

    // Resolve the selection before anything touches the network or disk.
    let cities = CityMatcher::new(cli.seeds()?).resolve(&cli.cities)?;

    let config = cli.apply(Config::from_env()?);
    config.validate()?;
    config.log_redacted();

    info!(cities = cities.len(), "Outreach scout starting");

    let store = FsShardStore::new(&config.output_root);
    let index = DedupIndex::from_store(&store)?;
    let generator = OpenAiGenerator::new(openai(&config));
    let coordinator = GenerationCoordinator::new(
        &store,
        &generator,
        GenerationSettings {
            per_type: config.per_type,
            max_attempts: config.max_attempts,
            delay: config.generation_delay,
        },
    );

    let (_, stats) = coordinator.run(&cities, index).await;
    println!("{stats}");

    Ok(())
}

fn openai(config: &Config) -> OpenAi {
    OpenAi::new(&config.openai_api_key, &config.model)
        .with_max_completion_tokens(MAX_COMPLETION_TOKENS)
}
