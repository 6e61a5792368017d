//! cordsift: semantic sentence search over CORD-19 papers stored in MongoDB.

mod config;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bson::Bson;
use clap::{Args, Parser, Subcommand};
use futures::TryStreamExt;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cordsift_db::{parse_projection, search_collections, text_units, Database, Filter, ReshapeMode};
use cordsift_embed::BertEmbedder;
use cordsift_scan::{Sentencizer, SimilarityScanner, StdoutSink};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "cordsift",
    version,
    about = "Find sentences in CORD-19 papers that are semantically close to a query"
)]
struct Cli {
    /// Config file (default: $CORDSIFT_CONFIG, then ./cordsift.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every sentence whose similarity to the query exceeds the threshold (default)
    Scan(ScanArgs),
    /// Print raw documents matching a filter across all collections
    Search(SearchArgs),
}

#[derive(Args, Debug, Default)]
struct ScanArgs {
    /// Query sentence
    #[arg(long)]
    query: Option<String>,

    /// Report sentences scoring strictly above this cosine similarity
    #[arg(long)]
    threshold: Option<f32>,

    /// MongoDB query document (JSON) applied to every collection
    #[arg(long)]
    filter: Option<String>,

    /// How papers are reshaped into text units (single_pass or parallel)
    #[arg(long)]
    reshape: Option<ReshapeMode>,

    /// Prefix each match with its score
    #[arg(long, default_value_t = false)]
    show_score: bool,

    /// Append the paper id to each match
    #[arg(long, default_value_t = false)]
    show_paper_id: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// MongoDB query document (JSON)
    #[arg(long)]
    filter: String,

    /// MongoDB projection document (JSON)
    #[arg(long)]
    projection: Option<String>,
}

impl ScanArgs {
    fn apply(self, config: &mut Config) {
        if let Some(query) = self.query {
            config.scan.query = query;
        }
        if let Some(threshold) = self.threshold {
            config.scan.threshold = threshold;
        }
        if let Some(filter) = self.filter {
            config.scan.filter = Some(filter);
        }
        if let Some(reshape) = self.reshape {
            config.database.reshape = reshape;
        }
        config.output.show_score |= self.show_score;
        config.output.show_paper_id |= self.show_paper_id;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cordsift=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or_else(|| Command::Scan(ScanArgs::default())) {
        Command::Scan(args) => {
            args.apply(&mut config);
            config.validate()?;
            run_scan(config).await
        }
        Command::Search(args) => run_search(&config, args).await,
    }
}

async fn run_scan(config: Config) -> anyhow::Result<()> {
    info!("cordsift {}", env!("CARGO_PKG_VERSION"));
    let filter = config.scan_filter()?;

    let embedder = BertEmbedder::load(config.embedding.clone())
        .await
        .context("Failed to load embedding model")?;
    let scanner = SimilarityScanner::new(
        embedder,
        &config.scan,
        Sentencizer::new(&config.sentencizer),
    )?;

    let db = connect(&config).await?;
    let units = text_units(db, filter, config.database.reshape).await?;

    let mut sink = StdoutSink::stdout(config.output);
    let summary = scanner.scan(units, &mut sink).await?;
    info!(
        "Scanned {} sentences in {} text units, {} above {}",
        summary.sentences, summary.units, summary.matches, config.scan.threshold
    );
    Ok(())
}

async fn run_search(config: &Config, args: SearchArgs) -> anyhow::Result<()> {
    let filter = Filter::parse_json(&args.filter).context("Invalid --filter")?;
    let projection = args
        .projection
        .as_deref()
        .map(parse_projection)
        .transpose()
        .context("Invalid --projection")?;

    let db = connect(config).await?;
    let mut hits = search_collections(db, filter, projection).await?;

    let mut out = std::io::stdout().lock();
    let mut count = 0usize;
    while let Some(hit) = hits.try_next().await? {
        let document = Bson::Document(hit.document).into_relaxed_extjson();
        writeln!(out, "{}", json!({ "collection": hit.collection, "document": document }))?;
        count += 1;
    }
    out.flush()?;
    info!("{} documents matched", count);
    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<Arc<Database>> {
    info!(uri = %config.database.uri, database = %config.database.name, "Connecting to MongoDB");
    let db = Database::connect(&config.database.uri, &config.database.name)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database.uri))?;
    Ok(Arc::new(db))
}
