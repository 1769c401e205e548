use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use invidex::{
    IndexSettings, Indexer, IndexerConfig, InvertedIndex, LogPageStore, PageKey, PageStore,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "invidex")]
#[command(about = "Compressed inverted index over a crawled page store", long_about = None)]
struct Args {
    /// Page store directory
    #[arg(long, env = "INVIDEX_DB", default_value = "./pages")]
    db: PathBuf,

    /// Gamma-compress postings after ingestion
    #[arg(
        long,
        env = "INVIDEX_COMPRESSION",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    compression: bool,

    /// Persisted index file; loaded when present, otherwise built and saved
    #[arg(long, env = "INVIDEX_INDEX")]
    index: Option<PathBuf>,

    /// Pages fetched from the store per batch
    #[arg(long, env = "INVIDEX_BATCH_SIZE", default_value = "1000")]
    batch_size: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a conjunctive query and print matching URLs
    Search { query: String },
    /// Load `url<TAB>text` lines into the page store
    Import { tsv: PathBuf },
    /// Print index statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Starting invidex v{}", invidex::VERSION);

    let mut store = LogPageStore::open(&args.db)
        .with_context(|| format!("failed to open page store {:?}", args.db))?;

    match &args.command {
        Command::Search { query } => {
            println!("Pages in store: {}", store.len());
            let index = build_index(&args, &store)?;

            let hits = index.search(query)?;
            let keys = hits
                .iter()
                .map(|id| id.parse::<PageKey>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("index holds a non-numeric page key")?;
            let urls = store.lookup_many(&keys)?;

            if urls.is_empty() {
                println!("No results");
            } else {
                for url in &urls {
                    println!("{}", url);
                }
            }
            println!("{} results", urls.len());
        }
        Command::Import { tsv } => {
            let before = store.len();
            import_tsv(&mut store, tsv)?;
            store.persist()?;
            println!("Imported {} pages ({} total)", store.len() - before, store.len());
        }
        Command::Stats { json } => {
            let index = build_index(&args, &store)?;
            let stats = index.stats();
            if *json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Mode: {:?}", stats.mode);
                println!("Documents: {}", stats.documents);
                println!("Terms: {}", stats.terms);
                println!("Postings: {}", stats.postings);
                println!("Postings bytes: {}", stats.postings_bytes);
                println!("Raw postings bytes: {}", stats.raw_postings_bytes);
                println!("Compression ratio: {:.2}", stats.compression_ratio());
            }
        }
    }

    Ok(())
}

fn build_index(args: &Args, store: &LogPageStore) -> Result<InvertedIndex> {
    if let Some(path) = args.index.as_deref().filter(|p| p.exists()) {
        let index = InvertedIndex::open(path)
            .with_context(|| format!("failed to load index {:?}", path))?;
        info!(documents = index.len(), "Loaded persisted index from {:?}", path);
        return Ok(index);
    }

    let settings = IndexSettings::default().with_compression(args.compression);
    let config = IndexerConfig {
        batch_size: args.batch_size,
        ..IndexerConfig::default()
    };
    let mut indexer = Indexer::new(settings, config);
    let report = indexer.process_store(store)?;
    info!(
        "Indexed {} pages in {:?}",
        report.indexed, report.elapsed
    );

    let index = indexer.into_index();
    if let Some(path) = &args.index {
        index
            .save(path)
            .with_context(|| format!("failed to save index {:?}", path))?;
        info!("Saved index to {:?}", path);
    }
    Ok(index)
}

fn import_tsv(store: &mut LogPageStore, path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once('\t') {
            Some((url, text)) => store.insert(url, text)?,
            None => warn!(line = lineno + 1, "skipping line without a tab separator"),
        }
    }
    Ok(())
}
