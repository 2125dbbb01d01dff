use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use wikidex_core::ingest::{ingest_path, IngestConfig};
use wikidex_core::persist::{load_index, load_manifest, manifest_path};
use wikidex_core::stopwords::StopwordSet;
use wikidex_core::tokenizer::{Normalized, Normalizer};
use wikidex_core::{Index, InvertedIndex};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query an inverted index over a wiki XML dump", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from an XML dump
    Build {
        /// Corpus XML file
        #[arg(long)]
        input: PathBuf,
        /// Output index file
        #[arg(long)]
        output: PathBuf,
        /// Stop-word file (whitespace separated, ends at __END__); bundled English list if omitted
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// Normalizer worker threads; defaults to available parallelism
        #[arg(long)]
        threads: Option<usize>,
        /// Mirror each document's raw tokens into this directory
        #[arg(long)]
        audit_dir: Option<PathBuf>,
        /// Log progress every N documents
        #[arg(long, default_value_t = 1000)]
        progress_every: u64,
    },
    /// Rank documents for one or more query words
    Query {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        k: usize,
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Print author and timestamp of a document by title
    Lookup {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        title: String,
    },
    /// Print document and term counts
    Info {
        #[arg(long)]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stopwords, threads, audit_dir, progress_every } => {
            let mut config = IngestConfig { audit_dir, progress_every, ..IngestConfig::default() };
            if let Some(t) = threads {
                config.threads = t;
            }
            build_index(&input, &output, stopwords.as_deref(), &config)
        }
        Commands::Query { index, stopwords, k, words } => {
            query(&index, stopwords.as_deref(), k, &words)
        }
        Commands::Lookup { index, title } => lookup(&index, &title),
        Commands::Info { index } => info(&index),
    }
}

fn load_stopwords(path: Option<&Path>) -> Result<StopwordSet> {
    match path {
        Some(p) => StopwordSet::from_path(p)
            .with_context(|| format!("reading stop words from {}", p.display())),
        None => Ok(StopwordSet::english()),
    }
}

fn open_index(path: &Path) -> Result<InvertedIndex> {
    load_index(path).with_context(|| format!("loading index {}", path.display()))
}

fn build_index(
    input: &Path,
    output: &Path,
    stopwords: Option<&Path>,
    config: &IngestConfig,
) -> Result<()> {
    let normalizer = Normalizer::english(load_stopwords(stopwords)?);
    let mut index = InvertedIndex::new();
    tracing::info!(input = %input.display(), threads = config.threads, "building index");

    let report = ingest_path(input, &normalizer, &mut index, config)
        .with_context(|| format!("loading corpus {}", input.display()))?;
    index
        .write_to_file(output)
        .with_context(|| format!("persisting index {}", output.display()))?;

    tracing::info!(
        output = %output.display(),
        num_docs = index.num_docs(),
        num_words = index.num_words(),
        postings = report.postings,
        excluded = report.reader.excluded,
        "index build complete"
    );
    Ok(())
}

fn query(path: &Path, stopwords: Option<&Path>, k: usize, words: &[String]) -> Result<()> {
    let normalizer = Normalizer::english(load_stopwords(stopwords)?);
    let mut terms = Vec::new();
    for raw in words.iter().flat_map(|w| w.split_whitespace()) {
        match normalizer.normalize(raw) {
            Normalized::Term(t) => terms.push(t),
            rejected => tracing::warn!(word = raw, ?rejected, "query word ignored"),
        }
    }
    if terms.is_empty() {
        bail!("no searchable words in query");
    }
    let index = open_index(path)?;
    let query: Vec<&str> = terms.iter().map(String::as_str).collect();

    let ranked = index.rank(&query);
    println!("{} matching documents for {:?}", ranked.len(), query);
    for (pos, id) in ranked.into_iter().take(k.max(1)).enumerate() {
        if let Some(doc) = index.document(id) {
            println!(
                "{:>3}. {} [{}, {}] score={}",
                pos + 1,
                doc.title,
                doc.author,
                doc.timestamp,
                index.relevance(id, &query)
            );
        }
    }
    Ok(())
}

fn lookup(path: &Path, title: &str) -> Result<()> {
    let index = open_index(path)?;
    match index.author_and_time_for_doc_named(title) {
        Some((author, timestamp)) => {
            println!("{title}\tauthor: {author}\ttimestamp: {timestamp}");
            Ok(())
        }
        None => bail!("no document titled {title:?}"),
    }
}

fn info(path: &Path) -> Result<()> {
    match load_manifest(&manifest_path(path)) {
        Ok(m) => {
            println!(
                "documents: {}\nterms: {}\ncreated: {}\nformat: v{}",
                m.num_docs, m.num_words, m.created_at, m.version
            );
        }
        Err(e) => {
            tracing::debug!(error = %e, "manifest unavailable, loading full index");
            let index = open_index(path)?;
            println!("documents: {}\nterms: {}", index.num_docs(), index.num_words());
        }
    }
    Ok(())
}
