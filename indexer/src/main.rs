use anyhow::{Context, Result};
use bm25_core::cli::IndexArgs;
use bm25_core::persist::save_index;
use bm25_core::{QueryEngine, ScoredDoc};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, EnvFilter};

/// Input that ends an interactive search session.
const QUIT: &str = "QUIT";

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a BM25 index over a document corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from the corpus, replacing any persisted one
    Build {
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Interactive search; type QUIT to leave
    Search {
        #[command(flatten)]
        index: IndexArgs,
        /// Results shown per query
        #[arg(long, default_value_t = 15)]
        limit: usize,
    },
    /// Run a single query and print the ranking
    Query {
        #[command(flatten)]
        index: IndexArgs,
        /// Query text
        text: String,
        /// Results shown
        #[arg(long, default_value_t = 15)]
        limit: usize,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { index } => build(&index),
        Commands::Search { index, limit } => interactive(&open(&index)?, limit),
        Commands::Query { index, text, limit, json } => {
            let hits = open(&index)?.search(&text, Some(limit));
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                print_hits(&mut io::stdout().lock(), &hits)?;
            }
            Ok(())
        }
    }
}

fn open(args: &IndexArgs) -> Result<QueryEngine> {
    args.open().with_context(|| format!("opening index at {}", args.index.display()))
}

fn build(args: &IndexArgs) -> Result<()> {
    let stored = args.build().with_context(|| format!("indexing {}", args.corpus.display()))?;
    let meta = save_index(&args.paths(), &stored, args.format)?;
    tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, index = %args.index.display(), "index build complete");
    Ok(())
}

fn interactive(engine: &QueryEngine, limit: usize) -> Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    write!(out, "query> ")?;
    out.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let query = line.trim();
        if query == QUIT {
            break;
        }
        if !query.is_empty() {
            print_hits(&mut out, &engine.search(query, Some(limit)))?;
        }
        write!(out, "query> ")?;
        out.flush()?;
    }
    Ok(())
}

fn print_hits(out: &mut impl Write, hits: &[ScoredDoc]) -> io::Result<()> {
    writeln!(out, "{:>4}  {:>8}  {:>10}", "rank", "doc", "score")?;
    for (rank, hit) in hits.iter().enumerate() {
        writeln!(out, "{:>4}  {:>8}  {:>10.4}", rank + 1, hit.doc_id, hit.score)?;
    }
    Ok(())
}
