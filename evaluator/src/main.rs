use anyhow::{Context, Result};
use bm25_core::cli::IndexArgs;
use bm25_core::metrics::{evaluate, EvalConfig, EvaluationReport};
use bm25_core::predictions::{ranked_list, read_predictions, save_predictions, Predictions};
use bm25_core::queries::read_queries;
use bm25_core::relevance::read_relevance;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "evaluator")]
#[command(about = "Replay a query set against the BM25 index and score the rankings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every query in a query-set file and write ranked predictions
    Run {
        /// Query-set file
        #[arg(long)]
        queries: PathBuf,
        /// Predictions output file
        #[arg(long, default_value = "./predictions.txt")]
        output: PathBuf,
        /// Results kept per query
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Score a predictions file against relevance judgments
    Score {
        /// Relevance judgments file
        #[arg(long)]
        relevance: PathBuf,
        /// Predictions file written by `run`
        #[arg(long, default_value = "./predictions.txt")]
        predictions: PathBuf,
        /// Cut-off for precision at N
        #[arg(long, default_value_t = 10)]
        precision_at: usize,
        /// Recall level R-precision must exceed
        #[arg(long, default_value_t = 0.4)]
        r_threshold: f64,
        /// Emit the full report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Include one line per query
        #[arg(long, default_value_t = false)]
        per_query: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { queries, output, limit, index } => {
            let engine = index.open().with_context(|| format!("opening index at {}", index.index.display()))?;
            let queries = read_queries(&queries).with_context(|| format!("reading queries from {}", queries.display()))?;
            let predictions: Predictions = queries
                .iter()
                .map(|q| (q.id, ranked_list(&engine.search(&q.text, Some(limit)))))
                .collect();
            tracing::info!(num_queries = predictions.len(), limit, "replayed query set");
            save_predictions(&output, &predictions)?;
            Ok(())
        }
        Commands::Score { relevance, predictions, precision_at, r_threshold, json, per_query } => {
            let judgments = read_relevance(&relevance).with_context(|| format!("reading judgments from {}", relevance.display()))?;
            let predictions = read_predictions(&predictions).with_context(|| format!("reading predictions from {}", predictions.display()))?;
            let report = evaluate(&judgments, &predictions, &EvalConfig { precision_at, r_threshold });
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, per_query);
            }
            Ok(())
        }
    }
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn print_report(report: &EvaluationReport, per_query: bool) {
    let p_at = format!("P@{}", report.config.precision_at);
    if per_query {
        println!("{:>6}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}", "query", "precision", "recall", p_at, "R-prec", "AP");
        for (query, m) in &report.per_query {
            println!(
                "{:>6}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}",
                query,
                cell(m.precision),
                cell(m.recall),
                cell(m.precision_at_n),
                cell(m.r_precision),
                cell(m.average_precision)
            );
        }
        println!();
    }
    let mean = &report.mean;
    println!("queries evaluated: {} (excluded {})", report.per_query.len(), report.excluded.len());
    println!("precision:   {:.4}", mean.precision);
    println!("recall:      {:.4}", mean.recall);
    println!("{p_at:<12} {:.4}", mean.precision_at_n);
    println!("R-precision: {:.4} (recall > {})", mean.r_precision, report.config.r_threshold);
    println!("MAP:         {:.4}", mean.map);
}
