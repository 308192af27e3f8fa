//! Command-line flags shared by the binaries that open an index.

use crate::bm25::{Bm25Params, LogBase};
use crate::error::Result;
use crate::persist::{IndexFormat, IndexPaths, StoredIndex};
use crate::query::QueryEngine;
use crate::tokenizer::{Analyzer, Stopwords};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct IndexArgs {
    /// Corpus file: records separated by a line of asterisks
    #[arg(long, env = "BM25_CORPUS", default_value = "./lisa/lisa.all.txt")]
    pub corpus: PathBuf,
    /// Stopword file, one term per line (built-in English list when absent)
    #[arg(long, env = "BM25_STOPWORDS")]
    pub stopwords: Option<PathBuf>,
    /// Index directory
    #[arg(long, env = "BM25_INDEX_DIR", default_value = "./index")]
    pub index: PathBuf,
    /// Term-frequency saturation
    #[arg(long, default_value_t = 1.0)]
    pub k: f64,
    /// Length normalization strength
    #[arg(long, default_value_t = 0.75)]
    pub b: f64,
    /// Logarithm base for idf: 2, 10 or e
    #[arg(long, default_value_t = LogBase::Two)]
    pub log_base: LogBase,
    /// Weight file encoding: json or bincode
    #[arg(long, default_value_t = IndexFormat::Json)]
    pub format: IndexFormat,
}

impl IndexArgs {
    pub fn params(&self) -> Bm25Params {
        Bm25Params { k: self.k, b: self.b, log_base: self.log_base }
    }

    pub fn paths(&self) -> IndexPaths { IndexPaths::new(&self.index) }

    pub fn analyzer(&self) -> Result<Analyzer> {
        let stopwords = match &self.stopwords {
            Some(path) => Stopwords::load(path)?,
            None => Stopwords::builtin(),
        };
        Ok(Analyzer::english(stopwords))
    }

    /// Reuse or build the index these flags describe.
    pub fn open(&self) -> Result<QueryEngine> {
        QueryEngine::open_or_build(self.analyzer()?, &self.corpus, &self.paths(), self.params(), self.format)
    }

    /// Build from the corpus regardless of what is persisted.
    pub fn build(&self) -> Result<StoredIndex> {
        let analyzer = self.analyzer()?;
        let params = self.params();
        let weights = QueryEngine::build(&analyzer, &self.corpus, params)?;
        Ok(StoredIndex { params, stopwords: analyzer.stopwords().fingerprint(), weights })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        index: IndexArgs,
    }

    #[test]
    fn flags_map_onto_params() {
        let cli = Cli::parse_from(["test", "--k", "1.2", "--b", "0.5", "--log-base", "10", "--format", "bincode"]);
        assert_eq!(cli.index.params(), Bm25Params { k: 1.2, b: 0.5, log_base: LogBase::Ten });
        assert_eq!(cli.index.format, IndexFormat::Bincode);
        assert!(cli.index.stopwords.is_none());
    }
}
