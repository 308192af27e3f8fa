use crate::bm25::{build_index, Bm25Params};
use crate::corpus::read_corpus;
use crate::error::Result;
use crate::index::Bm25Index;
use crate::persist::{load_index, save_index, IndexFormat, IndexPaths, StoredIndex};
use crate::stats::CorpusStats;
use crate::tokenizer::{Analyzer, EnglishStemmer, TermStemmer};
use crate::DocId;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// Score descending; equal scores fall back to ascending document id.
fn rank_order(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Sum each document's weights over the query terms and rank every document.
pub fn rank(index: &Bm25Index, terms: &BTreeSet<String>) -> Vec<ScoredDoc> {
    let mut scored: Vec<ScoredDoc> = index
        .documents()
        .map(|(doc_id, weights)| ScoredDoc {
            doc_id,
            score: terms.iter().filter_map(|t| weights.get(t)).sum(),
        })
        .collect();
    scored.sort_by(rank_order);
    scored
}

pub struct QueryEngine<S = EnglishStemmer> {
    analyzer: Analyzer<S>,
    index: Bm25Index,
}

impl<S: TermStemmer> QueryEngine<S> {
    pub fn new(analyzer: Analyzer<S>, index: Bm25Index) -> Self {
        Self { analyzer, index }
    }

    /// Reuse the persisted index under `paths` when it was built with `params`
    /// and the analyzer's stopword set; otherwise analyze `corpus`, build, and
    /// persist a fresh one.
    pub fn open_or_build(
        analyzer: Analyzer<S>,
        corpus: &Path,
        paths: &IndexPaths,
        params: Bm25Params,
        format: IndexFormat,
    ) -> Result<Self> {
        let stopwords = analyzer.stopwords().fingerprint();
        if paths.meta().exists() {
            let (stored, _) = load_index(paths)?;
            if stored.built_with(&params, &stopwords) {
                return Ok(Self::new(analyzer, stored.weights));
            }
            tracing::warn!(
                stored = ?stored.params,
                requested = ?params,
                stopwords_changed = stored.stopwords != stopwords,
                "persisted index was built with other settings; rebuilding"
            );
        } else {
            tracing::info!(path = %paths.root.display(), "no complete persisted index; building");
        }
        let weights = Self::build(&analyzer, corpus, params)?;
        let stored = StoredIndex { params, stopwords, weights };
        save_index(paths, &stored, format)?;
        Ok(Self::new(analyzer, stored.weights))
    }

    pub fn build(analyzer: &Analyzer<S>, corpus: &Path, params: Bm25Params) -> Result<Bm25Index> {
        let docs = read_corpus(corpus)?;
        let stats = CorpusStats::accumulate(&docs, analyzer)?;
        build_index(&stats, &params)
    }

    /// Distinct analyzed terms; repeating a word does not boost it.
    pub fn query_terms(&self, text: &str) -> BTreeSet<String> {
        self.analyzer.terms(text).into_iter().collect()
    }

    /// Every document ranked, truncated to `limit` after sorting.
    pub fn search(&self, text: &str, limit: Option<usize>) -> Vec<ScoredDoc> {
        let terms = self.query_terms(text);
        let mut ranked = rank(&self.index, &terms);
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        tracing::debug!(query = text, num_terms = terms.len(), returned = ranked.len(), "ran query");
        ranked
    }

    pub fn index(&self) -> &Bm25Index { &self.index }
}
