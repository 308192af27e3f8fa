//! BM25 weight computation.
//!
//! For a term with frequency `tf` in a document of length `dl`:
//!
//! ```text
//! saturated = tf * (k + 1) / (tf + k * ((1 - b) + b * dl / avgdl))
//! idf       = log((N - df + 0.5) / (df + 0.5))
//! weight    = saturated * idf
//! ```
//!
//! Terms in more than half of the corpus get a negative idf; the weight is kept as is.

use crate::error::{Error, Result};
use crate::index::Bm25Index;
use crate::stats::CorpusStats;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogBase {
    #[default]
    Two,
    Ten,
    E,
}

impl LogBase {
    pub fn log(self, x: f64) -> f64 {
        match self {
            LogBase::Two => x.log2(),
            LogBase::Ten => x.log10(),
            LogBase::E => x.ln(),
        }
    }
}

impl fmt::Display for LogBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogBase::Two => "2",
            LogBase::Ten => "10",
            LogBase::E => "e",
        })
    }
}

impl FromStr for LogBase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "2" | "two" => Ok(LogBase::Two),
            "10" | "ten" => Ok(LogBase::Ten),
            "e" | "ln" => Ok(LogBase::E),
            other => Err(format!("unsupported log base {other:?} (expected 2, 10 or e)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k: f64,
    /// Length normalization strength.
    pub b: f64,
    #[serde(default)]
    pub log_base: LogBase,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k: 1.0, b: 0.75, log_base: LogBase::Two }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<()> {
        if !self.k.is_finite() || self.k < 0.0 {
            return Err(Error::InvalidParams { reason: format!("k must be a finite non-negative number, got {}", self.k) });
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidParams { reason: format!("b must lie in [0, 1], got {}", self.b) });
        }
        Ok(())
    }

    pub fn idf(&self, df: u32, num_docs: usize) -> f64 {
        let n = num_docs as f64;
        let df = f64::from(df);
        self.log_base.log((n - df + 0.5) / (df + 0.5))
    }

    pub fn saturated_tf(&self, tf: u32, doc_len: u32, avg_doc_len: f64) -> f64 {
        let tf = f64::from(tf);
        let norm = (1.0 - self.b) + self.b * f64::from(doc_len) / avg_doc_len;
        tf * (self.k + 1.0) / (tf + self.k * norm)
    }

    pub fn weight(&self, tf: u32, doc_len: u32, avg_doc_len: f64, df: u32, num_docs: usize) -> f64 {
        self.saturated_tf(tf, doc_len, avg_doc_len) * self.idf(df, num_docs)
    }
}

/// Weight every (document, term) pair with a nonzero frequency.
pub fn build_index(stats: &CorpusStats, params: &Bm25Params) -> Result<Bm25Index> {
    params.validate()?;
    let avg_doc_len = stats.average_document_length()?;
    let num_docs = stats.document_count();

    let index = stats
        .documents
        .iter()
        .map(|(&doc_id, doc)| -> Result<(DocId, BTreeMap<String, f64>)> {
            let weights = doc
                .term_frequencies
                .iter()
                .map(|(term, &tf)| match stats.document_frequency.get(term) {
                    Some(&df) if df > 0 => Ok((term.clone(), params.weight(tf, doc.length, avg_doc_len, df, num_docs))),
                    _ => Err(Error::InconsistentStats { doc_id, term: term.clone() }),
                })
                .collect::<Result<BTreeMap<_, _>>>()?;
            Ok((doc_id, weights))
        })
        .collect::<Result<Bm25Index>>()?;

    tracing::info!(num_docs, avg_doc_len, k = params.k, b = params.b, log_base = %params.log_base, "built BM25 index");
    Ok(index)
}
