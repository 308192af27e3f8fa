//! BM25 ranking over a fixed text corpus, plus retrieval evaluation against
//! relevance judgments.
//!
//! Pipeline: [`corpus`] → [`stats`] → [`bm25`] → [`persist`] → [`query`],
//! with [`metrics`] scoring the rankings.

pub mod bm25;
#[cfg(feature = "cli")]
pub mod cli;
pub mod corpus;
pub mod error;
pub mod index;
pub mod metrics;
pub mod persist;
pub mod predictions;
pub mod queries;
pub mod query;
pub mod relevance;
pub mod stats;
pub mod tokenizer;

pub use bm25::{build_index, Bm25Params, LogBase};
pub use error::{Error, Result};
pub use index::Bm25Index;
pub use query::{QueryEngine, ScoredDoc};

pub type DocId = u32;
pub type QueryId = u32;
