use crate::DocId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Input text does not follow the expected layout.
    #[error("malformed {context}: {reason}")]
    Format { context: String, reason: String },

    #[error("corpus contains no documents; average document length is undefined")]
    EmptyCorpus,

    #[error("document {0} appears more than once in the corpus")]
    DuplicateDocument(DocId),

    #[error("term {term:?} in document {doc_id} has no document frequency")]
    InconsistentStats { doc_id: DocId, term: String },

    #[error("invalid BM25 parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}

impl Error {
    pub(crate) fn format(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Format { context: context.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Read a whole input file, keeping the path in the error.
pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })
}
