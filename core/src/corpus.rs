use crate::error::{read_to_string, Error, Result};
use crate::DocId;
use std::path::Path;

/// Line separating consecutive document records.
pub const RECORD_DELIMITER: &str = "********************************************\n";
const DOCUMENT_MARKER: &str = "Document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: DocId,
    /// Body lines concatenated with no separator.
    pub body: String,
}

/// Split corpus text into `(id, body)` records, in file order.
pub fn parse_corpus(text: &str) -> Result<Vec<RawDocument>> {
    let mut records: Vec<&str> = text.split(RECORD_DELIMITER).collect();
    if records.last() == Some(&"") {
        records.pop();
    }
    records
        .into_iter()
        .enumerate()
        .map(|(n, record)| parse_record(n + 1, record))
        .collect()
}

fn parse_record(ordinal: usize, record: &str) -> Result<RawDocument> {
    let mut lines = record.split('\n');
    let header = lines.next().unwrap_or_default();
    let context = || format!("corpus record {ordinal}");
    let (_, id_text) = header
        .split_once(DOCUMENT_MARKER)
        .ok_or_else(|| Error::format(context(), format!("header {header:?} lacks the {DOCUMENT_MARKER:?} marker")))?;
    let id: DocId = id_text
        .trim()
        .parse()
        .map_err(|_| Error::format(context(), format!("document id {:?} is not an integer", id_text.trim())))?;
    Ok(RawDocument { id, body: lines.collect::<String>() })
}

pub fn read_corpus(path: &Path) -> Result<Vec<RawDocument>> {
    let docs = parse_corpus(&read_to_string(path)?)?;
    tracing::info!(path = %path.display(), num_docs = docs.len(), "parsed corpus");
    Ok(docs)
}
