//! Ground-truth relevance judgments.
//!
//! The file is a flat stream of whitespace-separated integers made of repeating
//! blocks: `query_id count doc_id × count`. Block width depends on the count
//! just read, so the stream is consumed by a three-state machine.

use crate::error::{read_to_string, Error, Result};
use crate::{DocId, QueryId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub type RelevanceJudgments = BTreeMap<QueryId, BTreeSet<DocId>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadId,
    ReadCount { query: QueryId },
    ReadRelevant { query: QueryId, remaining: usize },
}

pub fn parse_relevance(text: &str) -> Result<RelevanceJudgments> {
    let mut judgments = RelevanceJudgments::new();
    let mut state = State::ReadId;

    for (n, token) in text.split_whitespace().enumerate() {
        let value: u64 = token
            .parse()
            .map_err(|_| Error::format(format!("relevance token {}", n + 1), format!("{token:?} is not a non-negative integer")))?;
        let overflow = || Error::format(format!("relevance token {}", n + 1), format!("{value} is out of range"));
        state = match state {
            State::ReadId => {
                let query = QueryId::try_from(value).map_err(|_| overflow())?;
                judgments.entry(query).or_default();
                State::ReadCount { query }
            }
            State::ReadCount { query } => match usize::try_from(value).map_err(|_| overflow())? {
                0 => State::ReadId,
                remaining => State::ReadRelevant { query, remaining },
            },
            State::ReadRelevant { query, remaining } => {
                let doc = DocId::try_from(value).map_err(|_| overflow())?;
                judgments.entry(query).or_default().insert(doc);
                match remaining - 1 {
                    0 => State::ReadId,
                    remaining => State::ReadRelevant { query, remaining },
                }
            }
        };
    }

    match state {
        State::ReadId => Ok(judgments),
        State::ReadCount { query } => Err(Error::format("relevance judgments", format!("query {query} is missing its relevant-document count"))),
        State::ReadRelevant { query, remaining } => Err(Error::format(
            "relevance judgments",
            format!("query {query} ends {remaining} relevant document id(s) short"),
        )),
    }
}

pub fn read_relevance(path: &Path) -> Result<RelevanceJudgments> {
    let judgments = parse_relevance(&read_to_string(path)?)?;
    tracing::info!(path = %path.display(), num_queries = judgments.len(), "parsed relevance judgments");
    Ok(judgments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_variable_width_blocks() {
        let judgments = parse_relevance("1 3\n 10 20 30\n2 1 7\n3 0\n4 2 5 6").unwrap();
        assert_eq!(judgments[&1], BTreeSet::from([10, 20, 30]));
        assert_eq!(judgments[&2], BTreeSet::from([7]));
        assert!(judgments[&3].is_empty());
        assert_eq!(judgments[&4], BTreeSet::from([5, 6]));
    }

    #[test]
    fn truncated_block_is_a_format_error() {
        let err = parse_relevance("1 2 10 20\n2 3 4 5").unwrap_err();
        assert!(err.to_string().contains("1 relevant"), "{err}");
        assert!(matches!(parse_relevance("9"), Err(Error::Format { .. })));
    }

    #[test]
    fn non_integer_token_is_a_format_error() {
        assert!(matches!(parse_relevance("1 1 x"), Err(Error::Format { .. })));
    }

    #[test]
    fn empty_input_has_no_judgments() {
        assert!(parse_relevance(" \n").unwrap().is_empty());
    }
}
