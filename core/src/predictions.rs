//! Ranked predictions and their line format: `query_id doc_id rank`.

use crate::error::{read_to_string, Error, Result};
use crate::persist::write_atomic;
use crate::query::ScoredDoc;
use crate::{DocId, QueryId};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Rank (starting at 1) → document id.
pub type RankedList = BTreeMap<u32, DocId>;
pub type Predictions = BTreeMap<QueryId, RankedList>;

pub fn ranked_list(results: &[ScoredDoc]) -> RankedList {
    results.iter().zip(1u32..).map(|(hit, rank)| (rank, hit.doc_id)).collect()
}

/// Document ids in rank order.
pub fn ranked_ids(list: &RankedList) -> Vec<DocId> {
    list.values().copied().collect()
}

pub fn write_rank_lines(predictions: &Predictions) -> String {
    let mut out = String::new();
    for (query, list) in predictions {
        for (rank, doc) in list {
            let _ = writeln!(out, "{query} {doc} {rank}");
        }
    }
    out
}

/// A new block starts when the query id changes or the rank drops below the
/// previous one; a repeated rank within a block is malformed.
/// A later block for the same query replaces the earlier one.
pub fn parse_rank_lines(text: &str) -> Result<Predictions> {
    let mut predictions = Predictions::new();
    let mut current: Option<(QueryId, u32)> = None;

    for (n, line) in text.lines().enumerate() {
        let context = || format!("predictions line {}", n + 1);
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            return Err(Error::format(context(), format!("expected `query doc rank`, got {line:?}")));
        }
        let field = |i: usize, name: &str| -> Result<u32> {
            fields[i].parse().map_err(|_| Error::format(context(), format!("{name} {:?} is not an integer", fields[i])))
        };
        let (query, doc, rank) = (field(0, "query id")?, field(1, "document id")?, field(2, "rank")?);
        if rank == 0 {
            return Err(Error::format(context(), "ranks start at 1"));
        }

        match current {
            Some((q, last)) if q == query && rank == last => {
                return Err(Error::format(context(), format!("rank {rank} repeats for query {query}")));
            }
            Some((q, last)) if q == query && rank > last => {}
            _ => {
                predictions.insert(query, RankedList::new());
            }
        }
        predictions.entry(query).or_default().insert(rank, doc);
        current = Some((query, rank));
    }
    Ok(predictions)
}

pub fn save_predictions(path: &Path, predictions: &Predictions) -> Result<()> {
    write_atomic(path, write_rank_lines(predictions).as_bytes())?;
    tracing::info!(path = %path.display(), num_queries = predictions.len(), "wrote predictions");
    Ok(())
}

pub fn read_predictions(path: &Path) -> Result<Predictions> {
    parse_rank_lines(&read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_result_order() {
        let results = [ScoredDoc { doc_id: 40, score: 3.0 }, ScoredDoc { doc_id: 7, score: 1.0 }];
        let list = ranked_list(&results);
        assert_eq!(list, RankedList::from([(1, 40), (2, 7)]));
        assert_eq!(ranked_ids(&list), vec![40, 7]);
    }

    #[test]
    fn reads_back_written_lines() {
        let predictions = Predictions::from([(1, RankedList::from([(1, 5), (2, 3)])), (2, RankedList::from([(1, 9)]))]);
        let text = write_rank_lines(&predictions);
        assert_eq!(text, "1 5 1\n1 3 2\n2 9 1\n");
        assert_eq!(parse_rank_lines(&text).unwrap(), predictions);
    }

    #[test]
    fn rank_reset_starts_a_new_block() {
        let predictions = parse_rank_lines("3 10 1\n3 11 2\n\n3 12 1 0.5 tag\n").unwrap();
        assert_eq!(predictions[&3], RankedList::from([(1, 12)]));
    }

    #[test]
    fn repeated_rank_is_rejected() {
        let err = parse_rank_lines("4 10 1\n4 11 2\n4 12 2\n").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(matches!(parse_rank_lines("1 2\n"), Err(Error::Format { .. })));
        assert!(matches!(parse_rank_lines("1 2 0\n"), Err(Error::Format { .. })));
        let err = parse_rank_lines("1 2 1\n1 x 2\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }
}
