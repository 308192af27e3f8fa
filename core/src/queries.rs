//! Query-set files: blocks terminated by `#`, first line the query id.

use crate::error::{read_to_string, Error, Result};
use crate::QueryId;
use std::path::Path;

const BLOCK_TERMINATOR: char = '#';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub id: QueryId,
    pub text: String,
}

pub fn parse_queries(text: &str) -> Result<Vec<QueryRecord>> {
    let mut queries = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let trimmed = line.trim_end();
        match trimmed.strip_suffix(BLOCK_TERMINATOR) {
            Some(rest) => {
                block.push((n + 1, rest));
                if let Some(query) = finish_block(&block)? {
                    queries.push(query);
                }
                block.clear();
            }
            None => block.push((n + 1, trimmed)),
        }
    }
    if let Some(query) = finish_block(&block)? {
        queries.push(query);
    }
    Ok(queries)
}

fn finish_block(block: &[(usize, &str)]) -> Result<Option<QueryRecord>> {
    let mut lines = block.iter().filter(|(_, l)| !l.trim().is_empty());
    let Some(&(line_no, header)) = lines.next() else {
        return Ok(None);
    };
    let id = header
        .trim()
        .parse()
        .map_err(|_| Error::format(format!("query set line {line_no}"), format!("query id {:?} is not an integer", header.trim())))?;
    let text = lines.map(|(_, l)| l.trim()).collect::<Vec<_>>().join(" ");
    Ok(Some(QueryRecord { id, text }))
}

pub fn read_queries(path: &Path) -> Result<Vec<QueryRecord>> {
    let queries = parse_queries(&read_to_string(path)?)?;
    tracing::info!(path = %path.display(), num_queries = queries.len(), "parsed query set");
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delimited_and_inline_terminated_blocks() {
        let text = "1\nI AM INTERESTED IN\nLIBRARY AUTOMATION. #\n2\nCOMPUTER\nCATALOGUES\n#\n\n";
        let queries = parse_queries(text).unwrap();
        assert_eq!(
            queries,
            vec![
                QueryRecord { id: 1, text: "I AM INTERESTED IN LIBRARY AUTOMATION.".into() },
                QueryRecord { id: 2, text: "COMPUTER CATALOGUES".into() },
            ]
        );
    }

    #[test]
    fn unterminated_final_block_is_kept() {
        let queries = parse_queries("5\nonline search").unwrap();
        assert_eq!(queries, vec![QueryRecord { id: 5, text: "online search".into() }]);
    }

    #[test]
    fn bad_query_id_reports_line() {
        let err = parse_queries("1\nfirst\n#\nsecond\ntext\n#\n").unwrap_err();
        assert!(err.to_string().contains("line 4"), "{err}");
    }
}
