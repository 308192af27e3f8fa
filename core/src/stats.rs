//! Per-document term frequencies and corpus-wide document frequencies.

use crate::corpus::RawDocument;
use crate::error::{Error, Result};
use crate::tokenizer::{Analyzer, TermStemmer};
use crate::DocId;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStats {
    /// Non-stopword terms after stemming.
    pub length: u32,
    pub term_frequencies: BTreeMap<String, u32>,
}

impl DocumentStats {
    pub fn from_terms<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut stats = Self::default();
        for term in terms {
            stats.length += 1;
            *stats.term_frequencies.entry(term).or_insert(0) += 1;
        }
        stats
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    pub documents: BTreeMap<DocId, DocumentStats>,
    pub document_frequency: BTreeMap<String, u32>,
    pub total_length: u64,
}

impl CorpusStats {
    /// Analyze every document in a single pass.
    pub fn accumulate<S: TermStemmer>(docs: &[RawDocument], analyzer: &Analyzer<S>) -> Result<Self> {
        let mut stats = Self::default();
        for doc in docs {
            stats.add_document(doc.id, &doc.body, analyzer)?;
        }
        tracing::info!(
            num_docs = stats.document_count(),
            num_terms = stats.document_frequency.len(),
            total_length = stats.total_length,
            "accumulated term statistics"
        );
        Ok(stats)
    }

    /// Document frequency moves only on the first sighting of a stem inside this document.
    pub fn add_document<S: TermStemmer>(&mut self, id: DocId, body: &str, analyzer: &Analyzer<S>) -> Result<()> {
        let slot = match self.documents.entry(id) {
            Entry::Occupied(_) => return Err(Error::DuplicateDocument(id)),
            Entry::Vacant(slot) => slot,
        };
        let doc = slot.insert(DocumentStats::default());
        for term in analyzer.terms(body) {
            doc.length += 1;
            match doc.term_frequencies.entry(term) {
                Entry::Occupied(mut tf) => *tf.get_mut() += 1,
                Entry::Vacant(tf) => {
                    *self.document_frequency.entry(tf.key().clone()).or_insert(0) += 1;
                    tf.insert(1);
                }
            }
        }
        self.total_length += u64::from(doc.length);
        Ok(())
    }

    /// Merge independently analyzed documents: each term's document frequency is the
    /// size of the set of documents it appears in.
    pub fn reduce<I>(docs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DocId, DocumentStats)>,
    {
        let mut documents = BTreeMap::new();
        let mut postings: BTreeMap<String, BTreeSet<DocId>> = BTreeMap::new();
        let mut total_length = 0u64;
        for (id, doc) in docs {
            for term in doc.term_frequencies.keys() {
                postings.entry(term.clone()).or_default().insert(id);
            }
            total_length += u64::from(doc.length);
            if documents.insert(id, doc).is_some() {
                return Err(Error::DuplicateDocument(id));
            }
        }
        let document_frequency = postings
            .into_iter()
            .map(|(term, ids)| (term, ids.len() as u32))
            .collect();
        Ok(Self { documents, document_frequency, total_length })
    }

    pub fn document_count(&self) -> usize { self.documents.len() }

    pub fn average_document_length(&self) -> Result<f64> {
        if self.documents.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        Ok(self.total_length as f64 / self.documents.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Stopwords;

    fn identity(term: &str) -> String { term.to_string() }

    fn analyzer() -> Analyzer<fn(&str) -> String> {
        Analyzer::new(identity as fn(&str) -> String, Stopwords::parse("the\nof"))
    }

    fn docs() -> Vec<RawDocument> {
        vec![
            RawDocument { id: 4, body: "the cat of the cat".into() },
            RawDocument { id: 9, body: "a cat, a dog".into() },
            RawDocument { id: 12, body: "the of".into() },
        ]
    }

    #[test]
    fn counts_documents_not_occurrences() {
        let stats = CorpusStats::accumulate(&docs(), &analyzer()).unwrap();
        assert_eq!(stats.document_frequency["cat"], 2);
        assert_eq!(stats.document_frequency["a"], 1);
        assert_eq!(stats.documents[&4].term_frequencies["cat"], 2);
        assert_eq!(stats.documents[&9].term_frequencies["a"], 2);
    }

    #[test]
    fn lengths_exclude_stopwords() {
        let stats = CorpusStats::accumulate(&docs(), &analyzer()).unwrap();
        assert_eq!(stats.documents[&4].length, 2);
        assert_eq!(stats.documents[&9].length, 4);
        assert_eq!(stats.documents[&12].length, 0);
        assert_eq!(stats.total_length, 6);
        assert!((stats.average_document_length().unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reduce_matches_single_pass() {
        let analyzer = analyzer();
        let single = CorpusStats::accumulate(&docs(), &analyzer).unwrap();
        let reduced = CorpusStats::reduce(
            docs().into_iter().map(|d| (d.id, DocumentStats::from_terms(analyzer.terms(&d.body)))),
        )
        .unwrap();
        assert_eq!(single.documents, reduced.documents);
        assert_eq!(single.document_frequency, reduced.document_frequency);
        assert_eq!(single.total_length, reduced.total_length);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut docs = docs();
        docs.push(RawDocument { id: 9, body: "again".into() });
        assert!(matches!(CorpusStats::accumulate(&docs, &analyzer()), Err(Error::DuplicateDocument(9))));
    }

    #[test]
    fn empty_corpus_has_no_average() {
        assert!(matches!(CorpusStats::default().average_document_length(), Err(Error::EmptyCorpus)));
    }
}
