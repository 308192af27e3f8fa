use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-document term weights. Ordered maps keep iteration and serialized
/// output identical across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bm25Index {
    weights: BTreeMap<DocId, BTreeMap<String, f64>>,
}

impl Bm25Index {
    pub fn new() -> Self { Self::default() }

    pub fn insert_document(&mut self, doc_id: DocId, weights: BTreeMap<String, f64>) {
        self.weights.insert(doc_id, weights);
    }

    pub fn weight(&self, doc_id: DocId, term: &str) -> Option<f64> {
        self.weights.get(&doc_id)?.get(term).copied()
    }

    pub fn document(&self, doc_id: DocId) -> Option<&BTreeMap<String, f64>> {
        self.weights.get(&doc_id)
    }

    /// Documents in ascending id order.
    pub fn documents(&self) -> impl Iterator<Item = (DocId, &BTreeMap<String, f64>)> {
        self.weights.iter().map(|(id, w)| (*id, w))
    }

    pub fn num_docs(&self) -> usize { self.weights.len() }

    pub fn num_terms(&self) -> usize {
        self.weights.values().flat_map(|w| w.keys()).collect::<BTreeSet<_>>().len()
    }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }
}

impl FromIterator<(DocId, BTreeMap<String, f64>)> for Bm25Index {
    fn from_iter<T: IntoIterator<Item = (DocId, BTreeMap<String, f64>)>>(iter: T) -> Self {
        Self { weights: iter.into_iter().collect() }
    }
}
