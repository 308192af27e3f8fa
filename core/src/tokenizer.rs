use crate::error::{read_to_string, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::path::Path;

lazy_static! {
    // ASCII punctuation plus the CJK/full-width marks found in the corpus. Hyphens split words.
    static ref PUNCT: Regex = Regex::new(r#"[.(),?$%\^*:"'/\-+—！，。？、~@#￥…&（）]"#).expect("valid regex");
    static ref BUILTIN_STOPWORDS: Vec<&'static str> = vec![
        "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
        "be","because","been","before","being","below","between","both","but","by",
        "can","cannot","could",
        "did","do","does","doing","down","during",
        "each","few","for","from","further",
        "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
        "i","if","in","into","is","it","its","itself",
        "me","more","most","my","myself",
        "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
        "same","she","should","so","some","such",
        "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
        "under","until","up","very",
        "was","we","were","what","when","where","which","while","who","whom","why","with","would",
        "you","your","yours","yourself","yourselves"
    ];
}

/// Lowercase `text`, blank out punctuation and split on whitespace runs.
///
/// Empty tokens left behind by leading or trailing delimiters are dropped.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    PUNCT
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Maps a normalized token to its stem. Must be pure: equal input, equal output.
pub trait TermStemmer {
    fn stem(&self, term: &str) -> String;
}

/// Porter-family English stemmer backed by `rust-stemmers`.
pub struct EnglishStemmer(Stemmer);

impl Default for EnglishStemmer {
    fn default() -> Self { Self(Stemmer::create(Algorithm::English)) }
}

impl TermStemmer for EnglishStemmer {
    fn stem(&self, term: &str) -> String { self.0.stem(term).into_owned() }
}

impl<F> TermStemmer for F
where
    F: Fn(&str) -> String,
{
    fn stem(&self, term: &str) -> String { self(term) }
}

#[derive(Debug, Clone, Default)]
pub struct Stopwords(HashSet<String>);

impl Stopwords {
    /// One term per line; blank lines are ignored.
    pub fn parse(text: &str) -> Self {
        Self(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let stopwords = Self::parse(&read_to_string(path)?);
        tracing::debug!(path = %path.display(), count = stopwords.len(), "loaded stopwords");
        Ok(stopwords)
    }

    pub fn builtin() -> Self {
        Self(BUILTIN_STOPWORDS.iter().map(|w| w.to_string()).collect())
    }

    /// SHA-1 over the sorted terms; equal sets give equal fingerprints.
    pub fn fingerprint(&self) -> String {
        let mut terms: Vec<&str> = self.0.iter().map(String::as_str).collect();
        terms.sort_unstable();
        let mut hasher = Sha1::new();
        for term in terms {
            hasher.update(term.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn contains(&self, term: &str) -> bool { self.0.contains(term) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Turns raw text into the ordered stream of indexable terms:
/// normalize, stem, then drop stems found in the stopword set.
pub struct Analyzer<S = EnglishStemmer> {
    stemmer: S,
    stopwords: Stopwords,
}

impl<S: TermStemmer> Analyzer<S> {
    pub fn new(stemmer: S, stopwords: Stopwords) -> Self {
        Self { stemmer, stopwords }
    }

    pub fn terms(&self, text: &str) -> Vec<String> {
        normalize(text)
            .iter()
            .map(|token| self.stemmer.stem(token))
            .filter(|stem| !stem.is_empty() && !self.stopwords.contains(stem))
            .collect()
    }

    pub fn stopwords(&self) -> &Stopwords { &self.stopwords }
}

impl Analyzer<EnglishStemmer> {
    pub fn english(stopwords: Stopwords) -> Self {
        Self::new(EnglishStemmer::default(), stopwords)
    }
}

impl Default for Analyzer<EnglishStemmer> {
    fn default() -> Self { Self::english(Stopwords::builtin()) }
}
