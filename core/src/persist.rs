use crate::bm25::Bm25Params;
use crate::error::{read_to_string, Error, Result};
use crate::index::Bm25Index;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const META_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    #[default]
    Json,
    Bincode,
}

impl IndexFormat {
    pub fn encode(self, stored: &StoredIndex) -> Result<Vec<u8>> {
        Ok(match self {
            IndexFormat::Json => serde_json::to_vec(stored)?,
            IndexFormat::Bincode => bincode::serialize(stored)?,
        })
    }

    pub fn decode(self, bytes: &[u8]) -> Result<StoredIndex> {
        Ok(match self {
            IndexFormat::Json => serde_json::from_slice(bytes)?,
            IndexFormat::Bincode => bincode::deserialize(bytes)?,
        })
    }

    fn file_name(self) -> &'static str {
        match self {
            IndexFormat::Json => "weights.json",
            IndexFormat::Bincode => "weights.bin",
        }
    }
}

impl fmt::Display for IndexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexFormat::Json => "json",
            IndexFormat::Bincode => "bincode",
        })
    }
}

impl FromStr for IndexFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(IndexFormat::Json),
            "bincode" | "bin" => Ok(IndexFormat::Bincode),
            other => Err(format!("unsupported index format {other:?} (expected json or bincode)")),
        }
    }
}

/// Contents of the weights file. The build settings travel with the weights,
/// so a reader never pairs weights with settings from another build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIndex {
    pub params: Bm25Params,
    /// [`Stopwords::fingerprint`](crate::tokenizer::Stopwords::fingerprint) of the set used to build.
    pub stopwords: String,
    pub weights: Bm25Index,
}

impl StoredIndex {
    pub fn built_with(&self, params: &Bm25Params, stopwords: &str) -> bool {
        self.params == *params && self.stopwords == stopwords
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    pub num_docs: u32,
    pub num_terms: u32,
    pub params: Bm25Params,
    pub stopwords: String,
    pub format: IndexFormat,
}

impl MetaFile {
    pub fn describe(stored: &StoredIndex, format: IndexFormat) -> Self {
        Self {
            version: META_VERSION,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            num_docs: stored.weights.num_docs() as u32,
            num_terms: stored.weights.num_terms() as u32,
            params: stored.params,
            stopwords: stored.stopwords.clone(),
            format,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn weights(&self, format: IndexFormat) -> PathBuf { self.root.join(format.file_name()) }
}

/// Write through a sibling temp file and rename over the target, so readers
/// see either the old file or the complete new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    write_atomic(&paths.meta(), serde_json::to_string_pretty(meta)?.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let meta: MetaFile = serde_json::from_str(&read_to_string(&paths.meta())?)?;
    if meta.version != META_VERSION {
        return Err(Error::format(
            paths.meta().display().to_string(),
            format!("unsupported index version {} (expected {META_VERSION})", meta.version),
        ));
    }
    Ok(meta)
}

/// The meta file is removed before the weights are replaced and written back
/// only once they are in place, so an interrupted save leaves no meta file.
pub fn save_index(paths: &IndexPaths, stored: &StoredIndex, format: IndexFormat) -> Result<MetaFile> {
    match fs::remove_file(paths.meta()) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }
    let bytes = format.encode(stored)?;
    write_atomic(&paths.weights(format), &bytes)?;
    let meta = MetaFile::describe(stored, format);
    save_meta(paths, &meta)?;
    tracing::info!(path = %paths.root.display(), bytes = bytes.len(), %format, "saved index");
    Ok(meta)
}

/// The settings recorded inside the weights file are authoritative; a meta
/// file that disagrees with them is reported and otherwise ignored.
pub fn load_index(paths: &IndexPaths) -> Result<(StoredIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    let path = paths.weights(meta.format);
    let bytes = fs::read(&path).map_err(|source| Error::Read { path: path.clone(), source })?;
    let stored = meta.format.decode(&bytes)?;
    if !stored.built_with(&meta.params, &meta.stopwords) {
        tracing::warn!(path = %path.display(), meta = ?meta.params, stored = ?stored.params, "meta file does not describe the weights file");
    }
    tracing::info!(path = %path.display(), num_docs = stored.weights.num_docs(), "loaded index");
    Ok((stored, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::bm25::LogBase;

    fn sample(log_base: LogBase) -> StoredIndex {
        let mut weights = Bm25Index::new();
        weights.insert_document(3, BTreeMap::from([("librari".to_string(), 0.1 + 0.2), ("the".to_string(), -0.7369655941662062)]));
        weights.insert_document(11, BTreeMap::from([("catalog".to_string(), 1.0 / 3.0)]));
        StoredIndex { params: Bm25Params { log_base, ..Bm25Params::default() }, stopwords: "builtin".into(), weights }
    }

    #[test]
    fn encodings_round_trip() {
        for format in [IndexFormat::Json, IndexFormat::Bincode] {
            let stored = sample(LogBase::Two);
            let decoded = format.decode(&format.encode(&stored).unwrap()).unwrap();
            assert_eq!(decoded, stored, "{format}");
        }
    }

    #[test]
    fn json_layout_is_doc_then_term() {
        let json: serde_json::Value = serde_json::from_slice(&IndexFormat::Json.encode(&sample(LogBase::Two)).unwrap()).unwrap();
        assert!(json["weights"]["11"]["catalog"].is_f64());
        assert_eq!(json["params"]["log_base"], "two");
    }

    #[test]
    fn failed_meta_write_leaves_no_meta_behind() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_index(&paths, &sample(LogBase::Two), IndexFormat::Json).unwrap();

        // A directory squatting on the temp path makes the meta write fail.
        fs::create_dir(dir.path().join("meta.json.tmp")).unwrap();
        assert!(save_index(&paths, &sample(LogBase::Ten), IndexFormat::Json).is_err());
        assert!(!paths.meta().exists());

        fs::remove_dir(dir.path().join("meta.json.tmp")).unwrap();
        save_meta(&paths, &MetaFile::describe(&sample(LogBase::Two), IndexFormat::Json)).unwrap();
        let (stored, meta) = load_index(&paths).unwrap();
        assert_eq!(meta.params.log_base, LogBase::Two);
        assert_eq!(stored.params.log_base, LogBase::Ten);
        assert!(!stored.built_with(&meta.params, &meta.stopwords));
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.txt");
        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second");
        assert!(!dir.path().join("nested").join("out.txt.tmp").exists());
    }
}
