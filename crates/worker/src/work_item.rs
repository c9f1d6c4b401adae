use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One unit of assigned work: a bounded range of some source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub source: SourceSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    InMemory {
        records: Vec<String>,
        #[serde(default)]
        encoding: RecordEncoding,
        #[serde(default)]
        start_index: Option<i64>,
        #[serde(default)]
        end_index: Option<i64>,
    },
    TextFile {
        path: PathBuf,
        #[serde(default)]
        start_offset: Option<u64>,
        #[serde(default)]
        end_offset: Option<u64>,
    },
}

/// How inline records map to bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordEncoding {
    /// The UTF-8 bytes of the string.
    #[default]
    Utf8,
    /// One byte per char, every char at most U+00FF.
    ByteString,
}

impl WorkItem {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
