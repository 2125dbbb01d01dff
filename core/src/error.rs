use crate::DocId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corpus parse error: {0}")]
    Corpus(#[from] quick_xml::Error),

    #[error("Malformed corpus: {0}")]
    MalformedCorpus(String),

    #[error("Index serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Index manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Index file corrupted: {0}")]
    Corrupt(String),

    #[error("Unsupported index format version: {0}")]
    UnsupportedVersion(u32),

    #[error("Unknown document id: {0}")]
    UnknownDocument(DocId),

    #[error("Ingestion stage failed: {0}")]
    StageFailed(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
