use std::path::PathBuf;
use thiserror::Error;

use crate::index::Field;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("missing index file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("corrupt posting line in field `{field}` at offset {offset}: {reason}")]
    CorruptPosting { field: Field, offset: u64, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// The file whose absence caused this error, if any.
    pub fn missing_file(&self) -> Option<&std::path::Path> {
        match self {
            IndexError::MissingFile { path } => Some(path),
            _ => None,
        }
    }
}
