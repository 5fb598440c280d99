use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("read csv {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid {column} value {value:?}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },
}

impl IngestError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
