use thiserror::Error;

/// Errors produced by a [`TableSink`](crate::TableSink).
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying `PostgreSQL` failure (connect, DDL, insert or commit).
    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    /// Sink-specific failure reported as text.
    #[error("{0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, LoadError>;
