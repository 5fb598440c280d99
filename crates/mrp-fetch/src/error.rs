use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
