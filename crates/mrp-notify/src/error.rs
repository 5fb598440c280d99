use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("{0}")]
    Other(String),
}
