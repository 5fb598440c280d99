//! Remote fetcher.
//!
//! Runs the external transfer client with a scripted command sequence and turns
//! its free-text transcript into an optional [`Diagnostic`](mrp_model::Diagnostic)
//! through an ordered rule table.

pub mod classify;
pub mod client;
pub mod error;
pub mod fetch;

pub use classify::{CauseSource, Classification, ClassificationRule, classify, default_rules};
pub use client::{ScriptedTransferClient, TransferClient, TransferOutput, TransferScript};
pub use error::FetchError;
pub use fetch::{FetchOptions, UnrecognizedOutputPolicy, fetch};
