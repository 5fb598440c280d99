//! Dataset validation.
//!
//! Decodes the staged report, resolves property names, then applies two
//! checks in order: the distinct property count over the whole feed, and a
//! non-empty slice for the run date. Any failure discards the dataset.

pub mod checks;
pub mod validator;

pub use checks::{check_property_count, filter_run_date};
pub use validator::{validate, validate_records};
