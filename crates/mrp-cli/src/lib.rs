//! Library components of the market rate pull job.

pub mod config;
pub mod logging;
pub mod pipeline;
