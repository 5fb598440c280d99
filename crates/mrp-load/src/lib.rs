//! Loader: appends validated rows to the destination table.

pub mod error;
pub mod loader;
pub mod postgres_sink;
pub mod schema;

pub use error::LoadError;
pub use loader::{TableSink, load};
pub use postgres_sink::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, PostgresSink};
pub use schema::{COLUMNS, ColumnSpec, create_table_sql, insert_sql};
