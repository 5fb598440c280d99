//! `PostgreSQL`-backed [`TableSink`].
//!
//! Uses the sync `postgres` crate. The connection is opened per append so a
//! connect failure surfaces through the same path as any other sink error.

use postgres::types::ToSql;
use postgres::{Client, NoTls};
use rust_decimal::Decimal;
use tracing::debug;

use mrp_model::{EnrichedRecord, TableRef};

use crate::error::Result;
use crate::loader::TableSink;
use crate::schema::{COLUMNS, create_table_sql, insert_sql};

/// Rows per multi-row `INSERT` statement.
pub const DEFAULT_BATCH_SIZE: usize = 260;

/// Largest batch whose bind parameters fit the protocol's `u16` count.
pub const MAX_BATCH_SIZE: usize = u16::MAX as usize / COLUMNS.len();

pub struct PostgresSink {
    connstr: String,
    batch_size: usize,
}

impl PostgresSink {
    /// `connstr` is a libpq-style connection string or `PostgreSQL` URI.
    pub fn new(connstr: impl Into<String>) -> Self {
        Self {
            connstr: connstr.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Clamped to `1..=MAX_BATCH_SIZE`.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Property ids as `NUMERIC` values, one per row.
fn property_ids(chunk: &[EnrichedRecord]) -> Vec<Decimal> {
    chunk
        .iter()
        .map(|row| Decimal::from(row.property_id()))
        .collect()
}

/// Bind parameters for one batch, row-major in [`COLUMNS`] order.
fn batch_params<'a>(
    chunk: &'a [EnrichedRecord],
    property_ids: &'a [Decimal],
) -> Vec<&'a (dyn ToSql + Sync)> {
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(chunk.len() * COLUMNS.len());
    for (row, property_id) in chunk.iter().zip(property_ids) {
        params.push(&row.property);
        params.push(property_id);
        params.push(&row.record.date);
        params.push(&row.record.floorplan);
        params.push(&row.record.building);
        params.push(&row.record.unit);
        params.push(&row.record.base_rent);
        params.push(&row.record.market_rent);
    }
    params
}

impl TableSink for PostgresSink {
    fn append(&mut self, table: &TableRef, rows: &[EnrichedRecord]) -> Result<u64> {
        let mut client = Client::connect(&self.connstr, NoTls)?;
        debug!(table = %table, "connected to destination database");
        client.batch_execute(&create_table_sql(table))?;

        // One transaction so a failing batch leaves nothing behind.
        let mut tx = client.transaction()?;
        let mut written = 0u64;
        for (index, chunk) in rows.chunks(self.batch_size).enumerate() {
            let ids = property_ids(chunk);
            let params = batch_params(chunk, &ids);
            written += tx.execute(insert_sql(table, chunk.len()).as_str(), &params)?;
            debug!(batch = index, rows = chunk.len(), "inserted batch");
        }
        tx.commit()?;
        Ok(written)
    }
}
