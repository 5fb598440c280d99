//! Fixed column-to-type mapping of the destination table.

use mrp_model::TableRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
}

/// Destination columns in insert order.
pub const COLUMNS: [ColumnSpec; 8] = [
    ColumnSpec {
        name: "Property",
        sql_type: "VARCHAR(250)",
    },
    ColumnSpec {
        name: "PropertyID",
        sql_type: "NUMERIC",
    },
    ColumnSpec {
        name: "Date",
        sql_type: "DATE",
    },
    ColumnSpec {
        name: "Floorplan",
        sql_type: "VARCHAR(250)",
    },
    ColumnSpec {
        name: "Building",
        sql_type: "VARCHAR(250)",
    },
    ColumnSpec {
        name: "Unit",
        sql_type: "VARCHAR(250)",
    },
    ColumnSpec {
        name: "BaseRent",
        sql_type: "NUMERIC",
    },
    ColumnSpec {
        name: "MarketRent",
        sql_type: "NUMERIC",
    },
];

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified(table: &TableRef) -> String {
    format!("{}.{}", quote_ident(&table.schema), quote_ident(&table.table))
}

fn column_list() -> String {
    COLUMNS
        .iter()
        .map(|column| quote_ident(column.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Idempotent DDL for the destination table.
pub fn create_table_sql(table: &TableRef) -> String {
    let columns = COLUMNS
        .iter()
        .map(|column| format!("{} {}", quote_ident(column.name), column.sql_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({columns})", qualified(table))
}

/// Multi-row `INSERT` with positional parameters for `rows` rows.
pub fn insert_sql(table: &TableRef, rows: usize) -> String {
    let width = COLUMNS.len();
    let mut sql = format!("INSERT INTO {} ({}) VALUES ", qualified(table), column_list());
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for col in 0..width {
            if col > 0 {
                sql.push_str(", ");
            }
            sql.push('$');
            sql.push_str(&(row * width + col + 1).to_string());
        }
        sql.push(')');
    }
    sql
}
