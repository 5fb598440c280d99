use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use mrp_cli::pipeline::{RunOutcome, RunReport};
use mrp_model::{RunContext, ValidatedDataset};

pub fn print_run_summary(ctx: &RunContext, report: &RunReport) {
    println!("Run date: {}", ctx.date_label());
    println!("Destination: {}", ctx.destination);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Status"),
        header_cell("Duration (ms)"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for stage in &report.stages {
        table.add_row(vec![
            Cell::new(stage.state.as_str()),
            status_cell(stage.succeeded),
            Cell::new(stage.elapsed.as_millis()),
        ]);
    }
    println!("{table}");

    match &report.outcome {
        RunOutcome::Done { rows_loaded } => {
            println!("Rows loaded: {rows_loaded}");
        }
        RunOutcome::Failed {
            failed_at,
            diagnostic,
        } => {
            println!("Failed while {failed_at}: {diagnostic}");
            if let Some(notification) = &report.notification {
                println!(
                    "Notifications: {} sent, {} failed",
                    notification.sent, notification.failed
                );
            }
        }
    }
}

/// Per-property row counts for a validated dataset.
pub fn print_dataset_summary(ctx: &RunContext, dataset: &ValidatedDataset) {
    let mut counts: BTreeMap<(i64, &str), usize> = BTreeMap::new();
    for row in dataset.rows() {
        let name = row.property.as_deref().unwrap_or("");
        *counts.entry((row.property_id(), name)).or_default() += 1;
    }

    println!("Run date: {}", ctx.date_label());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("PropertyID"),
        header_cell("Property"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for ((property_id, name), rows) in &counts {
        let name_cell = if name.is_empty() {
            Cell::new("-").fg(Color::DarkGrey)
        } else {
            Cell::new(name)
        };
        table.add_row(vec![Cell::new(property_id), name_cell, Cell::new(rows)]);
    }
    println!("{table}");
    println!("Rows for {}: {}", ctx.date_label(), dataset.len());
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn status_cell(succeeded: bool) -> Cell {
    if succeeded {
        Cell::new("ok").fg(Color::Green)
    } else {
        Cell::new("failed")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}
