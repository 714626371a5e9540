use bqmask_cli::config::Settings;
use bqmask_core::sql::render_query;
use bqmask_core::{RunPlan, RunSummary};
use bqmask_model::{FailureReport, MaskingSpec, TransformExpression};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

pub fn print_run_summary(settings: &Settings, summary: &RunSummary) {
    println!(
        "Masked {} into {} ({})",
        settings.source_project, settings.target_project, settings.overwrite
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Datasets"),
        header_cell("Tables masked"),
        header_cell("Skipped"),
        header_cell("Unmasked columns"),
    ]);
    apply_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(summary.datasets),
        Cell::new(summary.tables_masked)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        count_cell(summary.tables_skipped, Color::DarkGrey),
        count_cell(summary.passthrough_columns, Color::Yellow),
    ]);
    println!("{table}");
}

pub fn print_plan(plan: &RunPlan) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Destination"),
        header_cell("Column"),
        header_cell("Transform"),
    ]);
    apply_table_style(&mut table);
    for spec in &plan.specs {
        for (index, expression) in spec.select.iter().enumerate() {
            let destination = if index == 0 {
                Cell::new(&spec.destination).add_attribute(Attribute::Bold)
            } else {
                Cell::new("")
            };
            table.add_row(vec![
                destination,
                Cell::new(&expression.column),
                transform_cell(expression.transform),
            ]);
        }
    }
    println!("{table}");
    println!(
        "{} tables planned, {} skipped",
        plan.specs.len(),
        plan.tables_skipped
    );
}

pub fn print_plan_sql(plan: &RunPlan) {
    for spec in &plan.specs {
        println!("{}", job_comment(spec));
        println!("{};", render_query(&spec.select, &spec.source));
        println!();
    }
}

fn job_comment(spec: &MaskingSpec) -> String {
    let location = spec.location.as_deref().unwrap_or("default location");
    format!(
        "-- {} -> {} ({}, {location})",
        spec.source,
        spec.destination,
        spec.overwrite.write_disposition()
    )
}

/// Prints every failure with its stage and cause to stderr.
pub fn print_failures(failures: &FailureReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Target"),
        header_cell("Stage"),
        header_cell("Cause"),
    ]);
    apply_table_style(&mut table);
    for failure in failures {
        table.add_row(vec![
            Cell::new(&failure.target)
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            Cell::new(failure.stage),
            Cell::new(&failure.cause),
        ]);
    }
    eprintln!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
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

fn transform_cell(transform: TransformExpression) -> Cell {
    if transform.is_masking() {
        Cell::new(transform)
    } else {
        Cell::new(transform).fg(Color::Yellow)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}
