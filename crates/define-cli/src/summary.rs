//! Terminal tables for command results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use define_core::{DispatchOutcome, DocumentSummary, IntegrityIssue, IssueCategory};

use crate::commands::{ApplyResult, CheckResult, SummaryReport};

pub fn print_apply_result(result: &ApplyResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Step"),
        header_cell("Outcome"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for step in &result.steps {
        table.add_row(vec![
            Cell::new(step.index),
            Cell::new(&step.label),
            outcome_cell(step.outcome),
        ]);
    }
    println!("{table}");

    match &result.output {
        Some(path) => println!("Written: {}", path.display()),
        None if result.changed_document() => {
            println!("Dry run: pass --output to write the edited document");
        }
        None => {}
    }
    if let Some(summary) = &result.summary {
        print_totals(summary);
    }
    if !result.issues.is_empty() {
        print_issue_table(&result.issues);
    }
}

pub fn print_check_result(result: &CheckResult) {
    if result.issues.is_empty() {
        println!("{}: no integrity issues", result.define_name);
        return;
    }
    println!(
        "{}: {} integrity issue(s)",
        result.define_name,
        result.issues.len()
    );
    print_issue_table(&result.issues);
}

pub fn print_summary_report(report: &SummaryReport) {
    println!("Define: {} ({})", report.define_name, report.model);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Label"),
        header_cell("Variables"),
        header_cell("Keys"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut total_variables = 0usize;
    for dataset in &report.datasets {
        total_variables += dataset.variables;
        table.add_row(vec![
            Cell::new(&dataset.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            match &dataset.label {
                Some(label) => Cell::new(label),
                None => dim_cell("-"),
            },
            Cell::new(dataset.variables),
            if dataset.keys.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(dataset.keys.join(", "))
            },
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} datasets", report.datasets.len()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_variables).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
    print_totals(&report.totals);
}

fn print_totals(summary: &DocumentSummary) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Table"), header_cell("Entries")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows = [
        ("Datasets", summary.item_groups),
        ("Item defs", summary.item_defs),
        ("Value lists", summary.value_lists),
        ("Where clauses", summary.where_clauses),
        ("Code lists", summary.code_lists),
        ("Methods", summary.methods),
        ("Comments", summary.comments),
        ("Documents", summary.leafs),
        ("Standards", summary.standards),
        ("Result displays", summary.result_displays),
        ("Analysis results", summary.analysis_results),
    ];
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), count_cell(count)]);
    }
    println!("{table}");
}

fn print_issue_table(issues: &[IntegrityIssue]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Category"), header_cell("Message")]);
    apply_issue_table_style(&mut table);
    for issue in issues {
        table.add_row(vec![
            category_cell(issue.category),
            Cell::new(&issue.message),
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    if table.column_count() >= 4 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(12)),
            ColumnConstraint::UpperBoundary(Width::Percentage(45)),
            ColumnConstraint::LowerBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
        ]);
    }
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 2 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(20)),
            ColumnConstraint::UpperBoundary(Width::Percentage(85)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn outcome_cell(outcome: DispatchOutcome) -> Cell {
    match outcome {
        DispatchOutcome::Applied => Cell::new("applied").fg(Color::Green),
        DispatchOutcome::Undone => Cell::new("undone").fg(Color::Yellow),
        DispatchOutcome::Redone => Cell::new("redone").fg(Color::Yellow),
        DispatchOutcome::Unchanged => dim_cell("unchanged"),
        DispatchOutcome::Nothing => dim_cell("nothing to do"),
    }
}

fn category_cell(category: IssueCategory) -> Cell {
    let color = match category {
        IssueCategory::DanglingReference | IssueCategory::Sources => Color::Red,
        IssueCategory::Order | IssueCategory::Orphan => Color::Yellow,
    };
    Cell::new(category.to_string()).fg(color)
}

fn count_cell(count: usize) -> Cell {
    if count == 0 {
        dim_cell("0")
    } else {
        Cell::new(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell(value: &str) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
