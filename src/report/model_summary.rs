//! Learned model summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::bayes::NaiveBayesModel;

/// Skipped attributes listed before the list is cut off
const MAX_SKIPPED_TO_REPORT: usize = 10;

fn indent(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn section_header(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

/// Class priors of `model` as a table
pub fn class_prior_table(model: &NaiveBayesModel) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Class Value").add_attribute(Attribute::Bold),
        Cell::new("Rows").add_attribute(Attribute::Bold),
        Cell::new("Prior").add_attribute(Attribute::Bold),
    ]);

    let class_model = model.attribute_model(model.class_column());
    for value in model.sorted_class_values().unwrap_or_default() {
        let rows = class_model
            .and_then(|m| m.rows_for_class(&value))
            .unwrap_or(0);
        let prior = model.class_prior_probability(&value).unwrap_or(0.0);
        table.add_row(vec![
            Cell::new(&value),
            Cell::new(rows),
            Cell::new(format!("{:.4}", prior)).fg(Color::Cyan),
        ]);
    }
    table
}

/// One line per learned attribute with its model type and missing count
pub fn attribute_table(model: &NaiveBayesModel) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Attribute").add_attribute(Attribute::Bold),
        Cell::new("Model").add_attribute(Attribute::Bold),
        Cell::new("Missing").add_attribute(Attribute::Bold),
    ]);

    for attribute in model.attribute_models() {
        if attribute.is_class_model() {
            continue;
        }
        let missing = attribute.missing_count();
        table.add_row(vec![
            Cell::new(attribute.name()),
            Cell::new(attribute.model_type()),
            Cell::new(missing).fg(if missing == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
    }
    table
}

/// Print the summary of a freshly learned or loaded model
pub fn display_model_summary(model: &NaiveBayesModel) {
    section_header("📋", "MODEL SUMMARY");
    println!(
        "      Class column: {}  {}",
        style(model.class_column()).cyan().bold(),
        style(format!("({} rows)", model.total_rows())).dim()
    );
    println!();
    indent(&class_prior_table(model));

    let attributes = attribute_table(model);
    if attributes.row_iter().next().is_some() {
        section_header("🧮", "ATTRIBUTES");
        indent(&attributes);
    }

    if model.contains_skipped_attributes() {
        section_header("📝", "SKIPPED ATTRIBUTES");
        println!(
            "      {} {}",
            style(format!("({})", model.skipped_attributes().len())).dim(),
            style(model.skipped_attributes_summary(MAX_SKIPPED_TO_REPORT)).yellow()
        );
    }
}
