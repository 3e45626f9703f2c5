//! Correlation and reduction summary report

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::correlation::{CorrelatedPair, CorrelationResult};

/// Correlated pairs printed before the table is cut off
const MAX_PAIRS_TO_REPORT: usize = 20;

/// Summary of one correlation run and the column set it reduces to
#[derive(Debug, Default)]
pub struct CorrelationSummary {
    pub threshold: f64,
    pub analyzed_columns: usize,
    pub correlated_pairs: Vec<CorrelatedPair>,
    pub constant_columns: Vec<String>,
    pub too_many_values: Vec<String>,
    pub kept_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
}

impl CorrelationSummary {
    pub fn new(result: &CorrelationResult, threshold: f64) -> Self {
        let matrix = &result.matrix;
        let kept_columns = matrix.reduced_set(threshold);
        let dropped_columns = matrix
            .column_names()
            .iter()
            .filter(|name| !kept_columns.contains(name))
            .cloned()
            .collect();
        Self {
            threshold,
            analyzed_columns: matrix.len(),
            correlated_pairs: matrix.correlated_pairs(threshold),
            constant_columns: result
                .diagnostics
                .constant_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
            too_many_values: result.diagnostics.too_many_values.clone(),
            kept_columns,
            dropped_columns,
        }
    }

    fn metrics_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Analyzed Columns"),
            Cell::new(self.analyzed_columns),
        ]);
        table.add_row(vec![
            Cell::new(format!("🔗 Pairs |r| >= {:.2}", self.threshold)),
            Cell::new(self.correlated_pairs.len()).fg(if self.correlated_pairs.is_empty() {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("⚖️  Constant Columns"),
            Cell::new(self.constant_columns.len()),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Dropped Columns"),
            Cell::new(self.dropped_columns.len()).fg(if self.dropped_columns.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Kept Columns"),
            Cell::new(self.kept_columns.len())
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table
    }

    fn pairs_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Column 1").add_attribute(Attribute::Bold),
            Cell::new("Column 2").add_attribute(Attribute::Bold),
            Cell::new("Correlation").add_attribute(Attribute::Bold),
        ]);
        for pair in self.correlated_pairs.iter().take(MAX_PAIRS_TO_REPORT) {
            table.add_row(vec![
                Cell::new(&pair.feature1),
                Cell::new(&pair.feature2),
                Cell::new(format!("{:+.4}", pair.correlation)).fg(if pair.correlation < 0.0 {
                    Color::Magenta
                } else {
                    Color::Cyan
                }),
            ]);
        }
        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("CORRELATION SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        for line in self.metrics_table().to_string().lines() {
            println!("    {}", line);
        }

        if !self.correlated_pairs.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("🔗").cyan(),
                style("CORRELATED PAIRS").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            println!();
            for line in self.pairs_table().to_string().lines() {
                println!("    {}", line);
            }
            if self.correlated_pairs.len() > MAX_PAIRS_TO_REPORT {
                println!(
                    "      {}",
                    style(format!(
                        "<{} more>...",
                        self.correlated_pairs.len() - MAX_PAIRS_TO_REPORT
                    ))
                    .dim()
                );
            }
        }

        if !self.dropped_columns.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Dropped by Correlation").yellow(),
                style(format!("({})", self.dropped_columns.len())).dim()
            );
            for column in &self.dropped_columns {
                println!("        {} {}", style("•").dim(), column);
            }
        }

        if !self.too_many_values.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Not Correlated (Too Many Values)").yellow(),
                style(format!("({})", self.too_many_values.len())).dim()
            );
            for column in &self.too_many_values {
                println!("        {} {}", style("•").dim(), column);
            }
        }
    }
}
