//! Subcommand runners

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use polars::prelude::*;
use tracing::info;

use crate::pipeline::bayes::{
    predict_table, probability_column_name, LearnerSettings, NaiveBayesModel, PredictorSettings,
};
use crate::pipeline::correlation::{
    compute_correlations, CorrelationMatrix, CorrelationResult, CorrelationSettings,
};
use crate::pipeline::loader::{dataframe_to_table, load_dataset_with_progress, save_dataset};
use crate::pipeline::table::InMemoryTable;
use crate::report::{
    display_model_summary, export_correlation_report, export_model_report, CorrelationSummary,
};
use crate::utils::{
    create_spinner, finish_with_success, print_completion, print_config, print_count, print_info,
    print_step_header, print_success, print_warning, ProgressMonitor,
};

use super::args::{CorrelateArgs, FilterArgs, LearnArgs, PredictArgs};
use super::prompts::confirm_drop_columns;

/// Columns listed in a warning before the list is cut off
const MAX_COLUMNS_TO_REPORT: usize = 10;

fn load_table(path: &Path, infer_schema_length: usize) -> Result<(DataFrame, InMemoryTable)> {
    println!();
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(path, infer_schema_length)?;
    print_success("Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);

    let table = dataframe_to_table(&df)?;
    Ok((df, table))
}

pub fn run_learn(args: &LearnArgs, infer_schema_length: usize) -> Result<()> {
    let output_path = args.output_path();
    print_config(&[
        ("Input", args.input.display().to_string()),
        ("Class column", args.class_column.clone()),
        ("Output", output_path.display().to_string()),
        ("Max nominal values", args.max_nominal_values.to_string()),
        ("Skip missing", args.skip_missing.to_string()),
    ]);

    print_step_header(1, "Load Dataset");
    let (_, table) = load_table(&args.input, infer_schema_length)?;

    print_step_header(2, "Learn Model");
    let settings = LearnerSettings {
        class_column: args.class_column.clone(),
        max_nominal_values: args.max_nominal_values,
        skip_missing: args.skip_missing,
    };
    let monitor = ProgressMonitor::new("Learning model...");
    let model = match NaiveBayesModel::learn(&table, &settings, &monitor) {
        Ok(model) => {
            monitor.finish("Model learned");
            model
        }
        Err(e) => {
            monitor.abandon("Learning failed");
            return Err(e).context("Failed to learn Naive Bayes model");
        }
    };

    if model.contains_skipped_attributes() {
        print_warning(&format!(
            "Skipped attribute(s): {}",
            model.skipped_attributes_summary(MAX_COLUMNS_TO_REPORT)
        ));
    }
    let with_missing = model.attributes_with_missing_values();
    if !with_missing.is_empty() {
        print_count("attribute(s) with missing values", with_missing.len(), None);
    }

    print_step_header(3, "Save Model");
    model
        .save_to_path(&output_path)
        .with_context(|| format!("Failed to save model to {}", output_path.display()))?;
    print_success(&format!("Saved to {}", output_path.display()));

    if let Some(report_path) = &args.report {
        export_model_report(&model, &args.input.display().to_string(), report_path)?;
        print_success(&format!("Model report saved to {}", report_path.display()));
    }

    display_model_summary(&model);
    print_completion("Model learned successfully!");
    Ok(())
}

pub fn run_predict(args: &PredictArgs, infer_schema_length: usize) -> Result<()> {
    let output_path = args.output_path();
    print_config(&[
        ("Input", args.input.display().to_string()),
        ("Model", args.model.display().to_string()),
        ("Output", output_path.display().to_string()),
        ("Laplace corrector", args.laplace_corrector.to_string()),
        ("Probabilities", args.probabilities.to_string()),
    ]);

    print_step_header(1, "Load Model");
    let model = NaiveBayesModel::load_from_path(&args.model)
        .with_context(|| format!("Failed to load model from {}", args.model.display()))?;
    print_success(&format!(
        "Model for class column '{}' loaded",
        model.class_column()
    ));

    print_step_header(2, "Load Dataset");
    let (mut df, table) = load_table(&args.input, infer_schema_length)?;

    print_step_header(3, "Predict");
    let settings = PredictorSettings {
        laplace_corrector: args.laplace_corrector,
        normalize: !args.no_normalize,
        include_probabilities: args.probabilities,
        prediction_column: args.prediction_column.clone(),
    };
    let monitor = ProgressMonitor::new("Scoring rows...");
    let result = match predict_table(&model, &table, &settings, &monitor) {
        Ok(result) => {
            monitor.finish("Rows scored");
            result
        }
        Err(e) => {
            monitor.abandon("Prediction failed");
            return Err(e).context("Failed to score dataset");
        }
    };

    let predicted: Vec<String> = result
        .predictions
        .iter()
        .map(|p| p.class_value.clone())
        .collect();
    df.with_column(Series::new(
        settings.prediction_column.as_str().into(),
        predicted,
    ))
    .context("Failed to append prediction column")?;

    if settings.include_probabilities {
        for (index, class_value) in result.class_values.iter().enumerate() {
            let scores: Vec<Option<f64>> = result
                .predictions
                .iter()
                .map(|p| p.probabilities.as_ref().map(|probs| probs[index]))
                .collect();
            let name = probability_column_name(model.class_column(), class_value);
            df.with_column(Series::new(name.as_str().into(), scores))
                .with_context(|| format!("Failed to append column '{}'", name))?;
        }
    }
    info!(rows = result.predictions.len(), "predictions appended");

    print_step_header(4, "Save Results");
    let spinner = create_spinner("Writing output file...");
    save_dataset(&mut df, &output_path)?;
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));

    print_completion("Prediction complete!");
    Ok(())
}

fn correlate_table(table: &InMemoryTable, settings: &CorrelationSettings) -> Result<CorrelationResult> {
    let monitor = ProgressMonitor::new("Calculating correlations...");
    match compute_correlations(table, settings, &monitor) {
        Ok(result) => {
            monitor.finish("Correlation analysis complete");
            if let Some(warning) = result.diagnostics.missing_value_warning(MAX_COLUMNS_TO_REPORT) {
                print_warning(&warning);
            }
            if let Some(warning) = result
                .diagnostics
                .constant_columns_warning(MAX_COLUMNS_TO_REPORT)
            {
                print_warning(&warning);
            }
            Ok(result)
        }
        Err(e) => {
            monitor.abandon("Correlation failed");
            Err(e).context("Failed to compute correlations")
        }
    }
}

pub fn run_correlate(args: &CorrelateArgs, infer_schema_length: usize) -> Result<()> {
    let output_path = args.output_path();
    print_config(&[
        ("Input", args.input.display().to_string()),
        ("Output", output_path.display().to_string()),
        ("Threshold", format!("{:.2}", args.threshold)),
        ("Max possible values", args.max_possible_values.to_string()),
    ]);

    print_step_header(1, "Load Dataset");
    let (_, table) = load_table(&args.input, infer_schema_length)?;

    print_step_header(2, "Correlation Analysis");
    let settings = CorrelationSettings {
        columns: (!args.columns.is_empty()).then(|| args.columns.clone()),
        max_possible_values: args.max_possible_values,
    };
    let result = correlate_table(&table, &settings)?;

    print_step_header(3, "Save Matrix");
    result
        .matrix
        .save_to_path(&output_path)
        .with_context(|| format!("Failed to save matrix to {}", output_path.display()))?;
    print_success(&format!("Saved to {}", output_path.display()));

    let summary = CorrelationSummary::new(&result, args.threshold);
    if let Some(report_path) = &args.report {
        export_correlation_report(&summary, &args.input.display().to_string(), report_path)?;
        print_success(&format!("Report saved to {}", report_path.display()));
    }

    summary.display();
    print_completion("Correlation analysis complete!");
    Ok(())
}

pub fn run_filter(args: &FilterArgs, infer_schema_length: usize) -> Result<()> {
    let output_path = args.output_path();
    print_config(&[
        ("Input", args.input.display().to_string()),
        (
            "Matrix",
            args.matrix
                .as_ref()
                .map_or_else(|| "(computed)".to_string(), |p| p.display().to_string()),
        ),
        ("Output", output_path.display().to_string()),
        ("Threshold", format!("{:.2}", args.threshold)),
    ]);

    print_step_header(1, "Load Dataset");
    let (df, table) = load_table(&args.input, infer_schema_length)?;

    print_step_header(2, "Correlation Matrix");
    let matrix = match &args.matrix {
        Some(path) => {
            let matrix = CorrelationMatrix::load_from_path(path)
                .with_context(|| format!("Failed to load matrix from {}", path.display()))?;
            print_success(&format!("Loaded matrix of {} column(s)", matrix.len()));
            matrix
        }
        None => {
            let settings = CorrelationSettings {
                columns: None,
                max_possible_values: args.max_possible_values,
            };
            correlate_table(&table, &settings)?.matrix
        }
    };

    print_step_header(3, "Reduce Columns");
    let all_columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let kept = matrix.filter_columns(&all_columns, args.threshold);
    let dropped: Vec<&String> = all_columns.iter().filter(|c| !kept.contains(c)).collect();

    let selected = if dropped.is_empty() {
        print_info("No highly correlated columns found");
        all_columns.clone()
    } else {
        print_count(
            "column(s) to drop",
            dropped.len(),
            Some(&format!("(|r| >= {:.2})", args.threshold)),
        );
        if args.no_confirm || confirm_drop_columns(dropped.len(), args.threshold)? {
            kept
        } else {
            print_info("Keeping all columns");
            all_columns.clone()
        }
    };

    let mut reduced = df
        .select(selected.iter().map(String::as_str))
        .context("Failed to select kept columns")?;

    print_step_header(4, "Save Results");
    let spinner = create_spinner("Writing output file...");
    save_dataset(&mut reduced, &output_path)?;
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));

    println!(
        "      {} of {} column(s) kept",
        style(selected.len()).green().bold(),
        all_columns.len()
    );
    print_completion("Column reduction complete!");
    Ok(())
}
