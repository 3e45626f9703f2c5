//! Dataset loader for CSV and Parquet files

use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

use super::table::{Cell, ColumnKind, ColumnSpec, InMemoryTable};

fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a dataset from a file (CSV or Parquet based on extension)
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<LazyFrame> {
    let extension = file_extension(path);

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(infer_schema_length))
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    Ok(lf)
}

/// Load and collect a dataset.
///
/// Returns the frame with its row count, column count and estimated size in MB.
pub fn load_dataset_with_progress(
    path: &Path,
    infer_schema_length: usize,
) -> Result<(DataFrame, usize, usize, f64)> {
    let df = load_dataset(path, infer_schema_length)?
        .collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    Ok((df, rows, cols, memory_mb))
}

/// How a polars column is seen by the learners
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    match dtype {
        dt if dt.is_primitive_numeric() => ColumnKind::Numeric,
        DataType::String | DataType::Boolean | DataType::Categorical(_, _) => ColumnKind::Nominal,
        _ => ColumnKind::Unsupported,
    }
}

/// Convert a frame into an in-memory table; nulls become missing cells
pub fn dataframe_to_table(df: &DataFrame) -> Result<InMemoryTable> {
    let columns = df
        .get_columns()
        .iter()
        .map(|col| {
            let kind = column_kind(col.dtype());
            let name = col.name().to_string();
            let cells = column_cells(col, kind)
                .with_context(|| format!("Failed to convert column '{}'", name))?;
            Ok((ColumnSpec::new(name, kind), cells))
        })
        .collect::<Result<Vec<_>>>()?;
    InMemoryTable::from_columns(columns)
}

fn column_cells(col: &Column, kind: ColumnKind) -> Result<Vec<Cell>> {
    let cells = match kind {
        ColumnKind::Numeric => {
            let cast = col.cast(&DataType::Float64)?;
            cast.as_materialized_series()
                .f64()?
                .iter()
                .map(Cell::from)
                .collect()
        }
        ColumnKind::Nominal => {
            let cast = col.cast(&DataType::String)?;
            cast.as_materialized_series()
                .str()?
                .iter()
                .map(Cell::from)
                .collect()
        }
        // learners ignore these columns, only the shape matters
        ColumnKind::Unsupported => vec![Cell::Missing; col.len()],
    };
    Ok(cells)
}

/// Write a frame as CSV or Parquet, chosen by the file extension
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = file_extension(path);
    let create = || {
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))
    };

    match extension.as_str() {
        "csv" => CsvWriter::new(create()?)
            .finish(df)
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))?,
        "parquet" => {
            ParquetWriter::new(create()?)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}
