//! Grouped tables as polars frames and CSV files.
//!
//! [`to_dataframe`] keeps raw numbers so a written file parses back to the
//! values it was computed from. [`display_rows`] is the formatted variant,
//! for people.

use std::path::{Path, PathBuf};

use ads_ingestor::io::{
    dataframe::{write_csv, write_dataframe_to_temp},
    sink::SinkError,
};
use indexmap::IndexMap;
use polars::prelude::*;
use thiserror::Error;

use crate::{
    format::{format_count, format_currency, format_decimal, format_percent},
    metrics::{GroupBy, GroupRow},
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build table: {0}")]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Numeric columns following the key columns.
pub const VALUE_COLUMNS: [&str; 10] = [
    "spend",
    "impressions",
    "clicks",
    "conversions",
    "revenue",
    "ctr",
    "cpc",
    "cpm",
    "cpa",
    "roas",
];

/// One row per group: the key columns of `by`, then [`VALUE_COLUMNS`].
pub fn to_dataframe(rows: &[GroupRow], by: GroupBy) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = by
        .key_columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<String> = rows.iter().map(|r| r.key.columns(by)[i].clone()).collect();
            Column::new((*name).into(), values)
        })
        .collect();

    let float = |f: fn(&GroupRow) -> f64| rows.iter().map(f).collect::<Vec<f64>>();
    let count = |f: fn(&GroupRow) -> u64| rows.iter().map(f).collect::<Vec<u64>>();

    columns.extend([
        Column::new(VALUE_COLUMNS[0].into(), float(|r| r.totals.spend)),
        Column::new(VALUE_COLUMNS[1].into(), count(|r| r.totals.impressions)),
        Column::new(VALUE_COLUMNS[2].into(), count(|r| r.totals.clicks)),
        Column::new(VALUE_COLUMNS[3].into(), count(|r| r.totals.conversions)),
        Column::new(VALUE_COLUMNS[4].into(), float(|r| r.totals.revenue)),
        Column::new(VALUE_COLUMNS[5].into(), float(|r| r.derived.ctr)),
        Column::new(VALUE_COLUMNS[6].into(), float(|r| r.derived.cpc)),
        Column::new(VALUE_COLUMNS[7].into(), float(|r| r.derived.cpm)),
        Column::new(VALUE_COLUMNS[8].into(), float(|r| r.derived.cpa)),
        Column::new(VALUE_COLUMNS[9].into(), float(|r| r.derived.roas)),
    ]);

    DataFrame::new(columns)
}

/// Formatted cells per row, keyed by column name.
pub fn display_rows(rows: &[GroupRow], by: GroupBy) -> Vec<IndexMap<String, String>> {
    rows.iter()
        .map(|row| {
            let mut cells: IndexMap<String, String> = by
                .key_columns()
                .iter()
                .map(|c| c.to_string())
                .zip(row.key.columns(by))
                .collect();
            let t = &row.totals;
            let d = &row.derived;
            for (name, value) in [
                ("spend", format_currency(t.spend)),
                ("impressions", format_count(t.impressions as f64)),
                ("clicks", format_count(t.clicks as f64)),
                ("conversions", format_count(t.conversions as f64)),
                ("revenue", format_currency(t.revenue)),
                ("ctr", format_percent(d.ctr)),
                ("cpc", format_currency(d.cpc)),
                ("cpm", format_currency(d.cpm)),
                ("cpa", format_currency(d.cpa)),
                ("roas", format_decimal(d.roas, 2)),
            ] {
                cells.insert(name.to_string(), value);
            }
            cells
        })
        .collect()
}

fn display_dataframe(rows: &[GroupRow], by: GroupBy) -> PolarsResult<DataFrame> {
    let display = display_rows(rows, by);
    let names: Vec<String> = by
        .key_columns()
        .iter()
        .chain(VALUE_COLUMNS.iter())
        .map(|s| s.to_string())
        .collect();
    let columns = names
        .iter()
        .map(|name| {
            let values: Vec<String> = display
                .iter()
                .map(|cells| cells.get(name).cloned().unwrap_or_default())
                .collect();
            Column::new(name.as_str().into(), values)
        })
        .collect();
    DataFrame::new(columns)
}

/// Writes the raw table to `path`.
pub fn write_table_csv(rows: &[GroupRow], by: GroupBy, path: &Path) -> Result<(), ExportError> {
    let mut df = to_dataframe(rows, by)?;
    write_csv(&mut df, path)?;
    Ok(())
}

/// Writes the formatted table to `path`.
pub fn write_display_csv(rows: &[GroupRow], by: GroupBy, path: &Path) -> Result<(), ExportError> {
    let mut df = display_dataframe(rows, by)?;
    write_csv(&mut df, path)?;
    Ok(())
}

/// Writes the table under `dir` (default: the system temp directory) with a
/// `{view}_{timestamp}_{uuid}.csv` name and returns the path.
pub fn export_table(
    rows: &[GroupRow],
    by: GroupBy,
    display: bool,
    dir: Option<&Path>,
) -> Result<PathBuf, ExportError> {
    let mut df = if display {
        display_dataframe(rows, by)?
    } else {
        to_dataframe(rows, by)?
    };
    let path = write_dataframe_to_temp(&mut df, by.name(), dir)?;
    let is_display = display;
    tracing::info!(view = by.name(), rows = rows.len(), display = is_display, path = %path.display(), "table exported");
    Ok(path)
}

/// Parses a CSV written by [`write_table_csv`].
pub fn read_csv_table(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// A numeric column as `f64`, whatever integer or float type it was read as.
pub fn column_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}
