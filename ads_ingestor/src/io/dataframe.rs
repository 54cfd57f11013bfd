use std::{
    env,
    fs::{self, File},
    path::{Path, PathBuf},
};

use chrono::Utc;
use polars::prelude::{Column, DataFrame, PolarsResult};
use polars_io::{SerWriter, csv::write::CsvWriter};
use uuid::Uuid;

use crate::{io::sink::SinkError, models::record::PerformanceRecord};

/// Subdirectory of the system temp dir used when no directory is given.
pub const TEMP_SUBDIR: &str = "ads_ingestor";

/// Raw, unformatted columns of a record table, in output order.
pub const RECORD_COLUMNS: [&str; 15] = [
    "platform",
    "account",
    "campaign_id",
    "campaign",
    "ad_set",
    "ad",
    "status",
    "date",
    "spend",
    "impressions",
    "clicks",
    "conversions",
    "revenue",
    "reach",
    "frequency",
];

/// Builds one row per record with the columns of [`RECORD_COLUMNS`].
///
/// Values are kept numeric so the written CSV parses back to the same
/// numbers. `reach` and `frequency` are null for Google Ads rows.
pub fn records_to_dataframe(records: &[PerformanceRecord]) -> PolarsResult<DataFrame> {
    let text = |f: &dyn Fn(&PerformanceRecord) -> Option<String>| -> Vec<Option<String>> {
        records.iter().map(f).collect()
    };

    let columns = vec![
        Column::new(
            RECORD_COLUMNS[0].into(),
            text(&|r| Some(r.platform().display_name().to_string())),
        ),
        Column::new(RECORD_COLUMNS[1].into(), text(&|r| r.account_name.clone())),
        Column::new(RECORD_COLUMNS[2].into(), text(&|r| r.campaign_id.clone())),
        Column::new(
            RECORD_COLUMNS[3].into(),
            text(&|r| Some(r.campaign_name.clone())),
        ),
        Column::new(RECORD_COLUMNS[4].into(), text(&|r| r.ad_set_name.clone())),
        Column::new(RECORD_COLUMNS[5].into(), text(&|r| r.ad_name.clone())),
        Column::new(RECORD_COLUMNS[6].into(), text(&|r| r.campaign_status.clone())),
        Column::new(
            RECORD_COLUMNS[7].into(),
            text(&|r| Some(r.date.format("%Y-%m-%d").to_string())),
        ),
        Column::new(
            RECORD_COLUMNS[8].into(),
            records.iter().map(|r| r.spend).collect::<Vec<f64>>(),
        ),
        Column::new(
            RECORD_COLUMNS[9].into(),
            records.iter().map(|r| r.impressions).collect::<Vec<u64>>(),
        ),
        Column::new(
            RECORD_COLUMNS[10].into(),
            records.iter().map(|r| r.clicks).collect::<Vec<u64>>(),
        ),
        Column::new(
            RECORD_COLUMNS[11].into(),
            records.iter().map(|r| r.conversions()).collect::<Vec<u64>>(),
        ),
        Column::new(
            RECORD_COLUMNS[12].into(),
            records.iter().map(|r| r.revenue()).collect::<Vec<f64>>(),
        ),
        Column::new(
            RECORD_COLUMNS[13].into(),
            records
                .iter()
                .map(|r| r.metrics.reach())
                .collect::<Vec<Option<u64>>>(),
        ),
        Column::new(
            RECORD_COLUMNS[14].into(),
            records
                .iter()
                .map(|r| r.metrics.frequency())
                .collect::<Vec<Option<f64>>>(),
        ),
    ];

    DataFrame::new(columns)
}

/// Writes `df` as a comma-delimited UTF-8 CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), SinkError> {
    let mut file = File::create(path).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| SinkError::Conversion {
            message: e.to_string(),
        })
}

/// File name for an export: `{label}_{timestamp}_{uuid}.csv`.
pub fn export_file_name(label: &str) -> String {
    let label: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    format!("{}_{}_{}.csv", label, timestamp, Uuid::new_v4())
}

/// Writes `df` under `dir` (default: `$TMPDIR/ads_ingestor`) and returns
/// the created path.
pub fn write_dataframe_to_temp(
    df: &mut DataFrame,
    label: &str,
    dir: Option<&Path>,
) -> Result<PathBuf, SinkError> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => env::temp_dir().join(TEMP_SUBDIR),
    };
    if !base.exists() {
        fs::create_dir_all(&base).map_err(|source| SinkError::Io {
            path: base.clone(),
            source,
        })?;
    }

    let output_path = base.join(export_file_name(label));
    write_csv(df, &output_path)?;
    Ok(output_path)
}
