use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    io::dataframe::{records_to_dataframe, write_dataframe_to_temp},
    models::record::PerformanceRecord,
};

#[derive(Debug, Error)]
pub enum SinkError {
    /// Creating or writing a file failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The records could not be turned into the destination format.
    #[error("Data conversion error: {message}")]
    Conversion { message: String },
}

#[async_trait]
pub trait DataSink {
    /// What a successful write hands back, e.g. the path of a created file.
    type Output;

    async fn write(&self, data: &[PerformanceRecord]) -> Result<Self::Output, SinkError>;
}

/// Writes records as a raw CSV file named `{label}_{timestamp}_{uuid}.csv`.
#[derive(Clone, Debug)]
pub struct CsvFileSink {
    label: String,
    dir: Option<PathBuf>,
}

impl CsvFileSink {
    /// A sink writing under `$TMPDIR/ads_ingestor`.
    pub fn temp(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            dir: None,
        }
    }

    pub fn in_dir(label: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            dir: Some(dir.into()),
        }
    }
}

#[async_trait]
impl DataSink for CsvFileSink {
    type Output = PathBuf;

    async fn write(&self, data: &[PerformanceRecord]) -> Result<PathBuf, SinkError> {
        let mut df = records_to_dataframe(data).map_err(|e| SinkError::Conversion {
            message: e.to_string(),
        })?;
        let path = write_dataframe_to_temp(&mut df, &self.label, self.dir.as_deref())?;
        tracing::info!(rows = data.len(), path = %path.display(), "records exported");
        Ok(path)
    }
}
