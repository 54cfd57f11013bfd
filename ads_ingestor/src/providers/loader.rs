//! Loading from several sources at once.
//!
//! Sources are fetched one after another. A failing source contributes a
//! warning and no rows; the load fails only when every source failed, and
//! then with the first source's error.

use tracing::{info, warn};

use crate::{
    models::{record::PerformanceRecord, request_params::ReportRequest},
    providers::{ProviderError, ReportSource, ValidationSnafu},
};

#[derive(Debug, Default)]
pub struct LoadReport {
    /// Rows of every source that answered, in source order.
    pub records: Vec<PerformanceRecord>,
    /// One message per source that failed.
    pub warnings: Vec<String>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub async fn load_sources(
    sources: &[&dyn ReportSource],
    request: &ReportRequest,
) -> Result<LoadReport, ProviderError> {
    if sources.is_empty() {
        return ValidationSnafu {
            message: "no report sources configured",
        }
        .fail();
    }

    let mut report = LoadReport::default();
    let mut first_error: Option<ProviderError> = None;
    let mut failures = 0usize;

    for source in sources {
        match source.fetch_records(request).await {
            Ok(rows) => {
                info!(source = source.name(), rows = rows.len(), "source loaded");
                report.records.extend(rows);
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "source failed");
                failures += 1;
                report.warnings.push(format!("{}: {e}", source.name()));
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if failures == sources.len() {
        if let Some(e) = first_error {
            return Err(e);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        models::{date_range::DateRange, platform::Platform},
        providers::ApiSnafu,
    };

    struct Fixed(&'static str, Option<usize>);

    #[async_trait]
    impl ReportSource for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn fetch_records(
            &self,
            _request: &ReportRequest,
        ) -> Result<Vec<PerformanceRecord>, ProviderError> {
            match self.1 {
                Some(n) => {
                    let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
                    Ok((0..n)
                        .map(|i| PerformanceRecord::new(Platform::GoogleAds, format!("c{i}"), date))
                        .collect())
                }
                None => ApiSnafu {
                    message: format!("{} is down", self.0),
                }
                .fail(),
            }
        }
    }

    fn request() -> ReportRequest {
        ReportRequest::new(DateRange::parse("2025-03-01", "2025-03-07").unwrap())
    }

    #[tokio::test]
    async fn both_failing_returns_first_error() {
        let a = Fixed("google", None);
        let b = Fixed("meta", None);
        let err = load_sources(&[&a, &b], &request()).await.unwrap_err();
        assert!(err.to_string().contains("google is down"));
    }

    #[tokio::test]
    async fn one_failing_keeps_the_other() {
        let a = Fixed("google", None);
        let b = Fixed("meta", Some(2));
        let report = load_sources(&[&a, &b], &request()).await.unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("google"));
    }

    #[tokio::test]
    async fn empty_sources_are_not_errors() {
        let a = Fixed("google", Some(0));
        let b = Fixed("meta", Some(0));
        let report = load_sources(&[&a, &b], &request()).await.unwrap();
        assert!(report.is_empty());
        assert!(report.warnings.is_empty());
    }
}
