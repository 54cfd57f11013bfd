//! Fetch-and-recompute: the unit of work behind every refresh.

use ads_ingestor::{
    models::{date_range::DateRange, request_params::ReportRequest},
    providers::{ReportSource, loader::load_sources},
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::{
    config::DashboardConfig,
    report::DashboardReport,
    scheduler::Refresher,
    state::RefreshOutcome,
    status::Benchmarks,
};

/// Loads the reporting window and the equal-length window before it from
/// every source, then builds the report.
///
/// A failing source only adds a warning. The refresh fails when every
/// source failed for the current window; a failed previous window degrades
/// to an empty comparison.
pub struct ConnectorRefresher {
    sources: Vec<Box<dyn ReportSource>>,
    window_days: u32,
    tz: Tz,
    benchmarks: Benchmarks,
    fixed_today: Option<NaiveDate>,
}

impl ConnectorRefresher {
    pub fn new(
        sources: Vec<Box<dyn ReportSource>>,
        window_days: u32,
        tz: Tz,
        benchmarks: Benchmarks,
    ) -> Self {
        Self {
            sources,
            window_days,
            tz,
            benchmarks,
            fixed_today: None,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.report_sources()?,
            config.window_days,
            config.tz(),
            config.benchmarks,
        ))
    }

    /// Pins "today" instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Utc::now().with_timezone(&self.tz).date_naive())
    }

    pub fn window(&self) -> anyhow::Result<DateRange> {
        DateRange::last_n_days(self.today(), self.window_days).context("reporting window")
    }

    fn source_refs(&self) -> Vec<&dyn ReportSource> {
        self.sources.iter().map(|s| s.as_ref()).collect()
    }
}

#[async_trait]
impl Refresher for ConnectorRefresher {
    async fn refresh(&self) -> anyhow::Result<RefreshOutcome> {
        let range = self.window()?;
        let sources = self.source_refs();
        info!(since = %range.since, until = %range.until, sources = sources.len(), "refreshing");

        let current = load_sources(&sources, &ReportRequest::new(range))
            .await
            .context("no source could be read")?;
        let mut warnings = current.warnings;

        let previous_range = range.previous();
        let previous = match load_sources(&sources, &ReportRequest::new(previous_range)).await {
            Ok(load) => {
                warnings.extend(load.warnings.into_iter().map(|w| format!("previous period: {w}")));
                load.records
            }
            Err(e) => {
                warn!(error = %e, "previous period unavailable");
                warnings.push(format!("previous period: {e}"));
                Vec::new()
            }
        };

        let report = DashboardReport::build(&current.records, &previous, &self.benchmarks);
        Ok(RefreshOutcome {
            records: current.records,
            report,
            warnings,
        })
    }
}
