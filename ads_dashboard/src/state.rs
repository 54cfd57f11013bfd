//! Application state published as immutable snapshots.
//!
//! Readers call [`StateStore::snapshot`] and get an `Arc<Snapshot>` without
//! locking. Each transition builds a new snapshot from the current one and
//! swaps it in, so a reader sees either the old state or the new one.

use std::sync::Arc;

use ads_ingestor::models::record::PerformanceRecord;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::report::DashboardReport;

/// Refresh lifecycle: `Idle → Fetching → Ready | Error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Ready,
    Error(String),
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub phase: Phase,
    /// Records of the latest successful refresh.
    pub current: Arc<Vec<PerformanceRecord>>,
    /// The dataset `current` replaced; kept across refreshes that return
    /// nothing.
    pub previous: Arc<Vec<PerformanceRecord>>,
    pub report: Option<Arc<DashboardReport>>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub auto_refresh: bool,
    pub last_error: Option<String>,
    /// Non-fatal problems of the latest refresh (one source failing, ...).
    pub warnings: Vec<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            current: Arc::new(Vec::new()),
            previous: Arc::new(Vec::new()),
            report: None,
            last_refresh: None,
            auto_refresh: false,
            last_error: None,
            warnings: Vec::new(),
        }
    }
}

/// What a successful refresh produced.
#[derive(Clone, Debug)]
pub struct RefreshOutcome {
    pub records: Vec<PerformanceRecord>,
    pub report: DashboardReport,
    pub warnings: Vec<String>,
}

pub struct StateStore {
    inner: ArcSwap<Snapshot>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(false)
    }
}

impl StateStore {
    pub fn new(auto_refresh: bool) -> Self {
        Self {
            inner: ArcSwap::from_pointee(Snapshot {
                auto_refresh,
                ..Snapshot::default()
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.load_full()
    }

    fn update(&self, f: impl Fn(&Snapshot) -> Snapshot) -> Arc<Snapshot> {
        self.inner.rcu(|old| Arc::new(f(old)));
        self.inner.load_full()
    }

    /// Marks a refresh as started. Data of the previous refresh stays
    /// readable meanwhile.
    pub fn begin_refresh(&self) -> Arc<Snapshot> {
        self.update(|old| Snapshot {
            phase: Phase::Fetching,
            ..old.clone()
        })
    }

    /// Publishes a finished refresh.
    ///
    /// The dataset being replaced becomes `previous` only when it held rows,
    /// so an empty refresh does not wipe the last real comparison.
    pub fn complete_refresh(&self, outcome: RefreshOutcome) -> Arc<Snapshot> {
        let records = Arc::new(outcome.records);
        let report = Arc::new(outcome.report);
        let now = Utc::now();
        let snapshot = self.update(|old| Snapshot {
            phase: Phase::Ready,
            previous: if old.current.is_empty() {
                old.previous.clone()
            } else {
                old.current.clone()
            },
            current: records.clone(),
            report: Some(report.clone()),
            last_refresh: Some(now),
            last_error: None,
            warnings: outcome.warnings.clone(),
            ..old.clone()
        });
        info!(rows = snapshot.current.len(), warnings = snapshot.warnings.len(), "refresh complete");
        snapshot
    }

    /// Records a failed refresh; the data already shown is kept.
    pub fn fail_refresh(&self, message: impl Into<String>) -> Arc<Snapshot> {
        let message = message.into();
        warn!(error = %message, "refresh failed");
        self.update(|old| Snapshot {
            phase: Phase::Error(message.clone()),
            last_error: Some(message.clone()),
            ..old.clone()
        })
    }

    pub fn set_auto_refresh(&self, enabled: bool) -> Arc<Snapshot> {
        self.update(|old| Snapshot {
            auto_refresh: enabled,
            ..old.clone()
        })
    }
}
