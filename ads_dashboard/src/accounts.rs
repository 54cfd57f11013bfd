//! Multi-account Meta Ads report.
//!
//! Accounts are read one after another; campaigns inside an account too.
//! An account that cannot be read is reported as a failure and the rest
//! carry on.

use std::collections::HashSet;

use ads_ingestor::{
    models::{date_range::DateRange, record::PerformanceRecord},
    providers::meta_graph::{MetaAccount, MetaApiError, MetaGraphClient, PurchaseHistory},
};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::metrics::{DerivedMetrics, PeriodComparison, Totals};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountSummary {
    pub name: String,
    pub account_id: String,
    /// Campaigns with at least one row in the current window.
    pub campaigns: usize,
    pub totals: Totals,
    pub derived: DerivedMetrics,
    pub comparison: PeriodComparison,
    pub conversion_details: IndexMap<String, u64>,
    /// `None` when the purchase lookback could not be read.
    pub purchases: Option<PurchaseHistory>,
    /// Campaign-level requests that failed and were skipped.
    pub failed_requests: usize,
}

impl AccountSummary {
    pub fn from_records(
        account: &MetaAccount,
        current: &[PerformanceRecord],
        previous: &[PerformanceRecord],
    ) -> Self {
        let totals = Totals::from_records(current);
        let campaigns: HashSet<&str> = current
            .iter()
            .map(|r| r.campaign_id.as_deref().unwrap_or(&r.campaign_name))
            .collect();
        Self {
            name: account.name.clone(),
            account_id: account.account_id.clone(),
            campaigns: campaigns.len(),
            derived: totals.derived(),
            comparison: PeriodComparison::compute(&totals, &Totals::from_records(previous)),
            conversion_details: totals.conversion_details.clone(),
            totals,
            purchases: None,
            failed_requests: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MultiAccountReport {
    pub summaries: Vec<AccountSummary>,
    /// `(account name, error)` for accounts that could not be read.
    pub failures: Vec<(String, String)>,
    /// Current-window records of every account, tagged with the account name.
    #[serde(skip)]
    pub records: Vec<PerformanceRecord>,
}

/// Summary of one account for `range` against the window before it.
pub async fn summarize_account(
    client: &MetaGraphClient,
    account: &MetaAccount,
    range: &DateRange,
    today: NaiveDate,
) -> Result<(AccountSummary, Vec<PerformanceRecord>), MetaApiError> {
    let performance = client
        .account_performance(account, range, &range.previous())
        .await?;
    let mut summary =
        AccountSummary::from_records(account, &performance.current, &performance.previous);
    summary.failed_requests = performance.failed_requests;

    summary.purchases = match client
        .purchase_history(&account.account_id, &account.token, today)
        .await
    {
        Ok(history) => Some(history),
        Err(e) => {
            warn!(account = %account.name, error = %e, "purchase history unavailable");
            None
        }
    };
    Ok((summary, performance.current))
}

pub async fn summarize_accounts(
    client: &MetaGraphClient,
    accounts: &[MetaAccount],
    range: &DateRange,
    today: NaiveDate,
) -> MultiAccountReport {
    let mut report = MultiAccountReport::default();
    for account in accounts {
        match summarize_account(client, account, range, today).await {
            Ok((summary, records)) => {
                report.summaries.push(summary);
                report.records.extend(records);
            }
            Err(e) => {
                warn!(account = %account.name, error = %e, "account skipped");
                report.failures.push((account.name.clone(), e.to_string()));
            }
        }
    }
    info!(
        accounts = accounts.len(),
        ok = report.summaries.len(),
        failed = report.failures.len(),
        "multi-account report built"
    );
    report
}
