use async_trait::async_trait;
use tracing::warn;

use crate::{
    models::{
        record::PerformanceRecord,
        request_params::{ProviderParams, ReportRequest},
    },
    providers::{
        ApiSnafu, ProviderError, ReportSource,
        meta_graph::{DEFAULT_INSIGHT_FIELDS, DAILY_INSIGHT_FIELDS, MetaAccount, MetaGraphClient},
    },
};

/// Reads every campaign of a set of ad accounts through the Graph API.
///
/// Accounts and campaigns are read sequentially. Failed campaigns and
/// failed accounts are skipped; the call fails only when every account
/// failed.
pub struct MetaGraphSource {
    client: MetaGraphClient,
    accounts: Vec<MetaAccount>,
}

impl MetaGraphSource {
    pub fn new(client: MetaGraphClient, accounts: Vec<MetaAccount>) -> Self {
        Self { client, accounts }
    }

    pub fn client(&self) -> &MetaGraphClient {
        &self.client
    }

    pub fn accounts(&self) -> &[MetaAccount] {
        &self.accounts
    }
}

#[async_trait]
impl ReportSource for MetaGraphSource {
    fn name(&self) -> &str {
        "Meta Graph API"
    }

    async fn fetch_records(
        &self,
        request: &ReportRequest,
    ) -> Result<Vec<PerformanceRecord>, ProviderError> {
        let (daily, fields) = match &request.provider_specific {
            ProviderParams::MetaGraph(p) => (
                p.daily,
                p.fields.clone().unwrap_or_else(|| {
                    if p.daily { DAILY_INSIGHT_FIELDS } else { DEFAULT_INSIGHT_FIELDS }.to_string()
                }),
            ),
            ProviderParams::None => (false, DEFAULT_INSIGHT_FIELDS.to_string()),
        };

        let mut records = Vec::new();
        let mut first_error: Option<String> = None;
        let mut failed_accounts = 0usize;

        for account in &self.accounts {
            let campaigns = match self
                .client
                .account_campaigns(&account.account_id, &account.token, 100)
                .await
            {
                Ok(c) => c,
                Err(e) => {
                    warn!(account = %account.name, error = %e, "skipping account");
                    failed_accounts += 1;
                    first_error.get_or_insert_with(|| format!("{}: {e}", account.name));
                    continue;
                }
            };

            for campaign in &campaigns {
                match self
                    .client
                    .fetch_insights(&campaign.id, &account.token, &fields, &request.range, daily)
                    .await
                {
                    Ok(rows) => records.extend(rows.iter().map(|row| {
                        let mut record = self.client.to_record(campaign, row, &request.range);
                        record.account_name = Some(account.name.clone());
                        record
                    })),
                    Err(e) => {
                        warn!(account = %account.name, campaign = %campaign.id, error = %e, "skipping campaign insights");
                    }
                }
            }
        }

        if !self.accounts.is_empty() && failed_accounts == self.accounts.len() {
            return ApiSnafu {
                message: first_error.unwrap_or_else(|| "all accounts failed".to_string()),
            }
            .fail();
        }
        Ok(records)
    }
}
