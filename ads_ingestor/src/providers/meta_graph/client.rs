use std::{num::NonZeroU32, sync::Arc, time::Duration};

use chrono::{NaiveDate, TimeDelta};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    models::{
        date_range::{DateRange, parse_date},
        platform::PlatformMetrics,
        record::PerformanceRecord,
    },
    providers::{
        ProviderInitError, redact_url,
        meta_graph::{
            CAMPAIGN_FIELDS, DAILY_INSIGHT_FIELDS, DEFAULT_INSIGHT_FIELDS, MetaAccount,
            MetaApiError, PurchaseFlag, PurchaseHistory,
            response::{Campaign, InsightRow, Paging},
            rules::ConversionRules,
        },
        retry::{RetryPolicy, Sleeper, TokioSleeper},
    },
};

/// The error and its causes, without the request URL.
fn describe_transport_error(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v22.0";

/// Upper bound on `paging.next` hops for one listing.
const MAX_PAGES: usize = 50;

/// Days looked back by [`MetaGraphClient::purchase_history`].
pub const PURCHASE_LOOKBACK_DAYS: u32 = 90;

#[derive(Clone, Debug)]
pub struct MetaClientConfig {
    pub base_url: String,
    pub api_version: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    /// Client-side pacing; `None` sends requests back to back.
    pub requests_per_second: Option<NonZeroU32>,
}

impl Default for MetaClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
            requests_per_second: None,
        }
    }
}

/// Records for one account: the requested window and the window before it.
#[derive(Clone, Debug, Default)]
pub struct AccountPerformance {
    pub current: Vec<PerformanceRecord>,
    pub previous: Vec<PerformanceRecord>,
    /// Campaign-level fetches that failed and were skipped.
    pub failed_requests: usize,
}

pub struct MetaGraphClient {
    client: Client,
    root: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    rules: ConversionRules,
}

impl MetaGraphClient {
    pub fn new(config: MetaClientConfig) -> Result<Self, ProviderInitError> {
        let root = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.api_version.trim_matches('/')
        );
        if reqwest::Url::parse(&root).is_err() {
            return crate::providers::InvalidUrlSnafu { url: root }.fail();
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        let limiter = config
            .requests_per_second
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self {
            client,
            root,
            retry: config.retry,
            sleeper: Arc::new(TokioSleeper),
            limiter,
            rules: ConversionRules::default(),
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_rules(mut self, rules: ConversionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &ConversionRules {
        &self.rules
    }

    fn url(&self, entity_id: &str, edge: &str) -> String {
        format!("{}/{}/{}", self.root, entity_id, edge)
    }

    /// Issues one GET with the retry policy applied.
    ///
    /// - 200: the decoded JSON body.
    /// - 429: wait `Retry-After` (or the default delay) and try again.
    /// - any other status: logged and returned at once, no retry.
    /// - transport failure: wait the default delay and try again.
    ///
    /// After `max_attempts` the last failure is returned as
    /// [`MetaApiError::RetriesExhausted`].
    pub async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Value, MetaApiError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::from("no attempt made");
        // Paging cursors embed the access token; only the path is logged.
        let log_url = redact_url(url);

        for attempt in 1..=attempts {
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }
            let is_last = attempt == attempts;

            match self.client.get(url).query(params).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::OK {
                        return response
                            .json::<Value>()
                            .await
                            .map_err(|e| MetaApiError::Decode(e.without_url().to_string()));
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let wait = self.retry.retry_after(response.headers());
                        last_error = "rate limited (HTTP 429)".to_string();
                        if !is_last {
                            warn!(url = %log_url, attempt, wait_secs = wait.as_secs_f64(), "rate limited by Graph API, backing off");
                            self.sleeper.sleep(wait).await;
                        }
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    error!(url = %log_url, status = status.as_u16(), %body, "Graph API request failed");
                    return Err(MetaApiError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(err) => {
                    let message = describe_transport_error(err);
                    error!(url = %log_url, attempt, error = %message, "Graph API request raised a transport error");
                    last_error = message;
                    if !is_last {
                        self.sleeper.sleep(self.retry.default_delay).await;
                    }
                }
            }
        }

        error!(url = %log_url, attempts, "Graph API request failed after all attempts");
        Err(MetaApiError::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    /// Fetches every page of a listing edge, following `paging.next`.
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: &str,
        params: Vec<(String, String)>,
    ) -> Result<Vec<T>, MetaApiError> {
        let mut items = Vec::new();
        let mut next: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = match &next {
                // `next` already carries every query parameter, token included.
                Some(cursor) => self.get_json(cursor, &[]).await?,
                None => self.get_json(url, &params).await?,
            };

            let data = page
                .get("data")
                .cloned()
                .ok_or_else(|| MetaApiError::Decode("response has no `data` array".to_string()))?;
            let batch: Vec<T> =
                serde_json::from_value(data).map_err(|e| MetaApiError::Decode(e.to_string()))?;
            items.extend(batch);

            let paging: Paging = page
                .get("paging")
                .cloned()
                .and_then(|p| serde_json::from_value(p).ok())
                .unwrap_or_default();
            match paging.next {
                Some(cursor) => next = Some(cursor),
                None => return Ok(items),
            }
        }

        warn!(url = %redact_url(url), pages = MAX_PAGES, "stopped following Graph API paging");
        Ok(items)
    }

    /// Lists the campaigns of an ad account.
    pub async fn account_campaigns(
        &self,
        account_id: &str,
        token: &SecretString,
        limit: u32,
    ) -> Result<Vec<Campaign>, MetaApiError> {
        let params = vec![
            ("fields".to_string(), CAMPAIGN_FIELDS.to_string()),
            ("limit".to_string(), limit.to_string()),
            ("access_token".to_string(), token.expose_secret().to_string()),
        ];
        self.get_all_pages(&self.url(account_id, "campaigns"), params)
            .await
    }

    /// Fetches insight rows for a campaign (or account) over `range`.
    ///
    /// With `daily` set, one row per day is requested (`time_increment=1`).
    pub async fn fetch_insights(
        &self,
        entity_id: &str,
        token: &SecretString,
        fields: &str,
        range: &DateRange,
        daily: bool,
    ) -> Result<Vec<InsightRow>, MetaApiError> {
        let mut params = vec![
            ("fields".to_string(), fields.to_string()),
            ("time_range[since]".to_string(), range.since_str()),
            ("time_range[until]".to_string(), range.until_str()),
            ("level".to_string(), "campaign".to_string()),
        ];
        if daily {
            params.push(("time_increment".to_string(), "1".to_string()));
        }
        params.push(("access_token".to_string(), token.expose_secret().to_string()));

        self.get_all_pages(&self.url(entity_id, "insights"), params)
            .await
    }

    pub async fn campaign_insights(
        &self,
        campaign_id: &str,
        token: &SecretString,
        range: &DateRange,
    ) -> Result<Vec<InsightRow>, MetaApiError> {
        self.fetch_insights(campaign_id, token, DEFAULT_INSIGHT_FIELDS, range, false)
            .await
    }

    pub async fn daily_insights(
        &self,
        campaign_id: &str,
        token: &SecretString,
        range: &DateRange,
    ) -> Result<Vec<InsightRow>, MetaApiError> {
        self.fetch_insights(campaign_id, token, DAILY_INSIGHT_FIELDS, range, true)
            .await
    }

    /// Maps one insight row of `campaign` onto a record.
    ///
    /// Campaign-level rows without `date_start` are dated at the start of
    /// `range`.
    pub fn to_record(
        &self,
        campaign: &Campaign,
        row: &InsightRow,
        range: &DateRange,
    ) -> PerformanceRecord {
        let tally = self.rules.tally(&row.actions, &row.action_values);
        let date = row
            .date_start
            .as_deref()
            .and_then(|d| parse_date(d).ok())
            .unwrap_or(range.since);

        PerformanceRecord {
            campaign_name: campaign.name.clone().unwrap_or_else(|| campaign.id.clone()),
            ad_set_name: None,
            ad_name: None,
            date,
            spend: row.spend.max(0.0),
            impressions: row.impressions,
            clicks: row.clicks,
            metrics: PlatformMetrics::MetaAds {
                purchase_actions: tally.conversions,
                purchase_value: tally.revenue,
                reach: row.reach,
                frequency: row.frequency,
            },
            account_name: None,
            campaign_id: Some(campaign.id.clone()),
            campaign_status: campaign.status.clone(),
            conversion_details: tally.details,
        }
    }

    /// Campaign-level records for every campaign of `account`, for the
    /// `current` window and the `previous` comparison window.
    ///
    /// Campaigns are fetched one after another. A campaign whose insights
    /// cannot be fetched is skipped; only a failure to list campaigns fails
    /// the whole account.
    pub async fn account_performance(
        &self,
        account: &MetaAccount,
        current: &DateRange,
        previous: &DateRange,
    ) -> Result<AccountPerformance, MetaApiError> {
        let campaigns = self
            .account_campaigns(&account.account_id, &account.token, 100)
            .await?;
        if campaigns.is_empty() {
            warn!(account = %account.name, "no campaigns found for account");
            return Ok(AccountPerformance::default());
        }

        let mut out = AccountPerformance::default();
        for campaign in &campaigns {
            for (range, sink) in [(current, &mut out.current), (previous, &mut out.previous)] {
                match self.campaign_insights(&campaign.id, &account.token, range).await {
                    Ok(rows) => sink.extend(rows.iter().map(|row| {
                        let mut record = self.to_record(campaign, row, range);
                        record.account_name = Some(account.name.clone());
                        record
                    })),
                    Err(e) => {
                        out.failed_requests += 1;
                        warn!(account = %account.name, campaign = %campaign.id, error = %e, "skipping campaign insights");
                    }
                }
            }
        }

        info!(
            account = %account.name,
            campaigns = campaigns.len(),
            current_rows = out.current.len(),
            previous_rows = out.previous.len(),
            "account performance loaded"
        );
        Ok(out)
    }

    /// Daily records for one campaign.
    pub async fn daily_performance(
        &self,
        campaign: &Campaign,
        token: &SecretString,
        range: &DateRange,
    ) -> Result<Vec<PerformanceRecord>, MetaApiError> {
        let rows = self.daily_insights(&campaign.id, token, range).await?;
        debug!(campaign = %campaign.id, days = rows.len(), "daily insights loaded");
        Ok(rows
            .iter()
            .map(|row| self.to_record(campaign, row, range))
            .collect())
    }

    /// Purchases recorded over the last 90 days, summed across campaigns.
    ///
    /// Campaigns whose insights fail are skipped.
    pub async fn purchase_history(
        &self,
        account_id: &str,
        token: &SecretString,
        today: NaiveDate,
    ) -> Result<PurchaseHistory, MetaApiError> {
        let range = DateRange {
            since: today - TimeDelta::days(i64::from(PURCHASE_LOOKBACK_DAYS)),
            until: today,
        };
        let campaigns = self.account_campaigns(account_id, token, 100).await?;

        let mut total_purchases = 0u64;
        let mut has_purchases = false;
        for campaign in &campaigns {
            let rows = match self
                .fetch_insights(&campaign.id, token, "actions,action_values", &range, false)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    debug!(campaign = %campaign.id, error = %e, "skipping campaign in purchase history");
                    continue;
                }
            };
            for action in rows.iter().flat_map(|r| r.actions.iter()) {
                if action.action_type == "purchase" {
                    total_purchases += action.count();
                    has_purchases = true;
                }
            }
        }

        Ok(PurchaseHistory {
            total_purchases,
            has_purchases,
            flag: PurchaseFlag::from_total(total_purchases, has_purchases),
        })
    }
}
