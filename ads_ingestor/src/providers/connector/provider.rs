use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_secret_env_var;
use tracing::{debug, info, warn};

use crate::{
    models::{platform::Platform, record::PerformanceRecord, request_params::ReportRequest},
    providers::{
        DecodeSnafu, HttpStatusSnafu, ProviderError, ProviderInitError, ReportSource,
        connector::{
            params::{ConnectorParams, construct_params},
            response::{ConnectorResponse, normalize_row},
        },
    },
};

/// Single-attempt timeout for connector calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ConnectorSource {
    client: Client,
    platform: Platform,
    base_url: String,
    api_key: SecretString,
    params: ConnectorParams,
}

impl ConnectorSource {
    /// Creates a connector source for one platform endpoint.
    pub fn new(
        platform: Platform,
        base_url: impl Into<String>,
        api_key: SecretString,
        params: ConnectorParams,
    ) -> Result<Self, ProviderInitError> {
        let base_url = base_url.into();
        if reqwest::Url::parse(&base_url).is_err() {
            return crate::providers::InvalidUrlSnafu { url: base_url }.fail();
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            platform,
            base_url,
            api_key,
            params,
        })
    }

    /// Creates a connector source, reading the API key from `api_key_env`.
    pub fn from_env(
        platform: Platform,
        base_url: impl Into<String>,
        api_key_env: &str,
        params: ConnectorParams,
    ) -> Result<Self, ProviderInitError> {
        let api_key = get_secret_env_var(api_key_env)?;
        Self::new(platform, base_url, api_key, params)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

#[async_trait]
impl ReportSource for ConnectorSource {
    fn name(&self) -> &str {
        self.platform.display_name()
    }

    async fn fetch_records(
        &self,
        request: &ReportRequest,
    ) -> Result<Vec<PerformanceRecord>, ProviderError> {
        let query = construct_params(self.platform, &self.params, request);
        debug!(source = self.name(), url = %self.base_url, ?query, "requesting connector export");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("api_key", self.api_key.expose_secret())])
            .query(&query)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(&self.base_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return HttpStatusSnafu {
                url: self.base_url.as_str(),
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_transport(&self.base_url, e))?;
        let payload: ConnectorResponse = serde_json::from_slice(&bytes).map_err(|e| {
            DecodeSnafu {
                url: self.base_url.as_str(),
                message: e.to_string(),
            }
            .build()
        })?;

        let mut records = Vec::with_capacity(payload.data.len());
        let mut skipped = 0usize;
        for row in &payload.data {
            match normalize_row(row, self.platform) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    skipped += 1;
                    debug!(source = self.name(), %reason, "skipping connector row");
                }
            }
        }
        if skipped > 0 {
            warn!(source = self.name(), skipped, "connector rows without a usable date were dropped");
        }
        info!(source = self.name(), rows = records.len(), "connector export loaded");

        Ok(records)
    }
}
