//! Dashboard configuration: parsing, normalization, and loading.
//!
//! The TOML file names data sources, Meta ad accounts, refresh policy,
//! status benchmarks and the conversion taxonomy. It never holds
//! credentials: connectors and accounts name the environment variable that
//! carries their key or token.
//!
//! ```toml
//! timezone = "America/Sao_Paulo"
//! conversion_action_types = ["purchase", "lead"]
//!
//! [connectors.google_ads]
//! base_url = "https://connectors.example.com/google_ads"
//! api_key_env = "ADS_CONNECTOR_API_KEY"
//! accounts = ["304-359-3631"]
//!
//! [accounts.vogel]
//! name = "Vogel Calçados"
//! account_id = "act_1234"
//! token_env = "META_TOKEN_VOGEL"
//!
//! [refresh]
//! auto = true
//! interval_secs = 300
//! ```
//!
//! Entrypoints: [`load_config_str`] and [`load_config_path`]; both parse and
//! then run [`normalize_config`].

use std::{collections::HashSet, num::NonZeroU32, str::FromStr, time::Duration};

use ads_ingestor::{
    models::platform::Platform,
    providers::{
        ReportSource,
        connector::{ConnectorParams, ConnectorSource},
        meta_graph::{
            ConversionRules, MetaAccount, MetaClientConfig, MetaGraphClient, MetaGraphSource,
            client::DEFAULT_API_VERSION,
        },
        retry::RetryPolicy,
    },
    webhook::WebhookClient,
};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shared_utils::env::get_secret_env_var;
use thiserror::Error;
use toml::from_str;
use tracing::debug;

use crate::status::Benchmarks;

pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
pub const DEFAULT_REFRESH_SECS: u64 = 300;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("account key cannot be empty after trimming")]
    EmptyAccountKey,

    #[error("duplicate account key after normalization: {0}")]
    DuplicateAccount(String),

    #[error("{field} of account '{account}' cannot be empty")]
    EmptyAccountField { account: String, field: &'static str },

    #[error("connector '{0}' needs a base_url and an api_key_env")]
    IncompleteConnector(&'static str),

    #[error("unknown time zone '{0}'")]
    UnknownTimezone(String),

    #[error("refresh interval must be at least one second")]
    ZeroInterval,

    #[error("window_days must be at least 1")]
    ZeroWindow,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// IANA zone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Length of the reporting window, in days, ending today.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Graph `action_type`s counted as conversions.
    #[serde(default = "default_conversion_types")]
    pub conversion_action_types: Vec<String>,
    /// Graph `action_type`s whose values count as revenue.
    #[serde(default = "default_revenue_types")]
    pub revenue_action_types: Vec<String>,

    #[serde(default)]
    pub connectors: ConnectorsCfg,
    #[serde(default)]
    pub meta: MetaCfg,
    /// Meta ad accounts keyed by a short lowercase handle.
    #[serde(default)]
    pub accounts: IndexMap<String, AccountCfg>,
    #[serde(default)]
    pub refresh: RefreshCfg,
    #[serde(default)]
    pub benchmarks: Benchmarks,
    pub webhook: Option<WebhookCfg>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorsCfg {
    pub google_ads: Option<ConnectorCfg>,
    pub meta_ads: Option<ConnectorCfg>,
}

/// One reporting connector endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorCfg {
    pub base_url: String,
    /// Environment variable holding the connector API key.
    pub api_key_env: String,
    /// Passed as `select_accounts`.
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Field list override.
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetaCfg {
    pub base_url: String,
    pub api_version: String,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub timeout_secs: u64,
    pub requests_per_second: Option<u32>,
}

impl Default for MetaCfg {
    fn default() -> Self {
        let client = MetaClientConfig::default();
        Self {
            base_url: client.base_url,
            api_version: DEFAULT_API_VERSION.to_string(),
            max_attempts: client.retry.max_attempts,
            retry_delay_secs: client.retry.default_delay.as_secs(),
            timeout_secs: client.timeout.as_secs(),
            requests_per_second: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AccountCfg {
    /// Display name.
    pub name: String,
    /// Graph account id, `act_` prefix included.
    pub account_id: String,
    /// Environment variable holding the account's access token.
    pub token_env: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshCfg {
    pub auto: bool,
    pub interval_secs: u64,
}

impl Default for RefreshCfg {
    fn default() -> Self {
        Self {
            auto: false,
            interval_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookCfg {
    pub url: String,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

fn default_conversion_types() -> Vec<String> {
    ConversionRules::default().conversion_action_types
}

fn default_revenue_types() -> Vec<String> {
    ConversionRules::default().revenue_action_types
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq)]
pub struct NormalizationReport {
    /// Account keys that changed when lowercasing/trimming.
    pub accounts_renamed: usize,
    /// Duplicate conversion or revenue action types removed.
    pub action_types_deduped: usize,
}

fn dedupe_preserving_order(list: &mut Vec<String>) -> usize {
    let before = list.len();
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(before);
    for item in std::mem::take(list) {
        let item = item.trim().to_string();
        if !item.is_empty() && seen.insert(item.clone()) {
            out.push(item);
        }
    }
    *list = out;
    before - list.len()
}

/// Normalizes a configuration in place.
///
/// - Account keys are trimmed and lowercased; duplicates after that are an
///   error, as are empty ids and empty token variables.
/// - Action type lists are trimmed and de-duplicated, keeping first
///   occurrences.
/// - The time zone must be a known IANA name; the refresh interval and the
///   window length must be positive.
pub fn normalize_config(cfg: &mut DashboardConfig) -> Result<NormalizationReport, ConfigError> {
    let mut report = NormalizationReport::default();

    let mut rebuilt: IndexMap<String, AccountCfg> = IndexMap::new();
    for (raw_key, mut account) in std::mem::take(&mut cfg.accounts) {
        let key = raw_key.trim().to_lowercase();
        if key.is_empty() {
            return Err(ConfigError::EmptyAccountKey);
        }
        if key != raw_key {
            report.accounts_renamed += 1;
        }
        if rebuilt.contains_key(&key) {
            return Err(ConfigError::DuplicateAccount(key));
        }

        account.account_id = account.account_id.trim().to_string();
        account.token_env = account.token_env.trim().to_string();
        account.name = account.name.trim().to_string();
        for (field, value) in [
            ("account_id", &account.account_id),
            ("token_env", &account.token_env),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyAccountField {
                    account: key.clone(),
                    field,
                });
            }
        }
        if account.name.is_empty() {
            account.name = key.clone();
        }
        rebuilt.insert(key, account);
    }
    cfg.accounts = rebuilt;

    for (name, connector) in [
        ("google_ads", &mut cfg.connectors.google_ads),
        ("meta_ads", &mut cfg.connectors.meta_ads),
    ] {
        if let Some(c) = connector {
            c.base_url = c.base_url.trim().to_string();
            c.api_key_env = c.api_key_env.trim().to_string();
            if c.base_url.is_empty() || c.api_key_env.is_empty() {
                return Err(ConfigError::IncompleteConnector(name));
            }
        }
    }

    report.action_types_deduped += dedupe_preserving_order(&mut cfg.conversion_action_types);
    report.action_types_deduped += dedupe_preserving_order(&mut cfg.revenue_action_types);

    cfg.timezone = cfg.timezone.trim().to_string();
    if Tz::from_str(&cfg.timezone).is_err() {
        return Err(ConfigError::UnknownTimezone(cfg.timezone.clone()));
    }
    if cfg.refresh.interval_secs == 0 {
        return Err(ConfigError::ZeroInterval);
    }
    if cfg.window_days == 0 {
        return Err(ConfigError::ZeroWindow);
    }

    Ok(report)
}

/// Parse and normalize a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<DashboardConfig> {
    let mut cfg: DashboardConfig = from_str(toml_str).context("failed to parse config TOML")?;
    let report = normalize_config(&mut cfg).context("invalid configuration")?;
    debug!(?report, "configuration normalized");
    Ok(cfg)
}

/// Read a configuration file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<DashboardConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

impl DashboardConfig {
    pub fn tz(&self) -> Tz {
        // normalize_config has validated the name.
        Tz::from_str(&self.timezone).unwrap_or(chrono_tz::America::Sao_Paulo)
    }

    /// Today's date in the configured time zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz()).date_naive()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    pub fn conversion_rules(&self) -> ConversionRules {
        ConversionRules {
            conversion_action_types: self.conversion_action_types.clone(),
            revenue_action_types: self.revenue_action_types.clone(),
        }
    }

    pub fn meta_client_config(&self) -> MetaClientConfig {
        MetaClientConfig {
            base_url: self.meta.base_url.clone(),
            api_version: self.meta.api_version.clone(),
            retry: RetryPolicy {
                max_attempts: self.meta.max_attempts,
                default_delay: Duration::from_secs(self.meta.retry_delay_secs),
            },
            timeout: Duration::from_secs(self.meta.timeout_secs),
            requests_per_second: self.meta.requests_per_second.and_then(NonZeroU32::new),
        }
    }

    /// Graph API client with the configured retry policy and taxonomy.
    pub fn meta_client(&self) -> anyhow::Result<MetaGraphClient> {
        let client = MetaGraphClient::new(self.meta_client_config())
            .context("build Meta Graph API client")?;
        Ok(client.with_rules(self.conversion_rules()))
    }

    /// Resolves every account's token from the environment.
    pub fn meta_accounts(&self) -> anyhow::Result<Vec<MetaAccount>> {
        self.accounts
            .iter()
            .map(|(key, account)| {
                let token = get_secret_env_var(&account.token_env)
                    .with_context(|| format!("token for account '{key}'"))?;
                Ok(MetaAccount {
                    name: account.name.clone(),
                    account_id: account.account_id.clone(),
                    token,
                })
            })
            .collect()
    }

    /// Connector sources in load order: Google Ads first, then Meta Ads.
    pub fn connector_sources(&self) -> anyhow::Result<Vec<Box<dyn ReportSource>>> {
        let mut sources: Vec<Box<dyn ReportSource>> = Vec::new();
        for (platform, connector) in [
            (Platform::GoogleAds, &self.connectors.google_ads),
            (Platform::MetaAds, &self.connectors.meta_ads),
        ] {
            let Some(c) = connector else { continue };
            let params = ConnectorParams {
                accounts: c.accounts.clone(),
                fields: c.fields.clone(),
            };
            let source = ConnectorSource::from_env(platform, c.base_url.clone(), &c.api_key_env, params)
                .with_context(|| format!("{platform} connector"))?;
            sources.push(Box::new(source));
        }
        Ok(sources)
    }

    /// Client for the `[webhook]` endpoint, when one is configured.
    pub fn webhook_client(&self) -> anyhow::Result<Option<WebhookClient>> {
        self.webhook
            .as_ref()
            .map(|w| WebhookClient::new(&w.url).context("webhook url"))
            .transpose()
    }

    /// Every configured source. Accounts are read directly from the Graph
    /// API only when no Meta Ads connector is configured.
    pub fn report_sources(&self) -> anyhow::Result<Vec<Box<dyn ReportSource>>> {
        let mut sources = self.connector_sources()?;
        if self.connectors.meta_ads.is_none() && !self.accounts.is_empty() {
            let source = MetaGraphSource::new(self.meta_client()?, self.meta_accounts()?);
            sources.push(Box::new(source));
        }
        if sources.is_empty() {
            anyhow::bail!("no data sources configured: add a [connectors] section or [accounts]");
        }
        Ok(sources)
    }
}
