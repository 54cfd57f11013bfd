//! Meta Graph API (ads insights) source.
//!
//! [`client::MetaGraphClient`] wraps the `/{id}/campaigns` and
//! `/{id}/insights` endpoints with the retry policy from
//! [`crate::providers::retry`]. Failures are returned as [`MetaApiError`]
//! values so a multi-account run can skip one campaign or account and carry on.

pub mod client;
pub mod response;
pub mod rules;
pub mod source;

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::{MetaClientConfig, MetaGraphClient};
pub use rules::ConversionRules;
pub use source::MetaGraphSource;

/// Fields requested for campaign-level insights.
pub const DEFAULT_INSIGHT_FIELDS: &str =
    "campaign_id,spend,impressions,clicks,ctr,cpm,actions,action_values,frequency,reach";

/// Fields requested for daily (`time_increment=1`) insights.
pub const DAILY_INSIGHT_FIELDS: &str =
    "campaign_id,spend,impressions,clicks,actions,action_values,reach";

/// Fields requested when listing an account's campaigns.
pub const CAMPAIGN_FIELDS: &str = "id,name,status,start_time,stop_time,updated_time,objective";

#[derive(Debug, Error)]
pub enum MetaApiError {
    /// A non-200, non-429 answer. Never retried.
    #[error("Graph API request failed with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Every attempt was rate limited or failed in transport.
    #[error("Graph API request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// A 200 answer whose body is not the expected JSON.
    #[error("Graph API returned an unexpected payload: {0}")]
    Decode(String),
}

impl From<MetaApiError> for crate::providers::ProviderError {
    fn from(e: MetaApiError) -> Self {
        crate::providers::ApiSnafu {
            message: e.to_string(),
        }
        .build()
    }
}

/// Graph-specific options carried in a report request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InsightsParams {
    /// Request one row per day (`time_increment=1`).
    #[serde(default)]
    pub daily: bool,

    /// Override of the insight field list.
    #[serde(default)]
    pub fields: Option<String>,
}

/// One ad account and the token used to read it.
#[derive(Clone)]
pub struct MetaAccount {
    pub name: String,
    /// Graph id, including the `act_` prefix.
    pub account_id: String,
    pub token: SecretString,
}

impl fmt::Debug for MetaAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaAccount")
            .field("name", &self.name)
            .field("account_id", &self.account_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Purchase volume health over the last 90 days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PurchaseFlag {
    /// The account recorded no purchases at all.
    NoPurchases,
    /// Fewer than 10 purchases.
    Red,
    /// Fewer than 20 purchases.
    Yellow,
    Healthy,
}

impl PurchaseFlag {
    pub fn from_total(total: u64, has_purchases: bool) -> Self {
        if !has_purchases {
            PurchaseFlag::NoPurchases
        } else if total < 10 {
            PurchaseFlag::Red
        } else if total < 20 {
            PurchaseFlag::Yellow
        } else {
            PurchaseFlag::Healthy
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PurchaseHistory {
    pub total_purchases: u64,
    pub has_purchases: bool,
    pub flag: PurchaseFlag,
}
