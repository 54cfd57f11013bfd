//! Canonical in-memory representation of one row of ad performance.
//!
//! Every [`ReportSource`](crate::providers::ReportSource) produces these,
//! whatever the vendor payload looked like.

use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::platform::{Platform, PlatformMetrics};

/// One row per (campaign, platform, date) or (campaign, ad set, date).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub campaign_name: String,
    pub ad_set_name: Option<String>,
    pub ad_name: Option<String>,
    pub date: NaiveDate,

    /// Amount spent, in the account currency.
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,

    /// Conversions, revenue, reach and frequency in the platform's own fields.
    pub metrics: PlatformMetrics,

    /// Ad account display name, when the row came from a multi-account fetch.
    pub account_name: Option<String>,
    pub campaign_id: Option<String>,
    /// Delivery status as reported by the platform (e.g. "ACTIVE").
    pub campaign_status: Option<String>,

    /// Per action type conversion counts. Only the Graph API reports these.
    #[serde(default)]
    pub conversion_details: IndexMap<String, u64>,
}

impl PerformanceRecord {
    /// A zeroed record; handy as a base for struct-update syntax.
    pub fn new(platform: Platform, campaign_name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            campaign_name: campaign_name.into(),
            ad_set_name: None,
            ad_name: None,
            date,
            spend: 0.0,
            impressions: 0,
            clicks: 0,
            metrics: PlatformMetrics::empty(platform),
            account_name: None,
            campaign_id: None,
            campaign_status: None,
            conversion_details: IndexMap::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.metrics.platform()
    }

    pub fn conversions(&self) -> u64 {
        self.metrics.conversions()
    }

    pub fn revenue(&self) -> f64 {
        self.metrics.revenue()
    }
}

/// Campaign status selection used to narrow a report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatusFilter {
    Active,
    Paused,
    Completed,
    #[default]
    All,
}

impl CampaignStatusFilter {
    /// Whether a record with `status` passes the filter. Records without a
    /// status only pass `All`.
    pub fn matches(&self, status: Option<&str>) -> bool {
        let wanted = match self {
            CampaignStatusFilter::All => return true,
            CampaignStatusFilter::Active => "ACTIVE",
            CampaignStatusFilter::Paused => "PAUSED",
            CampaignStatusFilter::Completed => "COMPLETED",
        };
        status.is_some_and(|s| s.eq_ignore_ascii_case(wanted))
    }
}

impl FromStr for CampaignStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "COMPLETED" => Ok(Self::Completed),
            "ALL" => Ok(Self::All),
            other => Err(format!("unknown campaign status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_matches_case_insensitively() {
        assert!(CampaignStatusFilter::Active.matches(Some("active")));
        assert!(!CampaignStatusFilter::Active.matches(Some("PAUSED")));
        assert!(!CampaignStatusFilter::Paused.matches(None));
        assert!(CampaignStatusFilter::All.matches(None));
    }

    #[test]
    fn record_delegates_to_platform_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let rec = PerformanceRecord {
            metrics: PlatformMetrics::MetaAds {
                purchase_actions: 3,
                purchase_value: 90.0,
                reach: None,
                frequency: None,
            },
            ..PerformanceRecord::new(Platform::MetaAds, "Retargeting", date)
        };
        assert_eq!(rec.platform(), Platform::MetaAds);
        assert_eq!(rec.conversions(), 3);
        assert_eq!(rec.revenue(), 90.0);
    }
}
