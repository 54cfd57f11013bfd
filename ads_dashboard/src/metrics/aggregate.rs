use std::{fmt, str::FromStr};

use ads_ingestor::models::{
    date_range::DateRange,
    platform::Platform,
    record::{CampaignStatusFilter, PerformanceRecord},
};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::metrics::{Metric, derived::DerivedMetrics};

/// Summed outcomes of a set of records.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Totals {
    pub rows: usize,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    /// Google `conversions` plus Meta purchase actions.
    pub conversions: u64,
    /// Google `conversion_value` plus Meta purchase value.
    pub revenue: f64,
    /// Meta rows only.
    pub reach: u64,
    pub conversion_details: IndexMap<String, u64>,
    #[serde(skip)]
    frequency_sum: f64,
    #[serde(skip)]
    frequency_rows: usize,
}

impl Totals {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PerformanceRecord>) -> Self {
        let mut totals = Totals::default();
        for record in records {
            totals.add(record);
        }
        totals
    }

    pub fn add(&mut self, record: &PerformanceRecord) {
        self.rows += 1;
        self.spend += record.spend;
        self.impressions += record.impressions;
        self.clicks += record.clicks;
        self.conversions += record.conversions();
        self.revenue += record.revenue();
        self.reach += record.metrics.reach().unwrap_or(0);
        if let Some(f) = record.metrics.frequency().filter(|f| f.is_finite()) {
            self.frequency_sum += f;
            self.frequency_rows += 1;
        }
        for (action, count) in &record.conversion_details {
            *self.conversion_details.entry(action.clone()).or_default() += count;
        }
    }

    /// Mean frequency over the rows that reported one.
    pub fn frequency(&self) -> Option<f64> {
        (self.frequency_rows > 0).then(|| self.frequency_sum / self.frequency_rows as f64)
    }

    pub fn derived(&self) -> DerivedMetrics {
        DerivedMetrics::compute(
            self.spend,
            self.impressions,
            self.clicks,
            self.conversions,
            self.revenue,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// The value of `metric` for these totals; frequency is 0 when no row
    /// reported it.
    pub fn value(&self, metric: Metric) -> f64 {
        let derived = self.derived();
        match metric {
            Metric::Spend => self.spend,
            Metric::Impressions => self.impressions as f64,
            Metric::Clicks => self.clicks as f64,
            Metric::Conversions => self.conversions as f64,
            Metric::Revenue => self.revenue,
            Metric::Reach => self.reach as f64,
            Metric::Ctr => derived.ctr,
            Metric::Cpc => derived.cpc,
            Metric::Cpm => derived.cpm,
            Metric::Cpa => derived.cpa,
            Metric::Roas => derived.roas,
            Metric::Frequency => self.frequency().unwrap_or(0.0),
        }
    }
}

/// Grouping used by a dashboard view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Time series.
    Date,
    /// Campaign comparison.
    Campaign,
    /// Platform distribution.
    Platform,
    CampaignPlatform,
    CampaignAdSet,
    Account,
}

impl GroupBy {
    pub const ALL: [GroupBy; 6] = [
        GroupBy::Date,
        GroupBy::Campaign,
        GroupBy::Platform,
        GroupBy::CampaignPlatform,
        GroupBy::CampaignAdSet,
        GroupBy::Account,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GroupBy::Date => "date",
            GroupBy::Campaign => "campaign",
            GroupBy::Platform => "platform",
            GroupBy::CampaignPlatform => "campaign_platform",
            GroupBy::CampaignAdSet => "campaign_ad_set",
            GroupBy::Account => "account",
        }
    }

    /// Key columns of this grouping, in output order.
    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            GroupBy::Date => &["date"],
            GroupBy::Campaign => &["campaign"],
            GroupBy::Platform => &["platform"],
            GroupBy::CampaignPlatform => &["campaign", "platform"],
            GroupBy::CampaignAdSet => &["campaign", "ad_set"],
            GroupBy::Account => &["account"],
        }
    }

    fn key_of(&self, record: &PerformanceRecord) -> GroupKey {
        let mut key = GroupKey::default();
        match self {
            GroupBy::Date => key.date = Some(record.date),
            GroupBy::Campaign => key.campaign = Some(record.campaign_name.clone()),
            GroupBy::Platform => key.platform = Some(record.platform()),
            GroupBy::CampaignPlatform => {
                key.campaign = Some(record.campaign_name.clone());
                key.platform = Some(record.platform());
            }
            GroupBy::CampaignAdSet => {
                key.campaign = Some(record.campaign_name.clone());
                key.ad_set = Some(
                    record
                        .ad_set_name
                        .clone()
                        .unwrap_or_else(|| UNASSIGNED.to_string()),
                );
            }
            GroupBy::Account => {
                key.account = Some(
                    record
                        .account_name
                        .clone()
                        .unwrap_or_else(|| record.platform().display_name().to_string()),
                )
            }
        }
        key
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        GroupBy::ALL
            .into_iter()
            .find(|g| g.name() == normalized)
            .ok_or_else(|| format!("unknown grouping '{s}'"))
    }
}

/// Label for rows without an ad set in the ad set view.
pub const UNASSIGNED: &str = "(none)";

/// The grouping values of one output row; fields outside the grouping are
/// `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    pub date: Option<NaiveDate>,
    pub campaign: Option<String>,
    pub platform: Option<Platform>,
    pub ad_set: Option<String>,
    pub account: Option<String>,
}

impl GroupKey {
    /// Values of the key columns of `by`, as text.
    pub fn columns(&self, by: GroupBy) -> Vec<String> {
        by.key_columns()
            .iter()
            .map(|column| match *column {
                "date" => self.date.map(|d| d.to_string()),
                "campaign" => self.campaign.clone(),
                "platform" => self.platform.map(|p| p.display_name().to_string()),
                "ad_set" => self.ad_set.clone(),
                "account" => self.account.clone(),
                _ => None,
            })
            .map(Option::unwrap_or_default)
            .collect()
    }

    pub fn label(&self, by: GroupBy) -> String {
        self.columns(by).join(" / ")
    }
}

/// One row of a grouped table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: GroupKey,
    pub totals: Totals,
    pub derived: DerivedMetrics,
}

/// Groups `records` by `by`.
///
/// Date groups come out in date order; every other grouping keeps the order
/// in which each group first appeared.
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a PerformanceRecord>,
    by: GroupBy,
) -> Vec<GroupRow> {
    let mut groups: IndexMap<GroupKey, Totals> = IndexMap::new();
    for record in records {
        groups.entry(by.key_of(record)).or_default().add(record);
    }
    if by == GroupBy::Date {
        groups.sort_by(|a, _, b, _| a.date.cmp(&b.date));
    }

    groups
        .into_iter()
        .map(|(key, totals)| GroupRow {
            derived: totals.derived(),
            key,
            totals,
        })
        .collect()
}

/// Narrowing applied before aggregation. Empty lists mean "everything".
#[derive(Clone, Debug, Default)]
pub struct RecordFilter {
    pub range: Option<DateRange>,
    pub platforms: Vec<Platform>,
    pub campaigns: Vec<String>,
    pub status: CampaignStatusFilter,
}

impl RecordFilter {
    pub fn matches(&self, record: &PerformanceRecord) -> bool {
        self.range.is_none_or(|r| r.contains(record.date))
            && (self.platforms.is_empty() || self.platforms.contains(&record.platform()))
            && (self.campaigns.is_empty()
                || self.campaigns.iter().any(|c| c == &record.campaign_name))
            && self.status.matches(record.campaign_status.as_deref())
    }
}

pub fn filter_records<'a>(
    records: &'a [PerformanceRecord],
    filter: &RecordFilter,
) -> Vec<&'a PerformanceRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}
