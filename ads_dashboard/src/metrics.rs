//! Platform-aware totals, derived ratios and period-over-period deltas.
//!
//! Sums are taken per platform through
//! [`PlatformMetrics`](ads_ingestor::models::platform::PlatformMetrics), so a
//! Google Ads row contributes its `conversions` and a Meta Ads row its
//! purchase actions to the same "conversions" total. Ratios are computed
//! from the sums, never summed themselves.

pub mod aggregate;
pub mod derived;
pub mod period;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use aggregate::{GroupBy, GroupKey, GroupRow, RecordFilter, Totals, aggregate, filter_records};
pub use derived::DerivedMetrics;
pub use period::{MetricDelta, PeriodComparison, delta_pct};

/// A number shown on the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Spend,
    Impressions,
    Clicks,
    Conversions,
    Revenue,
    Reach,
    Ctr,
    Cpc,
    Cpm,
    Cpa,
    Roas,
    Frequency,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::Spend,
        Metric::Impressions,
        Metric::Clicks,
        Metric::Conversions,
        Metric::Revenue,
        Metric::Reach,
        Metric::Ctr,
        Metric::Cpc,
        Metric::Cpm,
        Metric::Cpa,
        Metric::Roas,
        Metric::Frequency,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::Spend => "spend",
            Metric::Impressions => "impressions",
            Metric::Clicks => "clicks",
            Metric::Conversions => "conversions",
            Metric::Revenue => "revenue",
            Metric::Reach => "reach",
            Metric::Ctr => "ctr",
            Metric::Cpc => "cpc",
            Metric::Cpm => "cpm",
            Metric::Cpa => "cpa",
            Metric::Roas => "roas",
            Metric::Frequency => "frequency",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Spend => "Spend",
            Metric::Impressions => "Impressions",
            Metric::Clicks => "Clicks",
            Metric::Conversions => "Conversions",
            Metric::Revenue => "Revenue",
            Metric::Reach => "Reach",
            Metric::Ctr => "CTR",
            Metric::Cpc => "CPC",
            Metric::Cpm => "CPM",
            Metric::Cpa => "CPA",
            Metric::Roas => "ROAS",
            Metric::Frequency => "Frequency",
        }
    }

    /// Cost metrics: a falling value is an improvement.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Metric::Cpa | Metric::Cpc | Metric::Cpm)
    }

    /// Whole-number metrics, displayed without decimals.
    pub fn is_count(&self) -> bool {
        matches!(
            self,
            Metric::Impressions | Metric::Clicks | Metric::Conversions | Metric::Reach
        )
    }

    /// Metrics expressed in the account currency.
    pub fn is_currency(&self) -> bool {
        matches!(
            self,
            Metric::Spend | Metric::Revenue | Metric::Cpc | Metric::Cpm | Metric::Cpa
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spend" | "gasto" => Ok(Metric::Spend),
            "impressions" => Ok(Metric::Impressions),
            "clicks" => Ok(Metric::Clicks),
            "conversions" => Ok(Metric::Conversions),
            "revenue" => Ok(Metric::Revenue),
            "reach" => Ok(Metric::Reach),
            "ctr" => Ok(Metric::Ctr),
            "cpc" => Ok(Metric::Cpc),
            "cpm" => Ok(Metric::Cpm),
            // Cost per lead shares the acquisition band.
            "cpa" | "cpl" => Ok(Metric::Cpa),
            "roas" => Ok(Metric::Roas),
            "frequency" | "frequencia" => Ok(Metric::Frequency),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}
