//! Everything one dashboard render needs, computed in one pass.

use std::fmt::Write as _;

use ads_ingestor::models::{platform::Platform, record::PerformanceRecord};
use serde::Serialize;

use crate::{
    format::{format_delta, format_metric},
    metrics::{GroupBy, GroupRow, Metric, PeriodComparison, Totals, aggregate},
    status::{Benchmarks, SpendContext, Status, classify},
};

/// KPI cards shown for every dataset.
pub const BASE_KPIS: [Metric; 10] = [
    Metric::Spend,
    Metric::Impressions,
    Metric::Clicks,
    Metric::Conversions,
    Metric::Revenue,
    Metric::Ctr,
    Metric::Cpc,
    Metric::Cpm,
    Metric::Cpa,
    Metric::Roas,
];

/// Added when any Meta Ads row is present.
pub const META_KPIS: [Metric; 2] = [Metric::Reach, Metric::Frequency];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KpiCard {
    pub metric: Metric,
    pub value: f64,
    pub formatted: String,
    /// `None` when there is no previous period.
    pub delta_pct: Option<f64>,
    pub formatted_delta: Option<String>,
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardReport {
    pub record_count: usize,
    pub kpis: Vec<KpiCard>,
    pub comparison: PeriodComparison,
    pub by_date: Vec<GroupRow>,
    pub by_campaign: Vec<GroupRow>,
    pub by_platform: Vec<GroupRow>,
    pub by_campaign_platform: Vec<GroupRow>,
    pub by_campaign_ad_set: Vec<GroupRow>,
    pub by_account: Vec<GroupRow>,
}

impl DashboardReport {
    /// Builds the report for `current`, comparing against `previous` (the
    /// equal-length window before it). An empty `previous` switches statuses
    /// to absolute benchmarks.
    pub fn build(
        current: &[PerformanceRecord],
        previous: &[PerformanceRecord],
        benchmarks: &Benchmarks,
    ) -> Self {
        let comparison =
            PeriodComparison::compute(&Totals::from_records(current), &Totals::from_records(previous));
        let has_previous = comparison.has_previous();
        let context = if has_previous {
            SpendContext {
                spend_delta: Some(comparison.delta(Metric::Spend)),
                conversions_delta: Some(comparison.delta(Metric::Conversions)),
            }
        } else {
            SpendContext::default()
        };

        let with_meta = current.iter().any(|r| r.platform() == Platform::MetaAds);
        let extra: &[Metric] = if with_meta { &META_KPIS } else { &[] };

        let kpis = BASE_KPIS
            .iter()
            .chain(extra)
            .map(|&metric| {
                let value = comparison.current.value(metric);
                let delta = has_previous.then(|| comparison.delta(metric));
                KpiCard {
                    metric,
                    value,
                    formatted: format_metric(metric, value),
                    delta_pct: delta,
                    formatted_delta: delta.map(format_delta),
                    status: classify(metric, value, delta, &context, benchmarks),
                }
            })
            .collect();

        Self {
            record_count: current.len(),
            kpis,
            by_date: aggregate(current, GroupBy::Date),
            by_campaign: aggregate(current, GroupBy::Campaign),
            by_platform: aggregate(current, GroupBy::Platform),
            by_campaign_platform: aggregate(current, GroupBy::CampaignPlatform),
            by_campaign_ad_set: aggregate(current, GroupBy::CampaignAdSet),
            by_account: aggregate(current, GroupBy::Account),
            comparison,
        }
    }

    pub fn has_data(&self) -> bool {
        self.record_count > 0
    }

    pub fn kpi(&self, metric: Metric) -> Option<&KpiCard> {
        self.kpis.iter().find(|k| k.metric == metric)
    }

    pub fn table(&self, by: GroupBy) -> &[GroupRow] {
        match by {
            GroupBy::Date => &self.by_date,
            GroupBy::Campaign => &self.by_campaign,
            GroupBy::Platform => &self.by_platform,
            GroupBy::CampaignPlatform => &self.by_campaign_platform,
            GroupBy::CampaignAdSet => &self.by_campaign_ad_set,
            GroupBy::Account => &self.by_account,
        }
    }

    /// Plain-text KPI summary for terminals.
    pub fn render_text(&self) -> String {
        if !self.has_data() {
            return "No data for the selected period.\n".to_string();
        }
        let mut out = String::new();
        for card in &self.kpis {
            let _ = writeln!(
                out,
                "{} {:<12} {:>18}  {}",
                card.status.symbol(),
                card.metric.label(),
                card.formatted,
                card.formatted_delta.as_deref().unwrap_or("")
            );
        }
        let _ = writeln!(out, "\n{} rows, {} campaigns", self.record_count, self.by_campaign.len());
        out
    }
}
