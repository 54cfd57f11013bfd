//! Connector payload shape and its mapping onto [`PerformanceRecord`].

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    models::{
        date_range::parse_date,
        platform::{Platform, PlatformMetrics},
        record::PerformanceRecord,
    },
    providers::coerce::{value_as_f64, value_as_u64},
};

/// `{"data": [ {field: value, ...}, ... ]}`
#[derive(Deserialize, Debug)]
pub struct ConnectorResponse {
    pub data: Vec<IndexMap<String, Value>>,
}

/// Campaign label for rows the connector sent without one.
pub const UNNAMED_CAMPAIGN: &str = "(not set)";

fn text(row: &IndexMap<String, Value>, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(row: &IndexMap<String, Value>, key: &str) -> Option<f64> {
    row.get(key).and_then(value_as_f64)
}

fn count(row: &IndexMap<String, Value>, key: &str) -> Option<u64> {
    row.get(key).and_then(value_as_u64)
}

/// Maps one connector row onto a record.
///
/// `fallback` is the platform of the endpoint; a `datasource` column, when
/// present and recognisable, takes precedence. Rows without a usable `date`
/// are rejected with a reason.
pub fn normalize_row(
    row: &IndexMap<String, Value>,
    fallback: Platform,
) -> Result<PerformanceRecord, String> {
    let raw_date = text(row, "date").ok_or_else(|| "row has no date".to_string())?;
    let date = parse_date(&raw_date).map_err(|e| e.to_string())?;

    let platform = text(row, "datasource")
        .and_then(|s| s.parse::<Platform>().ok())
        .unwrap_or(fallback);

    let metrics = match platform {
        Platform::GoogleAds => PlatformMetrics::GoogleAds {
            conversions: count(row, "conversions").unwrap_or(0),
            conversion_value: number(row, "conversion_value").unwrap_or(0.0),
        },
        Platform::MetaAds => PlatformMetrics::MetaAds {
            purchase_actions: count(row, "actions_purchase").unwrap_or(0),
            purchase_value: number(row, "action_values_omni_purchase").unwrap_or(0.0),
            reach: count(row, "reach"),
            frequency: number(row, "frequency"),
        },
    };

    Ok(PerformanceRecord {
        ad_set_name: text(row, "adset_name"),
        ad_name: text(row, "ad_name"),
        spend: number(row, "spend").unwrap_or(0.0).max(0.0),
        impressions: count(row, "impressions").unwrap_or(0),
        clicks: count(row, "clicks").unwrap_or(0),
        metrics,
        account_name: text(row, "account_name"),
        campaign_id: text(row, "campaign_id"),
        campaign_status: text(row, "campaign_status"),
        ..PerformanceRecord::new(
            platform,
            text(row, "campaign").unwrap_or_else(|| UNNAMED_CAMPAIGN.to_string()),
            date,
        )
    })
}
