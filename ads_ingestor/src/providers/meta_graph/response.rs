//! Graph API payload shapes. Every metric arrives as a string.

use serde::Deserialize;

use crate::providers::coerce::{de_f64, de_opt_f64, de_opt_u64, de_u64};

#[derive(Deserialize, Debug, Default)]
pub struct Paging {
    pub next: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub stop_time: Option<String>,
    #[serde(default)]
    pub updated_time: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ActionEntry {
    pub action_type: String,
    #[serde(default, deserialize_with = "de_f64")]
    pub value: f64,
}

impl ActionEntry {
    pub fn count(&self) -> u64 {
        self.value.max(0.0).round() as u64
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct InsightRow {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub date_start: Option<String>,
    #[serde(default)]
    pub date_stop: Option<String>,
    #[serde(default, deserialize_with = "de_f64")]
    pub spend: f64,
    #[serde(default, deserialize_with = "de_u64")]
    pub impressions: u64,
    #[serde(default, deserialize_with = "de_u64")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub ctr: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub cpm: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub frequency: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub reach: Option<u64>,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
    #[serde(default)]
    pub action_values: Vec<ActionEntry>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_metrics_are_parsed() {
        let row: InsightRow = serde_json::from_value(json!({
            "campaign_id": "238",
            "date_start": "2025-03-01",
            "spend": "152.37",
            "impressions": "12000",
            "clicks": "310",
            "frequency": "1.92",
            "actions": [{"action_type": "lead", "value": "7"}],
            "action_values": [{"action_type": "purchase", "value": "99.90"}]
        }))
        .unwrap();

        assert_eq!(row.spend, 152.37);
        assert_eq!(row.impressions, 12000);
        assert_eq!(row.frequency, Some(1.92));
        assert_eq!(row.reach, None);
        assert_eq!(row.actions[0].count(), 7);
        assert_eq!(row.action_values[0].value, 99.90);
    }
}
