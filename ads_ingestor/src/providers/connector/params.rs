use serde::{Deserialize, Serialize};

use crate::models::{platform::Platform, request_params::ReportRequest};

/// Connector-specific parameters for a report request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ConnectorParams {
    /// Account identifiers passed as `select_accounts` (e.g. "304-359-3631").
    #[serde(default)]
    pub accounts: Vec<String>,

    /// Field list; empty means [`default_fields`] for the platform.
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Fields requested when the configuration does not name any.
pub fn default_fields(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::GoogleAds => &[
            "ad_name",
            "campaign",
            "clicks",
            "conversion_value",
            "conversions",
            "date",
            "impressions",
            "spend",
        ],
        Platform::MetaAds => &[
            "action_values_omni_purchase",
            "actions_purchase",
            "ad_name",
            "adset_name",
            "campaign",
            "clicks",
            "date",
            "impressions",
            "reach",
            "spend",
        ],
    }
}

/// Builds the query string pairs for one connector call.
///
/// The API key is added separately by the provider so it never shows up in
/// logged parameter lists.
pub fn construct_params(
    platform: Platform,
    params: &ConnectorParams,
    request: &ReportRequest,
) -> Vec<(String, String)> {
    let fields = if params.fields.is_empty() {
        default_fields(platform).join(",")
    } else {
        params.fields.join(",")
    };

    let mut query = vec![
        ("date_from".to_string(), request.range.since_str()),
        ("date_to".to_string(), request.range.until_str()),
        ("fields".to_string(), fields),
    ];
    if !params.accounts.is_empty() {
        query.push(("select_accounts".to_string(), params.accounts.join(",")));
    }
    query.push(("_renderer".to_string(), "json".to_string()));
    query
}
