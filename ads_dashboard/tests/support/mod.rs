#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

pub const GOOGLE_KEY_ENV: &str = "DASHBOARD_TEST_GOOGLE_KEY";
pub const META_KEY_ENV: &str = "DASHBOARD_TEST_META_KEY";
pub const META_TOKEN_ENV: &str = "DASHBOARD_TEST_META_TOKEN";

/// The reporting day every test pins.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
}

/// Serves `rows` for requests whose window starts at `date_from`.
pub async fn mount_connector(server: &MockServer, route: &str, date_from: &str, rows: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("date_from", date_from))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": rows })))
        .mount(server)
        .await;
}

pub async fn mount_failure(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream down"))
        .mount(server)
        .await;
}

pub fn google_row(date: &str, spend: f64, conversions: u64) -> Value {
    json!({
        "campaign": "Search",
        "date": date,
        "spend": spend,
        "impressions": 1000,
        "clicks": 20,
        "conversions": conversions,
        "conversion_value": spend * 3.0,
    })
}

pub fn meta_row(date: &str, spend: f64, purchases: u64) -> Value {
    json!({
        "campaign": "Reels",
        "adset_name": "Lookalike",
        "date": date,
        "spend": spend.to_string(),
        "impressions": "2000",
        "clicks": "30",
        "reach": 1500,
        "frequency": 2.0,
        "actions_purchase": purchases,
        "action_values_omni_purchase": spend * 5.0,
        "conversions": 999,
    })
}

/// Two connectors on the same mock server, seven-day window.
pub fn connectors_toml(server_uri: &str) -> String {
    format!(
        r#"
window_days = 7

[connectors.google_ads]
base_url = "{server_uri}/google"
api_key_env = "{GOOGLE_KEY_ENV}"

[connectors.meta_ads]
base_url = "{server_uri}/meta"
api_key_env = "{META_KEY_ENV}"
"#
    )
}

/// Sets the variables for the duration of a test.
pub struct EnvGuard(Vec<&'static str>);

impl EnvGuard {
    pub fn set(vars: &[(&'static str, &str)]) -> Self {
        for (name, value) in vars {
            unsafe { std::env::set_var(name, value) };
        }
        Self(vars.iter().map(|(name, _)| *name).collect())
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for name in &self.0 {
            unsafe { std::env::remove_var(name) };
        }
    }
}
