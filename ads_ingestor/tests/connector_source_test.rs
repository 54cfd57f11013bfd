use ads_ingestor::{
    models::{date_range::DateRange, platform::Platform, request_params::ReportRequest},
    providers::{
        ProviderError, ReportSource,
        connector::{ConnectorParams, ConnectorSource},
        loader::load_sources,
    },
};
use secrecy::SecretString;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn request() -> ReportRequest {
    ReportRequest::new(DateRange::parse("2025-03-01", "2025-03-07").unwrap())
}

fn source(platform: Platform, url: String) -> ConnectorSource {
    ConnectorSource::new(
        platform,
        url,
        SecretString::from("test-key"),
        ConnectorParams::default(),
    )
    .unwrap()
}

/// A local address nothing listens on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/google")
}

#[tokio::test]
async fn google_rows_are_normalised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/google"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("date_from", "2025-03-01"))
        .and(query_param("date_to", "2025-03-07"))
        .and(query_param("_renderer", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"campaign": "Search", "date": "2025-03-01", "spend": "12.5",
                 "impressions": "1000", "clicks": 30, "conversions": "2",
                 "conversion_value": 80.0},
                {"campaign": "Search", "date": "2025-03-02", "spend": "not a number",
                 "impressions": 10, "clicks": 1},
                {"campaign": "Orphan", "spend": 1.0}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = source(Platform::GoogleAds, format!("{}/google", server.uri()))
        .fetch_records(&request())
        .await
        .unwrap();

    assert_eq!(records.len(), 2, "the undated row is dropped");
    assert_eq!(records[0].campaign_name, "Search");
    assert_eq!(records[0].spend, 12.5);
    assert_eq!(records[0].impressions, 1000);
    assert_eq!(records[0].conversions(), 2);
    assert_eq!(records[0].revenue(), 80.0);
    assert_eq!(records[1].spend, 0.0);
    assert!(records.iter().all(|r| r.platform() == Platform::GoogleAds));
}

#[tokio::test]
async fn meta_rows_use_purchase_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"campaign": "Reels", "adset_name": "Lookalike", "date": "2025-03-03",
                 "spend": 20, "impressions": 2000, "clicks": 40, "reach": 1500,
                 "actions_purchase": 4, "action_values_omni_purchase": "199.9"}
            ]
        })))
        .mount(&server)
        .await;

    let records = source(Platform::MetaAds, format!("{}/meta", server.uri()))
        .fetch_records(&request())
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.platform(), Platform::MetaAds);
    assert_eq!(r.ad_set_name.as_deref(), Some("Lookalike"));
    assert_eq!(r.conversions(), 4);
    assert_eq!(r.revenue(), 199.9);
    assert_eq!(r.metrics.reach(), Some(1500));
}

#[tokio::test]
async fn http_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = source(Platform::GoogleAds, server.uri())
        .fetch_records(&request())
        .await
        .unwrap_err();
    match err {
        ProviderError::HttpStatus { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_json_and_missing_data_are_decode_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nodata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": []})))
        .mount(&server)
        .await;

    for route in ["garbage", "nodata"] {
        let err = source(Platform::MetaAds, format!("{}/{route}", server.uri()))
            .fetch_records(&request())
            .await
            .unwrap_err();
        assert!(
            matches!(err, ProviderError::Decode { .. }),
            "{route}: unexpected error {err}"
        );
    }
}

#[tokio::test]
async fn unreachable_host_is_a_connection_error() {
    let err = source(Platform::GoogleAds, closed_port_url())
        .fetch_records(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Connection { .. }), "{err}");
}

#[tokio::test]
async fn loader_keeps_google_rows_when_meta_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"campaign": "Search", "date": "2025-03-01", "spend": 5}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let google = source(Platform::GoogleAds, format!("{}/google", server.uri()));
    let meta = source(Platform::MetaAds, format!("{}/meta", server.uri()));
    let report = load_sources(&[&google, &meta], &request()).await.unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("Meta Ads"));
}

#[tokio::test]
async fn empty_data_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let records = source(Platform::GoogleAds, server.uri())
        .fetch_records(&request())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn api_key_stays_out_of_error_messages() {
    let source = ConnectorSource::new(
        Platform::GoogleAds,
        closed_port_url(),
        SecretString::from("SUPERSECRET-KEY"),
        ConnectorParams::default(),
    )
    .unwrap();

    let err = source.fetch_records(&request()).await.unwrap_err();
    let message = err.to_string();
    assert!(!message.contains("SUPERSECRET-KEY"), "{message}");
    assert!(!message.contains("api_key"), "{message}");
    assert!(!format!("{err:?}").contains("SUPERSECRET-KEY"));
}
