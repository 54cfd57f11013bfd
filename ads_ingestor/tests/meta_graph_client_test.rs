use std::{sync::Arc, time::Duration};

use ads_ingestor::{
    models::{
        date_range::DateRange,
        request_params::{ProviderParams, ReportRequest},
    },
    providers::{
        ReportSource,
        meta_graph::{
            InsightsParams, MetaAccount, MetaApiError, MetaClientConfig, MetaGraphClient,
            MetaGraphSource, PurchaseFlag,
        },
        retry::RecordingSleeper,
    },
};
use chrono::NaiveDate;
use secrecy::SecretString;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn client(base_url: String, sleeper: &RecordingSleeper) -> MetaGraphClient {
    MetaGraphClient::new(MetaClientConfig {
        base_url,
        ..MetaClientConfig::default()
    })
    .unwrap()
    .with_sleeper(Arc::new(sleeper.clone()))
}

fn token() -> SecretString {
    SecretString::from("graph-token")
}

fn range() -> DateRange {
    DateRange::parse("2025-03-01", "2025-03-07").unwrap()
}

fn insight_row(spend: &str, purchases: &str) -> serde_json::Value {
    json!({
        "campaign_id": "c1",
        "date_start": "2025-03-01",
        "date_stop": "2025-03-07",
        "spend": spend,
        "impressions": "1000",
        "clicks": "25",
        "reach": "700",
        "frequency": "1.4",
        "actions": [
            {"action_type": "purchase", "value": purchases},
            {"action_type": "lead", "value": "2"},
            {"action_type": "link_click", "value": "90"}
        ],
        "action_values": [{"action_type": "purchase", "value": "150.5"}]
    })
}

async fn mount_campaigns(server: &MockServer, account: &str, ids: &[&str]) {
    let data: Vec<_> = ids
        .iter()
        .map(|id| json!({"id": id, "name": format!("Campaign {id}"), "status": "ACTIVE"}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/v22.0/{account}/campaigns")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": data})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn rate_limit_waits_retry_after_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v22.0/act_1/insights"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v22.0/act_1/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = client(server.uri(), &sleeper);
    let url = format!("{}/v22.0/act_1/insights", server.uri());
    let body = client.get_json(&url, &[]).await.unwrap();

    assert_eq!(body, json!({"data": []}));
    assert_eq!(sleeper.calls().await, vec![Duration::from_secs(2)]);
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = client(server.uri(), &sleeper);
    let err = client
        .get_json(&format!("{}/v22.0/x", server.uri()), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, MetaApiError::Status { status: 500, .. }));
    assert!(sleeper.calls().await.is_empty());
}

#[tokio::test]
async fn repeated_rate_limits_exhaust_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = client(server.uri(), &sleeper);
    let err = client
        .get_json(&format!("{}/v22.0/x", server.uri()), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, MetaApiError::RetriesExhausted { attempts: 3, .. }));
    // No header: the default delay, and no wait after the last attempt.
    assert_eq!(
        sleeper.calls().await,
        vec![Duration::from_secs(5), Duration::from_secs(5)]
    );
}

#[tokio::test]
async fn network_failures_exhaust_attempts() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let sleeper = RecordingSleeper::new();
    let client = client(base.clone(), &sleeper);
    let err = client
        .get_json(&format!("{base}/v22.0/x"), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, MetaApiError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(sleeper.calls().await.len(), 2);
}

#[tokio::test]
async fn access_token_stays_out_of_error_messages() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let sleeper = RecordingSleeper::new();
    let err = client(base, &sleeper)
        .account_campaigns("act_1", &SecretString::from("SUPERSECRET-TOKEN"), 100)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("after 3 attempts"), "{message}");
    assert!(!message.contains("SUPERSECRET-TOKEN"), "{message}");
    assert!(!message.contains("access_token"), "{message}");

    let provider_error: ads_ingestor::providers::ProviderError = err.into();
    assert!(!provider_error.to_string().contains("SUPERSECRET-TOKEN"));
}

#[tokio::test]
async fn campaigns_follow_paging_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v22.0/act_1/campaigns"))
        .and(query_param("after", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "c3"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v22.0/act_1/campaigns"))
        .and(query_param("access_token", "graph-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "c1", "name": "One"}, {"id": "c2", "name": "Two"}],
            "paging": {"next": format!("{}/v22.0/act_1/campaigns?after=cursor-2", server.uri())}
        })))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let campaigns = client(server.uri(), &sleeper)
        .account_campaigns("act_1", &token(), 100)
        .await
        .unwrap();

    let ids: Vec<_> = campaigns.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c1", "c2", "c3"]);
}

#[tokio::test]
async fn account_performance_skips_failing_campaigns() {
    let server = MockServer::start().await;
    mount_campaigns(&server, "act_1", &["c1", "c2"]).await;
    Mock::given(method("GET"))
        .and(path("/v22.0/c1/insights"))
        .and(query_param("level", "campaign"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [insight_row("40.0", "3")]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v22.0/c2/insights"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad campaign"))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let account = MetaAccount {
        name: "Vogel".into(),
        account_id: "act_1".into(),
        token: token(),
    };
    let out = client(server.uri(), &sleeper)
        .account_performance(&account, &range(), &range().previous())
        .await
        .unwrap();

    assert_eq!(out.current.len(), 1);
    assert_eq!(out.previous.len(), 1);
    assert_eq!(out.failed_requests, 2);

    let record = &out.current[0];
    assert_eq!(record.campaign_name, "Campaign c1");
    assert_eq!(record.account_name.as_deref(), Some("Vogel"));
    assert_eq!(record.conversions(), 5, "purchase and lead count, link_click does not");
    assert_eq!(record.revenue(), 150.5);
    assert_eq!(record.conversion_details.get("purchase"), Some(&3));
    assert_eq!(record.metrics.frequency(), Some(1.4));
}

#[tokio::test]
async fn daily_performance_requests_time_increment() {
    let server = MockServer::start().await;
    let mut day2 = insight_row("10", "1");
    day2["date_start"] = json!("2025-03-02");
    Mock::given(method("GET"))
        .and(path("/v22.0/c1/insights"))
        .and(query_param("time_increment", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [insight_row("12", "2"), day2]})),
        )
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::new();
    let client = client(server.uri(), &sleeper);
    let campaign = serde_json::from_value(json!({"id": "c1", "name": "Daily"})).unwrap();
    let records = client
        .daily_performance(&campaign, &token(), &range())
        .await
        .unwrap();

    let dates: Vec<_> = records.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        [
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
        ]
    );
}

#[tokio::test]
async fn purchase_history_flags_low_volume() {
    let server = MockServer::start().await;
    mount_campaigns(&server, "act_9", &["c1", "c2"]).await;
    for id in ["c1", "c2"] {
        Mock::given(method("GET"))
            .and(path(format!("/v22.0/{id}/insights")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": [insight_row("1", "6")]})),
            )
            .mount(&server)
            .await;
    }

    let sleeper = RecordingSleeper::new();
    let history = client(server.uri(), &sleeper)
        .purchase_history("act_9", &token(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
        .await
        .unwrap();

    assert_eq!(history.total_purchases, 12);
    assert_eq!(history.flag, PurchaseFlag::Yellow);
}

#[tokio::test]
async fn source_skips_failed_accounts_and_fails_when_all_fail() {
    let server = MockServer::start().await;
    mount_campaigns(&server, "act_ok", &["c1"]).await;
    Mock::given(method("GET"))
        .and(path("/v22.0/act_bad/campaigns"))
        .respond_with(ResponseTemplate::new(403).set_body_string("no access"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v22.0/c1/insights"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [insight_row("9", "1")]})),
        )
        .mount(&server)
        .await;

    let account = |name: &str, id: &str| MetaAccount {
        name: name.into(),
        account_id: id.into(),
        token: token(),
    };
    let sleeper = RecordingSleeper::new();
    let mut request = ReportRequest::new(range());
    request.provider_specific = ProviderParams::MetaGraph(InsightsParams {
        daily: true,
        fields: None,
    });

    let mixed = MetaGraphSource::new(
        client(server.uri(), &sleeper),
        vec![account("Bad", "act_bad"), account("Good", "act_ok")],
    );
    let records = mixed.fetch_records(&request).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].account_name.as_deref(), Some("Good"));

    let broken = MetaGraphSource::new(
        client(server.uri(), &sleeper),
        vec![account("Bad", "act_bad")],
    );
    let err = broken.fetch_records(&request).await.unwrap_err();
    assert!(err.to_string().contains("Bad"));
}
