use ads_ingestor::webhook::{RequestKind, WebhookClient, WebhookError, WebhookPayload};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

#[tokio::test]
async fn accepted_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({
            "tipo_requisicao": "criar_anuncio",
            "dados": [{"titulo": "Promo"}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebhookClient::new(&format!("{}/hook", server.uri())).unwrap();
    let payload = WebhookPayload::new(RequestKind::CriarAnuncio, vec![json!({"titulo": "Promo"})]);
    client.submit(&payload).await.unwrap();
}

#[tokio::test]
async fn other_success_codes_are_rejections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebhookClient::new(&server.uri()).unwrap();
    let payload = WebhookPayload::new(RequestKind::CriarCampanha, vec![json!({"nome": "X"})]);
    match client.submit(&payload).await {
        Err(WebhookError::Rejected { status, body }) => {
            assert_eq!(status, 201);
            assert_eq!(body, "created");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
