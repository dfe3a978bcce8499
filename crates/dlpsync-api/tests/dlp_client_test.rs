#![allow(clippy::unwrap_used)]
// Integration tests for `DlpClient` and the token exchange using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dlpsync_api::{
    AccessToken, ClientCredentials, DlpClient, Endpoints, Error, TransportConfig,
    request_access_token,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints::new(
        &format!("{}/v1/api/data-pattern", server.uri()),
        &format!("{}/v1/api/data-profile", server.uri()),
    )
    .unwrap()
}

async fn setup() -> (MockServer, DlpClient) {
    let server = MockServer::start().await;
    let client = DlpClient::from_token(
        &AccessToken::new("tok-123"),
        endpoints(&server),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

fn credentials() -> ClientCredentials {
    ClientCredentials::for_tsg(
        "sa@example.iam",
        SecretString::from("secret-key".to_string()),
        "1234567890",
    )
}

// ── Token exchange ──────────────────────────────────────────────────

#[tokio::test]
async fn test_token_exchange_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .and(basic_auth("sa@example.iam", "secret-key"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=tsg_id%3A1234567890"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-abc",
            "token_type": "Bearer",
            "expires_in": 899
        })))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/oauth2/access_token", server.uri())).unwrap();
    let token = request_access_token(&reqwest::Client::new(), &url, &credentials())
        .await
        .unwrap();

    assert_eq!(token.expose(), "tok-abc");
}

#[tokio::test]
async fn test_token_exchange_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/oauth2/access_token", server.uri())).unwrap();
    let result = request_access_token(&reqwest::Client::new(), &url, &credentials()).await;

    match result {
        Err(Error::Authentication { message }) => assert!(message.contains("invalid_client")),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_token_exchange_missing_token_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/oauth2/access_token", server.uri())).unwrap();
    let result = request_access_token(&reqwest::Client::new(), &url, &credentials()).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_connect_exchanges_token_then_lists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-xyz"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/api/data-pattern"))
        .and(header("authorization", "Bearer tok-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resources": []})))
        .expect(1)
        .mount(&server)
        .await;

    let auth_url = Url::parse(&format!("{}/oauth2/access_token", server.uri())).unwrap();
    let client = DlpClient::connect(
        &auth_url,
        &credentials(),
        endpoints(&server),
        &TransportConfig::default(),
    )
    .await
    .unwrap();

    assert!(client.list_data_patterns().await.unwrap().is_empty());
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_data_patterns_sends_identity_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/data-pattern"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("client-name", "dlp-micro-app"))
        .and(header("service-name", "dlp-micro-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [
                {"id": "p1", "name": "SSN", "type": "custom"},
                {"id": "p2", "name": "Credit Card", "type": "predefined"}
            ]
        })))
        .mount(&server)
        .await;

    let patterns = client.list_data_patterns().await.unwrap();

    assert_eq!(patterns.len(), 2);
    assert_eq!(patterns[0]["name"], "SSN");
    assert_eq!(patterns[1]["type"], "predefined");
}

#[tokio::test]
async fn test_list_data_profiles_accepts_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/data-profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 11, "name": "PCI", "profile_type": "custom"}
        ])))
        .mount(&server)
        .await;

    let profiles = client.list_data_profiles().await.unwrap();

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["id"], 11);
}

#[tokio::test]
async fn test_list_data_profiles_accepts_resources_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/data-profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"id": 11, "name": "PCI"}, {"id": 12, "name": "HIPAA"}]
        })))
        .mount(&server)
        .await;

    assert_eq!(client.list_data_profiles().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_unauthorized_maps_to_invalid_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/data-pattern"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_data_patterns().await;

    assert!(
        matches!(result, Err(Error::InvalidToken)),
        "expected InvalidToken, got: {result:?}"
    );
    assert!(result.unwrap_err().is_auth_failure());
}

#[tokio::test]
async fn test_list_server_error_carries_status_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/data-profile"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    match client.list_data_profiles().await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_garbage_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/data-pattern"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_data_patterns().await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_data_pattern_sends_unwrapped_body() {
    let (server, client) = setup().await;
    let body = json!({"name": "SSN", "type": "custom"});

    Mock::given(method("POST"))
        .and(path("/v1/api/data-pattern"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "d1", "name": "SSN"})))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_data_pattern(&body).await.unwrap();

    assert_eq!(created["id"], "d1");
}

#[tokio::test]
async fn test_create_data_profile_wraps_body_and_uses_create_path() {
    let (server, client) = setup().await;
    let body = json!({"name": "PCI", "profile_type": "custom"});

    Mock::given(method("POST"))
        .and(path("/v1/api/data-profile/create"))
        .and(body_json(json!({"dataProfile": body})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42, "name": "PCI"})))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_data_profile(&body).await.unwrap();

    assert_eq!(created["id"], 42);
}

#[tokio::test]
async fn test_update_data_pattern_puts_to_member_url() {
    let (server, client) = setup().await;
    let body = json!({"name": "SSN", "description": "updated"});

    Mock::given(method("PUT"))
        .and(path("/v1/api/data-pattern/d1"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "d1"})))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client.update_data_pattern("d1", &body).await.unwrap();

    assert_eq!(updated["id"], "d1");
}

#[tokio::test]
async fn test_update_data_profile_empty_body_reports_updated() {
    let (server, client) = setup().await;
    let body = json!({"name": "PCI"});

    Mock::given(method("PUT"))
        .and(path("/v1/api/data-profile/42"))
        .and(body_json(json!({"dataProfile": body})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client.update_data_profile("42", &body).await.unwrap();

    assert_eq!(updated, json!({"status": "updated"}));
}

#[tokio::test]
async fn test_create_rejected_status_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/api/data-pattern"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate name"))
        .mount(&server)
        .await;

    let err = client
        .create_data_pattern(&json!({"name": "SSN"}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert!(err.to_string().contains("duplicate name"));
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/v1/api/data-pattern/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such pattern"))
        .mount(&server)
        .await;

    let err = client
        .update_data_pattern("gone", &json!({"name": "SSN"}))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_auth_failure());
}
