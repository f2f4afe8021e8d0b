//! Wire-level tests for the issuer gateway against a mock HTTP server.

use serde_json::json;
use time::OffsetDateTime;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use healthid_client::{HttpIssuerGateway, IdentitySettings, IssuerSettings};
use healthid_core::{GatewayError, HealthId, IssuerGateway};

fn gateway_for(server: &MockServer) -> HttpIssuerGateway {
    HttpIssuerGateway::new(
        IssuerSettings {
            base_url: server.uri(),
            client_id: "mci-1".to_string(),
            requester: "registry@example.org".to_string(),
            request_timeout_ms: 2_000,
            ..IssuerSettings::default()
        },
        IdentitySettings {
            signin_url: format!("{}/signin", server.uri()),
            email: "registry@example.org".to_string(),
            password: "secret".to_string(),
            auth_token: "static-client-token".to_string(),
            client_id: "mci-1".to_string(),
        },
    )
}

async fn mount_signin(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/signin"))
        .and(header("X-Auth-Token", "static-client-token"))
        .and(header("client_id", "mci-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": token })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_block_signs_in_and_fetches() {
    let server = MockServer::start().await;
    mount_signin(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/healthIds/nextBlock/mci-1"))
        .and(query_param("blockSize", "5"))
        .and(header("X-Auth-Token", "tok-1"))
        .and(header("client_id", "mci-1"))
        .and(header("From", "registry@example.org"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "total": 2, "hids": ["h1", "h2"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let block = gateway.fetch_block(5).await.unwrap();

    assert_eq!(block, vec![HealthId::from("h1"), HealthId::from("h2")]);
}

#[tokio::test]
async fn token_is_cached_across_calls() {
    let server = MockServer::start().await;
    // One sign-in serves both fetches.
    mount_signin(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/healthIds/nextBlock/mci-1"))
        .and(header("X-Auth-Token", "tok-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "total": 1, "hids": ["h1"] })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway.fetch_block(1).await.unwrap();
    gateway.fetch_block(1).await.unwrap();
}

#[tokio::test]
async fn rejected_token_triggers_one_resignin_then_succeeds() {
    let server = MockServer::start().await;
    mount_signin(&server, "tok-1", 2).await;

    // First fetch is rejected as unauthorized, then the retry with the
    // fresh token succeeds.
    Mock::given(method("GET"))
        .and(path("/healthIds/nextBlock/mci-1"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/healthIds/nextBlock/mci-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "total": 1, "hids": ["h9"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let block = gateway.fetch_block(1).await.unwrap();
    assert_eq!(block, vec![HealthId::from("h9")]);
}

#[tokio::test]
async fn persistent_auth_failure_propagates_after_one_retry() {
    let server = MockServer::start().await;
    // Initial token plus exactly one re-authentication, no endless loop.
    mount_signin(&server, "tok-1", 2).await;

    Mock::given(method("GET"))
        .and(path("/healthIds/nextBlock/mci-1"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    assert!(matches!(
        gateway.fetch_block(1).await,
        Err(GatewayError::Auth(_))
    ));
}

#[tokio::test]
async fn timeout_maps_to_transport_error() {
    let server = MockServer::start().await;
    mount_signin(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/healthIds/nextBlock/mci-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "total": 0, "hids": [] }))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut settings = IssuerSettings {
        base_url: server.uri(),
        client_id: "mci-1".to_string(),
        requester: "registry@example.org".to_string(),
        ..IssuerSettings::default()
    };
    settings.request_timeout_ms = 100;
    let gateway = HttpIssuerGateway::new(
        settings,
        IdentitySettings {
            signin_url: format!("{}/signin", server.uri()),
            email: "registry@example.org".to_string(),
            password: "secret".to_string(),
            auth_token: "static-client-token".to_string(),
            client_id: "mci-1".to_string(),
        },
    );

    assert!(matches!(
        gateway.fetch_block(1).await,
        Err(GatewayError::Transport(_))
    ));
}

#[tokio::test]
async fn server_error_maps_to_transport_error() {
    let server = MockServer::start().await;
    mount_signin(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/healthIds/nextBlock/mci-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    assert!(matches!(
        gateway.fetch_block(1).await,
        Err(GatewayError::Transport(_))
    ));
}

#[tokio::test]
async fn malformed_block_body_is_invalid_response() {
    let server = MockServer::start().await;
    mount_signin(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/healthIds/nextBlock/mci-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    assert!(matches!(
        gateway.fetch_block(1).await,
        Err(GatewayError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn notify_used_puts_rfc3339_timestamp() {
    let server = MockServer::start().await;
    mount_signin(&server, "tok-1", 1).await;

    Mock::given(method("PUT"))
        .and(path("/healthIds/markUsed/98000430630"))
        .and(header("X-Auth-Token", "tok-1"))
        .and(header("client_id", "mci-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let used_at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    gateway
        .notify_used(&HealthId::from("98000430630"), used_at)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.to_string().eq_ignore_ascii_case("PUT"))
        .expect("mark-used request recorded");
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(body, json!({ "used_at": "2023-11-14T22:13:20Z" }));
}
