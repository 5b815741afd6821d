#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bigsync_api::{Credentials, Error, RestClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RestClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn credentials() -> Credentials {
    Credentials::local("admin", SecretString::from("secret".to_string()))
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .and(body_partial_json(json!({
            "username": "admin",
            "loginProviderName": "tmos"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": { "token": "TOK-123" }
        })))
        .mount(&server)
        .await;

    // Subsequent requests must carry the token header.
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/sys/db/setup.run"))
        .and(header("X-F5-Auth-Token", "TOK-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "setup.run",
            "value": "false",
            "defaultValue": "true"
        })))
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    assert!(client.is_authenticated());

    let var = client.read_db_variable("setup.run").await.unwrap().unwrap();
    assert_eq!(var.value.as_deref(), Some("false"));
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 401,
            "message": "Authentication required!"
        })))
        .mount(&server)
        .await;

    let result = client.login(&credentials()).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.read_db_variable("setup.run").await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

// ── Object read tests ───────────────────────────────────────────────

#[tokio::test]
async fn test_read_http_profile() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/profile/http/~Common~app-http"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "app-http",
            "partition": "Common",
            "defaultsFrom": "/Common/http",
            "insertXforwardedFor": "enabled",
            "hsts": { "mode": "disabled", "maximumAge": 16070400 }
        })))
        .mount(&server)
        .await;

    let profile = client
        .read_http_profile("Common", "app-http")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.defaults_from.as_deref(), Some("/Common/http"));
    assert_eq!(profile.insert_xforwarded_for.as_deref(), Some("enabled"));
    assert_eq!(profile.hsts.unwrap().maximum_age, Some(16_070_400));
}

#[tokio::test]
async fn test_missing_object_reads_as_none() {
    let (server, client) = setup().await;

    // HTTP 404 with the iControl error envelope.
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/profile/tcp/~Common~missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "01020036:3: The requested profile (/Common/missing) was not found."
        })))
        .mount(&server)
        .await;

    let result = client.read_tcp_profile("Common", "missing").await.unwrap();
    assert!(result.is_none());

    // Some endpoints report 404 inside an HTTP 200.
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/vlan/~Common~missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 404,
            "message": "not found"
        })))
        .mount(&server)
        .await;

    let result = client.read_vlan("Common", "missing").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_vlan_read_expands_subcollections() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/vlan/~Common~vlan-a"))
        .and(query_param("expandSubcollections", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "vlan-a",
            "tag": 1234,
            "interfacesReference": {
                "items": [{ "name": "1.1", "tagged": true }]
            }
        })))
        .mount(&server)
        .await;

    let vlan = client.read_vlan("Common", "vlan-a").await.unwrap().unwrap();
    let items = vlan.interfaces_reference.unwrap().items.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "1.1");
    assert_eq!(items[0].tagged, Some(true));
}

// ── Error envelope tests ────────────────────────────────────────────

#[tokio::test]
async fn test_device_message_is_surfaced_verbatim() {
    let (server, client) = setup().await;

    let device_message = "01070734:3: Configuration error: parent profile is invalid";
    Mock::given(method("POST"))
        .and(path("/mgmt/tm/ltm/profile/http"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": device_message
        })))
        .mount(&server)
        .await;

    let result = client
        .create_http_profile(&json!({ "name": "bad", "partition": "Common" }))
        .await;

    match result {
        Err(Error::RestApi { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, device_message);
        }
        other => panic!("expected RestApi error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_json_raises_deserialization() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/sys/db/setup.run"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = client.read_db_variable("setup.run").await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

#[tokio::test]
async fn test_delete_surfaces_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/mgmt/tm/net/vlan/~Common~vlan-a"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": "VLAN is in use by a self IP"
        })))
        .mount(&server)
        .await;

    let result = client.delete_vlan("Common", "vlan-a").await;
    match result {
        Err(Error::RestApi { message, .. }) => {
            assert_eq!(message, "VLAN is in use by a self IP");
        }
        other => panic!("expected RestApi error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": { "token": "TOK-9" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/mgmt/shared/authz/tokens/TOK-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    client.logout().await.unwrap();
    assert!(!client.is_authenticated());
}
