#![allow(clippy::unwrap_used)]
// End-to-end reconciliation tests: managers driven against a wiremock
// appliance. Covers the full exists → create/update/delete branch and
// check-mode behavior.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bigsync_api::RestClient;
use bigsync_core::{Action, CoreError, Declaration, Device};

async fn setup() -> (MockServer, Device) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let rest = RestClient::with_client(reqwest::Client::new(), base_url);
    (server, Device::from_client(rest, "Common"))
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "code": 404,
        "message": "the requested object was not found"
    }))
}

// ── Create ──────────────────────────────────────────────────────────

#[tokio::test]
async fn creates_a_missing_profile() {
    let (server, device) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/profile/http/~Common~app-http"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/ltm/profile/http"))
        .and(body_partial_json(json!({
            "name": "app-http",
            "partition": "Common",
            "defaultsFrom": "/Common/http",
            "insertXforwardedFor": "enabled"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "app-http",
            "selfLink": "https://localhost/mgmt/tm/ltm/profile/http/~Common~app-http"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let decl = Declaration::from_toml_str(
        r#"
        [[http_profile]]
        name = "app-http"
        parent = "http"
        insert_xforwarded_for = true
        "#,
    )
    .unwrap();

    let results = decl.apply(&device, false).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind, "http-profile");
    assert!(results[0].outcome.changed);
    assert_eq!(results[0].outcome.action, Action::Create);
}

#[tokio::test]
async fn check_mode_reports_create_without_writing() {
    let (server, device) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/profile/tcp/~Common~app-tcp"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    // No POST mock mounted: a write in check mode would fail the test.
    let decl = Declaration::from_toml_str(
        r#"
        [[tcp_profile]]
        name = "app-tcp"
        idle_timeout = "indefinite"
        "#,
    )
    .unwrap();

    let results = decl.apply(&device, true).await.unwrap();
    assert!(results[0].outcome.changed);
    assert_eq!(results[0].outcome.action, Action::Create);
    let change = results[0].outcome.changes.iter().next().unwrap();
    assert_eq!(change.field, "idle_timeout");
    assert_eq!(change.new, json!("indefinite"));
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn update_patches_only_the_difference() {
    let (server, device) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/profile/tcp/~Common~app-tcp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "app-tcp",
            "partition": "Common",
            "defaultsFrom": "/Common/tcp",
            "idleTimeout": 300,
            "timeWaitRecycle": "enabled",
            "synRtoBase": 3000
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/mgmt/tm/ltm/profile/tcp/~Common~app-tcp"))
        .and(body_partial_json(json!({ "idleTimeout": 600 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "app-tcp" })))
        .expect(1)
        .mount(&server)
        .await;

    let decl = Declaration::from_toml_str(
        r#"
        [[tcp_profile]]
        name = "app-tcp"
        idle_timeout = 600
        time_wait_recycle = true
        "#,
    )
    .unwrap();

    let results = decl.apply(&device, false).await.unwrap();
    assert_eq!(results[0].outcome.action, Action::Update);
    // time_wait_recycle already matches; only idle_timeout changes.
    assert_eq!(results[0].outcome.changes.len(), 1);
    let change = results[0].outcome.changes.iter().next().unwrap();
    assert_eq!(change.old, json!(300));
    assert_eq!(change.new, json!(600));
}

#[tokio::test]
async fn matching_state_is_reported_unchanged() {
    let (server, device) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/profile/tcp/~Common~app-tcp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "app-tcp",
            "partition": "Common",
            "idleTimeout": 600,
            "nagle": "auto"
        })))
        .mount(&server)
        .await;

    // No PATCH mock: an unexpected write fails the test.
    let decl = Declaration::from_toml_str(
        r#"
        [[tcp_profile]]
        name = "app-tcp"
        idle_timeout = 600
        nagle = "auto"
        "#,
    )
    .unwrap();

    let results = decl.apply(&device, false).await.unwrap();
    assert!(!results[0].outcome.changed);
    assert_eq!(results[0].outcome.action, Action::None);
    assert!(results[0].outcome.changes.is_empty());
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn absent_deletes_and_verifies_the_object_is_gone() {
    let (server, device) = setup().await;

    // First existence probe: present. After the DELETE: gone.
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/vlan/~Common~vlan-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "vlan-a",
            "tag": 1234
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/mgmt/tm/net/vlan/~Common~vlan-a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/vlan/~Common~vlan-a"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let decl = Declaration::from_toml_str(
        r#"
        [[vlan]]
        name = "vlan-a"
        state = "absent"
        "#,
    )
    .unwrap();

    let results = decl.apply(&device, false).await.unwrap();
    assert_eq!(results[0].outcome.action, Action::Delete);
}

#[tokio::test]
async fn absent_on_a_missing_object_is_a_noop() {
    let (server, device) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/gtm/monitor/bigip/~Common~mon"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let decl = Declaration::from_toml_str(
        r#"
        [[gtm_monitor]]
        name = "mon"
        state = "absent"
        "#,
    )
    .unwrap();

    let results = decl.apply(&device, false).await.unwrap();
    assert!(!results[0].outcome.changed);
}

// ── Sys db ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sys_db_converges_value() {
    let (server, device) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/sys/db/setup.run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "setup.run",
            "value": "true",
            "defaultValue": "true"
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/mgmt/tm/sys/db/setup.run"))
        .and(body_partial_json(json!({ "value": "false" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "setup.run",
            "value": "false"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let decl = Declaration::from_toml_str(
        r#"
        [[sys_db]]
        key = "setup.run"
        value = false
        "#,
    )
    .unwrap();

    let results = decl.apply(&device, false).await.unwrap();
    assert!(results[0].outcome.changed);
    assert_eq!(results[0].kind, "sys-db");
}

// ── Error propagation ───────────────────────────────────────────────

#[tokio::test]
async fn device_rejection_message_reaches_the_caller() {
    let (server, device) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/vlan/~Common~vlan-a"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let device_message = "0107156c:3: VLAN tag 5000 is out of range";
    Mock::given(method("POST"))
        .and(path("/mgmt/tm/net/vlan"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "message": device_message
        })))
        .mount(&server)
        .await;

    let decl = Declaration::from_toml_str(
        r#"
        [[vlan]]
        name = "vlan-a"
        tag = 4000
        "#,
    )
    .unwrap();

    let err = decl.apply(&device, false).await.unwrap_err();
    match err {
        CoreError::Rejected { message } => assert_eq!(message, device_message),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}
