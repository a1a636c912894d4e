#![allow(clippy::unwrap_used)]
// Integration tests for `ScanClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanscope_api::{CreateRangeRequest, Error, ScanClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ScanClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ScanClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "1",
                "ip_address": "10.0.0.5",
                "mac_address": "aa:bb:cc:dd:ee:ff",
                "hostname": "printer",
                "status": "online",
                "manufacturer": "Brother",
                "tags": ["lab", "office"],
                "first_seen": "2024-06-15T10:30:00Z",
                "last_seen": "2024-06-15T10:35:00Z"
            },
            {
                "id": 2,
                "ip_address": "10.0.0.6",
                "mac_address": "11:22:33:44:55:66",
                "hostname": "",
                "is_online": false,
                "tags": null
            }
        ])))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, "1");
    assert_eq!(devices[0].status.as_deref(), Some("online"));
    assert_eq!(devices[0].tags, vec!["lab".to_string(), "office".to_string()]);
    assert_eq!(devices[1].id, "2");
    assert_eq!(devices[1].is_online, Some(false));
    assert!(devices[1].tags.is_empty());
}

#[tokio::test]
async fn test_list_devices_non_array_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "none yet"})))
        .mount(&server)
        .await;

    assert!(client.list_devices().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_devices_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
        .mount(&server)
        .await;

    let result = client.list_devices().await;
    match result {
        Err(Error::Http { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "database locked");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_search_devices_sends_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/search"))
        .and(query_param("q", "lab printer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "ip_address": "10.0.0.5" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let found = client.search_devices("lab printer").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].ip_address, "10.0.0.5");
}

#[tokio::test]
async fn test_clear_devices() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/clear"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.clear_devices().await.unwrap();
}

// ── Tag tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_and_remove_tag() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/1/tags"))
        .and(body_json(json!({ "tag": "lab" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/devices/1/tags"))
        .and(body_json(json!({ "tag": "lab" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.add_tag("1", "lab").await.unwrap();
    client.remove_tag("1", "lab").await.unwrap();
}

#[tokio::test]
async fn test_tag_path_escapes_device_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/a%2Fb/tags"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.add_tag("a/b", "x").await.unwrap();
}

// ── Scan tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_scan() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .and(body_json(json!({ "ip_range": "192.168.1.0/24" })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "scan started"})))
        .mount(&server)
        .await;

    let status = client.start_scan("192.168.1.0/24").await.unwrap();
    assert_eq!(status, "scan started");
}

#[tokio::test]
async fn test_start_scan_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad range"))
        .mount(&server)
        .await;

    let result = client.start_scan("nope").await;
    assert!(
        matches!(result, Err(Error::Http { status: 400, .. })),
        "expected HTTP 400, got: {result:?}"
    );
}

#[tokio::test]
async fn test_history_round_trip() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/scan-history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 3,
                "ip_range": "10.0.0.0/24",
                "started_at": "2024-06-15T10:30:00Z",
                "device_count": 12
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/scan/repeat"))
        .and(query_param("id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "repeating"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/scan-history/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/scan-history"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let history = client.list_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].device_count, 12);

    assert_eq!(client.repeat_scan(3).await.unwrap(), "repeating");
    client.delete_history(3).await.unwrap();
    client.clear_history().await.unwrap();
}

#[tokio::test]
async fn test_history_null_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/scan-history"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    assert!(client.list_history().await.unwrap().is_empty());
}

// ── Range tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_range_crud() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ranges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Office", "range": "192.168.1.0/24" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ranges"))
        .and(body_json(json!({ "name": "Lab", "range": "10.0.0.0/24" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/ranges/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ranges = client.list_ranges().await.unwrap();
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].id, "1");
    assert_eq!(ranges[0].name, "Office");

    client
        .create_range(&CreateRangeRequest {
            name: "Lab".into(),
            range: "10.0.0.0/24".into(),
        })
        .await
        .unwrap();
    client.delete_range("1").await.unwrap();
}
