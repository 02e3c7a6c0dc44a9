//! Wire-level tests for the Zabbix JSON-RPC client.
//!
//! A wiremock server stands in for `api_jsonrpc.php` and checks request
//! framing, authentication and error unwrapping.

use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use zabbix_client::{ClientConfig, ZabbixClient, ZabbixError};

const API_PATH: &str = "/api_jsonrpc.php";

/// Echoes the request id back with an empty result.
struct EchoId;

impl Respond for EchoId {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "result": [],
            "id": body["id"]
        }))
    }
}

fn client_for(server: &MockServer, token: Option<&str>) -> ZabbixClient {
    let mut config = ClientConfig::new(format!("{}{}", server.uri(), API_PATH));
    if let Some(token) = token {
        config = config.with_token(token);
    }
    ZabbixClient::new(config).unwrap()
}

#[tokio::test]
async fn test_invoke_returns_raw_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("content-type", "application/json-rpc"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "host.get",
            "params": {"output": "extend"},
            "id": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "result": [{"hostid": "10084", "host": "Zabbix server"}],
            "id": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("test-token"));
    let result = client
        .invoke("host.get", &serde_json::json!({"output": "extend"}))
        .await
        .unwrap();

    assert_eq!(result[0]["hostid"], "10084");
    assert_eq!(result[0]["host"], "Zabbix server");
}

#[tokio::test]
async fn test_api_error_preserved_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": -32500, "message": "Application error.", "data": "No permissions"},
            "id": 1
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("test-token"));
    let err = client
        .invoke("user.create", &serde_json::json!({}))
        .await
        .unwrap_err();

    match err {
        ZabbixError::Api {
            code,
            message,
            data,
        } => {
            assert_eq!(code, -32500);
            assert_eq!(message, "Application error.");
            assert_eq!(data, "No permissions");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_body_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("test-token"));
    let err = client
        .invoke("host.get", &serde_json::json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ZabbixError::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn test_mismatched_id_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "result": [],
            "id": 999
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("test-token"));
    let err = client
        .invoke("host.get", &serde_json::json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ZabbixError::Protocol(_)), "got {err:?}");
}

#[tokio::test]
async fn test_call_ids_are_unique_per_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(EchoId)
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("test-token"));
    let params = serde_json::json!({});
    let (a, b, c) = tokio::join!(
        client.invoke("host.get", &params),
        client.invoke("item.get", &params),
        client.invoke("trigger.get", &params),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    let mut ids: Vec<u64> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).unwrap()["id"].as_u64().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(EchoId)
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    client
        .invoke("apiinfo.version", &serde_json::json!({}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}{}", listener.local_addr().unwrap(), API_PATH);
    drop(listener);

    let client = ZabbixClient::new(ClientConfig::new(url).with_token("t")).unwrap();
    let err = client
        .invoke("host.get", &serde_json::json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ZabbixError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_login_returns_session_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(serde_json::json!({
            "method": "user.login",
            "params": {"username": "Admin", "password": "zabbix"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "result": "0424bd59b807674191e7d77572075f33",
            "id": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let token = client.login("Admin", "zabbix").await.unwrap();
    assert_eq!(token, "0424bd59b807674191e7d77572075f33");
}
