//! `HttpResourceApi` against a mock platform.

use std::time::Duration;

use agentctl_core::api::{
    AgentPayload, CapabilityError, HttpApiConfig, HttpResourceApi, McpServerPayload, PageRequest,
    ResourceApi,
};
use serde_json::json;
use serde_yaml::Mapping;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base: &str) -> HttpApiConfig {
    HttpApiConfig {
        base_url: Url::parse(base).unwrap(),
        project_id: "proj-1".to_string(),
        token: Some("secret".to_string()),
        instance_type_id: Some("gpu-small".to_string()),
        request_timeout: Duration::from_secs(5),
    }
}

fn api(server: &MockServer) -> HttpResourceApi {
    HttpResourceApi::new(config(&server.uri())).unwrap()
}

#[tokio::test]
async fn list_sends_paging_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/proj-1/mcpServers"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "4"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "mcp-5", "name": "pg-db", "createdAt": "2024-05-01T10:00:00Z"},
                {"id": "mcp-6", "name": "redis"}
            ],
            "total": 6
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api(&server)
        .list_mcp_servers(
            PageRequest {
                limit: 2,
                offset: 4,
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(page.total, 6);
    let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["pg-db", "redis"]);
    assert!(page.items[0].created_at.is_some());
    assert!(page.items[1].created_at.is_none());
}

#[tokio::test]
async fn base_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/platform/api/v1/proj-1/agentSystems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "total": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpResourceApi::new(config(&format!("{}/platform/", server.uri()))).unwrap();
    let page = api
        .list_agent_systems(PageRequest { limit: 10, offset: 0 }, &CancellationToken::new())
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn create_agent_attaches_instance_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/proj-1/agents"))
        .and(body_partial_json(json!({
            "name": "helper",
            "mcpServers": ["mcp-5"],
            "instanceTypeId": "gpu-small"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "agt-9"}})))
        .expect(1)
        .mount(&server)
        .await;

    let payload = AgentPayload {
        name: "helper".to_string(),
        description: None,
        options: Mapping::new(),
        mcp_servers: vec!["mcp-5".to_string()],
    };
    let id = api(&server)
        .create_agent(&payload, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(id, "agt-9");
}

#[tokio::test]
async fn create_accepts_flat_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/proj-1/mcpServers"))
        .and(body_partial_json(json!({"name": "pg-db", "description": "primary"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "mcp-1"})))
        .mount(&server)
        .await;

    let payload = McpServerPayload {
        name: "pg-db".to_string(),
        description: Some("primary".to_string()),
        options: Mapping::new(),
    };
    let id = api(&server)
        .create_mcp_server(&payload, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(id, "mcp-1");
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/proj-1/mcpServers"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": {"message": "name already taken"}})),
        )
        .mount(&server)
        .await;

    let payload = McpServerPayload {
        name: "pg-db".to_string(),
        description: None,
        options: Mapping::new(),
    };
    let err = api(&server)
        .create_mcp_server(&payload, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CapabilityError::Api {
            status: 409,
            message: "name already taken".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_list_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/proj-1/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = api(&server)
        .list_agents(PageRequest { limit: 10, offset: 0 }, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CapabilityError::Decode(_)));
}

#[tokio::test]
async fn cancellation_interrupts_a_slow_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/proj-1/agents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [], "total": 0}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = api(&server)
        .list_agents(PageRequest { limit: 10, offset: 0 }, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, CapabilityError::Cancelled);
}

#[test]
fn empty_project_id_is_rejected() {
    let mut config = config("https://platform.example.com");
    config.project_id = "  ".to_string();
    let err = HttpResourceApi::new(config).err().unwrap();
    assert!(matches!(err, CapabilityError::NotConfigured(_)));
}

#[tokio::test]
async fn empty_error_body_falls_back_to_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/proj-1/agents"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = api(&server)
        .list_agents(PageRequest { limit: 10, offset: 0 }, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CapabilityError::Api {
            status: 502,
            message: "Bad Gateway".to_string()
        }
    );
}

#[tokio::test]
async fn cancelled_token_aborts_a_failing_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/proj-1/mcpServers"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("boom")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let payload = McpServerPayload {
        name: "pg-db".to_string(),
        description: None,
        options: Mapping::new(),
    };
    let err = api(&server)
        .create_mcp_server(&payload, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, CapabilityError::Cancelled);
}
