//! HTTP implementation of [`ResourceApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{
    AgentPayload, AgentSystemPayload, CapabilityError, McpServerPayload, Page, PageRequest,
    ResourceApi,
};

const USER_AGENT: &str = concat!("agentctl/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`HttpResourceApi`].
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: Url,
    pub project_id: String,
    pub token: Option<String>,
    /// Attached to every created agent when set.
    pub instance_type_id: Option<String>,
    pub request_timeout: Duration,
}

pub struct HttpResourceApi {
    client: Client,
    config: HttpApiConfig,
}

#[derive(Serialize)]
struct AgentRequest<'a> {
    #[serde(flatten)]
    payload: &'a AgentPayload,
    #[serde(rename = "instanceTypeId", skip_serializing_if = "Option::is_none")]
    instance_type_id: Option<&'a str>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum CreatedResponse {
    Flat { id: String },
    Wrapped { data: CreatedId },
}

#[derive(serde::Deserialize)]
struct CreatedId {
    id: String,
}

impl CreatedResponse {
    fn into_id(self) -> String {
        match self {
            CreatedResponse::Flat { id } => id,
            CreatedResponse::Wrapped { data } => data.id,
        }
    }
}

impl HttpResourceApi {
    pub fn new(config: HttpApiConfig) -> Result<Self, CapabilityError> {
        if config.project_id.trim().is_empty() {
            return Err(CapabilityError::NotConfigured(
                "project id is empty".to_string(),
            ));
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CapabilityError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// `{base}/api/v1/{project}/{collection}`
    fn endpoint(&self, collection: &str) -> Result<Url, CapabilityError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CapabilityError::NotConfigured(format!(
                    "API url cannot be a base: {}",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", "v1", self.config.project_id.as_str(), collection]);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response, CapabilityError> {
        let request = self.authorize(request);
        let sent = tokio::select! {
            _ = cancel.cancelled() => return Err(CapabilityError::Cancelled),
            sent = request.send() => sent,
        };
        let response = sent.map_err(|e| CapabilityError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let read = tokio::select! {
            _ = cancel.cancelled() => return Err(CapabilityError::Cancelled),
            read = response.text() => read,
        };
        let message = match read {
            Ok(body) => error_message(&body, status.canonical_reason()),
            Err(e) => {
                tracing::debug!(status = status.as_u16(), error = %e, "failed to read error body");
                error_message("", status.canonical_reason())
            }
        };
        Err(CapabilityError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        cancel: &CancellationToken,
    ) -> Result<T, CapabilityError> {
        let read = tokio::select! {
            _ = cancel.cancelled() => return Err(CapabilityError::Cancelled),
            read = response.bytes() => read,
        };
        let bytes = read.map_err(|e| CapabilityError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| CapabilityError::Decode(e.to_string()))
    }

    async fn list(
        &self,
        collection: &str,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError> {
        let url = self.endpoint(collection)?;
        tracing::debug!(%url, limit = page.limit, offset = page.offset, "listing");
        let request = self
            .client
            .get(url)
            .query(&[("limit", page.limit), ("offset", page.offset)]);
        let response = self.send(request, cancel).await?;
        Self::decode(response, cancel).await
    }

    async fn create<B: Serialize + Sync>(
        &self,
        collection: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError> {
        let url = self.endpoint(collection)?;
        let body = serde_json::to_vec(body).map_err(|e| CapabilityError::Encode(e.to_string()))?;
        tracing::debug!(%url, "creating");
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let response = self.send(request, cancel).await?;
        let created: CreatedResponse = Self::decode(response, cancel).await?;
        Ok(created.into_id())
    }
}

/// Pull `error.message` out of a JSON error body, falling back to the raw body.
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(json) = serde_json::from_str::<JsonValue>(body) {
        let message = json
            .pointer("/error/message")
            .or_else(|| json.get("message"))
            .and_then(JsonValue::as_str);
        if let Some(message) = message {
            return message.to_string();
        }
    }
    let body = body.trim();
    if body.is_empty() {
        reason.unwrap_or("no response body").to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn list_mcp_servers(
        &self,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError> {
        self.list("mcpServers", page, cancel).await
    }

    async fn list_agents(
        &self,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError> {
        self.list("agents", page, cancel).await
    }

    async fn list_agent_systems(
        &self,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page, CapabilityError> {
        self.list("agentSystems", page, cancel).await
    }

    async fn create_mcp_server(
        &self,
        payload: &McpServerPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError> {
        self.create("mcpServers", payload, cancel).await
    }

    async fn create_agent(
        &self,
        payload: &AgentPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError> {
        let request = AgentRequest {
            payload,
            instance_type_id: self.config.instance_type_id.as_deref(),
        };
        self.create("agents", &request, cancel).await
    }

    async fn create_agent_system(
        &self,
        payload: &AgentSystemPayload,
        cancel: &CancellationToken,
    ) -> Result<String, CapabilityError> {
        self.create("agentSystems", payload, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpResourceApi {
        HttpResourceApi::new(HttpApiConfig {
            base_url: Url::parse(base).unwrap(),
            project_id: "proj-1".to_string(),
            token: None,
            instance_type_id: None,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_path_segments() {
        let url = api("https://ai.example.com").endpoint("agents").unwrap();
        assert_eq!(url.as_str(), "https://ai.example.com/api/v1/proj-1/agents");

        let url = api("https://ai.example.com/gateway/").endpoint("mcpServers").unwrap();
        assert_eq!(
            url.as_str(),
            "https://ai.example.com/gateway/api/v1/proj-1/mcpServers"
        );
    }

    #[test]
    fn error_message_prefers_structured_body() {
        assert_eq!(
            error_message(r#"{"error":{"message":"quota exceeded"}}"#, Some("Forbidden")),
            "quota exceeded"
        );
        assert_eq!(error_message("upstream timeout", None), "upstream timeout");
        assert_eq!(error_message("", Some("Bad Gateway")), "Bad Gateway");
    }

    #[test]
    fn empty_project_id_is_not_configured() {
        let result = HttpResourceApi::new(HttpApiConfig {
            base_url: Url::parse("https://ai.example.com").unwrap(),
            project_id: " ".to_string(),
            token: None,
            instance_type_id: None,
            request_timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(CapabilityError::NotConfigured(_))));
    }

    #[test]
    fn agent_request_flattens_payload_with_instance_type() {
        let payload = AgentPayload {
            name: "helper".to_string(),
            description: Some("Helps".to_string()),
            options: serde_yaml::Mapping::new(),
            mcp_servers: vec![],
        };
        let json = serde_json::to_value(AgentRequest {
            payload: &payload,
            instance_type_id: Some("it-small"),
        })
        .unwrap();
        assert_eq!(json["name"], "helper");
        assert_eq!(json["instanceTypeId"], "it-small");
        assert!(json["mcpServers"].as_array().unwrap().is_empty());
    }
}
