//! Anthropic Messages API chat model.
//!
//! Non-streaming calls with tool use. Tool observations are sent back as
//! `tool_result` blocks in the following user message.

use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ChatMessage, ModelConfig, ModelReply, ModelRequest, StopReason, TokenUsage, ToolCall,
};
use crate::domain::ports::ChatModel;

/// Configuration for the Anthropic chat model.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (will be read from `ANTHROPIC_API_KEY` env if not set).
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API version header.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Default max tokens when the request sets none.
    pub max_tokens: u32,
    /// Sampling temperature; provider default when unset.
    pub temperature: Option<f32>,
    /// Give up retrying transient errors after this long.
    pub max_retry_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            api_version: "2023-06-01".to_string(),
            timeout_secs: 300,
            max_tokens: 4096,
            temperature: None,
            max_retry_secs: 60,
        }
    }
}

impl From<&ModelConfig> for AnthropicConfig {
    fn from(settings: &ModelConfig) -> Self {
        let defaults = Self::default();
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone().unwrap_or(defaults.base_url),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: Some(settings.temperature),
            ..defaults
        }
    }
}

impl AnthropicConfig {
    /// Get API key from config or environment.
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }
}

/// Message role in Anthropic API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MessageRole {
    User,
    Assistant,
}

/// Content block in a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        is_error: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: MessageRole,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
struct ToolDefinition<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

/// Chat model backed by the Anthropic Messages API.
pub struct AnthropicChatModel {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicChatModel {
    /// Client for the Messages API.
    pub fn new(config: AnthropicConfig) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::ModelFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn build_request<'a>(&'a self, request: &'a ModelRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system: (!request.system.is_empty()).then_some(request.system.as_str()),
            messages: to_wire_messages(&request.messages),
            tools: request
                .tools
                .iter()
                .map(|t| ToolDefinition {
                    name: &t.name,
                    description: &t.description,
                    input_schema: &t.input_schema,
                })
                .collect(),
            temperature: request.temperature.or(self.config.temperature),
        }
    }

    async fn send_once(
        &self,
        api_key: &str,
        body: &MessagesRequest<'_>,
    ) -> Result<MessagesResponse, backoff::Error<DomainError>> {
        let response = self
            .client
            .post(format!(
                "{}/v1/messages",
                self.config.base_url.trim_end_matches('/')
            ))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let err = DomainError::ModelFailed(format!("API request failed: {e}"));
                if e.is_timeout() || e.is_connect() {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = DomainError::ModelFailed(format!("API error {status}: {text}"));
            return Err(if is_retryable(status) {
                tracing::warn!(status = %status, "transient model API error, retrying");
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            });
        }

        response.json().await.map_err(|e| {
            backoff::Error::permanent(DomainError::ModelFailed(format!(
                "Failed to parse response: {e}"
            )))
        })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() || status.as_u16() == 529
}

/// Map neutral messages to the wire format.
///
/// Consecutive tool results are merged into one user message, and empty text
/// blocks are dropped since the API rejects them.
fn to_wire_messages(messages: &[ChatMessage]) -> Vec<Message> {
    let mut wire: Vec<Message> = Vec::with_capacity(messages.len());
    for message in messages {
        match message {
            ChatMessage::User { content } => wire.push(Message {
                role: MessageRole::User,
                content: vec![ContentBlock::Text {
                    text: content.clone(),
                }],
            }),
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => {
                let mut blocks = Vec::with_capacity(tool_calls.len() + 1);
                if !content.trim().is_empty() {
                    blocks.push(ContentBlock::Text {
                        text: content.clone(),
                    });
                }
                blocks.extend(tool_calls.iter().map(|call| ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                }));
                if !blocks.is_empty() {
                    wire.push(Message {
                        role: MessageRole::Assistant,
                        content: blocks,
                    });
                }
            }
            ChatMessage::ToolResult {
                call_id,
                content,
                is_error,
            } => {
                let block = ContentBlock::ToolResult {
                    tool_use_id: call_id.clone(),
                    content: content.clone(),
                    is_error: *is_error,
                };
                match wire.last_mut() {
                    Some(last)
                        if last.role == MessageRole::User
                            && last
                                .content
                                .iter()
                                .all(|b| matches!(b, ContentBlock::ToolResult { .. })) =>
                    {
                        last.content.push(block);
                    }
                    _ => wire.push(Message {
                        role: MessageRole::User,
                        content: vec![block],
                    }),
                }
            }
        }
    }
    wire
}

#[async_trait]
impl ChatModel for AnthropicChatModel {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: ModelRequest) -> DomainResult<ModelReply> {
        let api_key = self
            .config
            .get_api_key()
            .ok_or_else(|| DomainError::ModelFailed("ANTHROPIC_API_KEY not set".to_string()))?;

        let body = self.build_request(&request);
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(Duration::from_secs(self.config.max_retry_secs)))
            .build();

        let api_key = api_key.as_str();
        let body_ref = &body;
        let result = retry(policy, move || self.send_once(api_key, body_ref)).await?;

        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();
        for block in result.content {
            match block {
                ContentBlock::Text { text } => text_parts.push(text),
                ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments: input,
                }),
                ContentBlock::ToolResult { .. } => {}
            }
        }

        Ok(ModelReply {
            content: text_parts.join("\n"),
            tool_calls,
            stop_reason: StopReason::from_provider(result.stop_reason.as_deref()),
            usage: result.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ToolSpec;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model_for(server: &MockServer) -> AnthropicChatModel {
        AnthropicChatModel::new(AnthropicConfig {
            api_key: Some("sk-test".to_string()),
            base_url: server.uri(),
            max_retry_secs: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_tool_results_are_merged_into_one_user_message() {
        let messages = vec![
            ChatMessage::user("otimizar plano Navio A"),
            ChatMessage::Assistant {
                content: String::new(),
                tool_calls: vec![
                    ToolCall { id: "t1".into(), name: "get_plan".into(), arguments: json!({}) },
                    ToolCall { id: "t2".into(), name: "get_plan".into(), arguments: json!({}) },
                ],
            },
            ChatMessage::ToolResult { call_id: "t1".into(), content: "17".into(), is_error: false },
            ChatMessage::ToolResult { call_id: "t2".into(), content: "Erro".into(), is_error: true },
        ];

        let wire = to_wire_messages(&messages);
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[1].role, MessageRole::Assistant);
        assert_eq!(wire[1].content.len(), 2, "empty text block dropped");
        assert_eq!(wire[2].role, MessageRole::User);
        assert_eq!(wire[2].content.len(), 2);
    }

    #[tokio::test]
    async fn test_complete_parses_tool_use() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(body_partial_json(json!({"tools": [{"name": "get_plan"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "model": "claude",
                "content": [
                    {"type": "text", "text": "Buscando o plano."},
                    {"type": "tool_use", "id": "toolu_1", "name": "get_plan", "input": {"name": "Navio A"}}
                ],
                "stop_reason": "tool_use",
                "usage": {"input_tokens": 10, "output_tokens": 5}
            })))
            .mount(&server)
            .await;

        let request = ModelRequest::new("system", vec![ChatMessage::user("otimizar plano Navio A")])
            .with_tools(vec![ToolSpec {
                name: "get_plan".into(),
                description: "lookup".into(),
                input_schema: json!({"type": "object"}),
            }]);

        let reply = model_for(&server).complete(request).await.unwrap();
        assert_eq!(reply.stop_reason, StopReason::ToolUse);
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].arguments["name"], "Navio A");
        assert_eq!(reply.content, "Buscando o plano.");
        assert_eq!(reply.usage.unwrap().input_tokens, 10);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let err = model_for(&server)
            .complete(ModelRequest::new("", vec![ChatMessage::user("oi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ModelFailed(ref m) if m.contains("400")));
    }
}
