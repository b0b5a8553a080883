//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；默认指向
//! OpenRouter。输出长度与采样温度为固定参数，由配置给出。

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::ai::{CompletionClient, CompletionError, PromptMessage, PromptRole};
use crate::config::LlmSection;

/// OpenAI 兼容客户端：持有 Client 与固定参数，complete 时转 PromptMessage 为
/// API 格式并取首条 content
pub struct OpenAiCompatClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    request_timeout: Duration,
}

impl OpenAiCompatClient {
    pub fn new(config: &LlmSection, api_key: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(&config.base_url)
            .with_api_key(api_key);

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn to_api_messages(&self, messages: &[PromptMessage]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m.role {
                PromptRole::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                PromptRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                PromptRole::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
            })
            .collect()
    }
}

/// 将 async_openai 错误映射到补全错误分类；API 错误尽量带上游消息
fn map_api_error(error: OpenAIError) -> CompletionError {
    match error {
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.clone().unwrap_or_default();
            match kind.as_str() {
                "authentication_error" | "invalid_api_key" => CompletionError::Auth(api.message),
                "insufficient_quota" | "rate_limit_error" => CompletionError::Quota(api.message),
                _ => CompletionError::Upstream(api.message),
            }
        }
        OpenAIError::Reqwest(e) => CompletionError::Transport(e.to_string()),
        OpenAIError::JSONDeserialize(e, _) => CompletionError::Malformed(e.to_string()),
        other => CompletionError::Upstream(other.to_string()),
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, CompletionError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.to_api_messages(messages))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(map_api_error)?;

        let response = tokio::time::timeout(self.request_timeout, async {
            self.client.chat().create(request).await
        })
        .await
        .map_err(|_| {
            CompletionError::Transport(format!(
                "request timed out after {}s",
                self.request_timeout.as_secs()
            ))
        })?
        .map_err(map_api_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CompletionError::Malformed(
                "Invalid response from AI".to_string(),
            ));
        }

        Ok(content)
    }
}
