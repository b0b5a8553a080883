//! 提示编排
//!
//! 把一次提示请求变成一次补全调用和一次会话更新：读设置（无 Key 即失败）、
//! 读历史、拼提示、调端点；成功后在同一操作内追加 user + assistant 两条消息
//! 并持久化。步骤 1-5 的任何失败都不写存储，原有序列保持不动。

use std::sync::Arc;

use crate::ai::{prompt, CompletionClient, MockCompletionClient, OpenAiCompatClient};
use crate::ai::{PromptMessage, PromptRole};
use crate::config::LlmSection;
use crate::error::MentorError;
use crate::protocol::{now_ms, ChatMessage, Role};
use crate::store::{self, KvStore};

/// 按存储中的 API Key 构造补全客户端
///
/// Key 存在设置里、可在运行中被改写，所以客户端按请求构造而不是启动时固化。
pub type ClientFactory = Arc<dyn Fn(&str) -> Arc<dyn CompletionClient> + Send + Sync>;

/// OpenAI 兼容端点的客户端工厂
pub fn openai_client_factory(config: LlmSection) -> ClientFactory {
    Arc::new(move |api_key: &str| {
        Arc::new(OpenAiCompatClient::new(&config, api_key)) as Arc<dyn CompletionClient>
    })
}

/// Mock 客户端工厂（测试与离线演示）
pub fn mock_client_factory() -> ClientFactory {
    Arc::new(|_api_key: &str| Arc::new(MockCompletionClient) as Arc<dyn CompletionClient>)
}

/// 一次提示请求（GET_AI_RESPONSE 的载荷）
#[derive(Debug, Clone)]
pub struct HintRequest {
    pub problem_id: String,
    pub user_message: String,
    pub problem_context: Option<String>,
    pub code: Option<String>,
    pub language: Option<String>,
}

/// 提示编排器
pub struct HintOrchestrator {
    store: Arc<dyn KvStore>,
    factory: ClientFactory,
}

impl HintOrchestrator {
    pub fn new(store: Arc<dyn KvStore>, factory: ClientFactory) -> Self {
        Self { store, factory }
    }

    /// 处理一次提示请求，返回助手文本
    ///
    /// 同一 problemId 上与并发 SAVE_CONVERSATION 的竞争按「最后完成的写入胜出」
    /// 接受，不做键级加锁。
    pub async fn respond(&self, request: HintRequest) -> Result<String, MentorError> {
        let settings = store::load_settings(self.store.as_ref()).await?;
        let api_key = match settings.api_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(MentorError::ApiKeyMissing),
        };

        let history = store::load_conversation(self.store.as_ref(), &request.problem_id).await?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(PromptMessage::system(prompt::system_prompt(
            settings.skill_level,
        )));
        for entry in &history {
            messages.push(PromptMessage {
                role: match entry.role {
                    Role::User => PromptRole::User,
                    Role::Assistant => PromptRole::Assistant,
                },
                content: entry.content.clone(),
            });
        }
        messages.push(PromptMessage::user(prompt::compose_user_turn(
            request.problem_context.as_deref(),
            request.language.as_deref(),
            request.code.as_deref(),
            &request.user_message,
        )));

        let client = (self.factory)(&api_key);
        let reply = client.complete(&messages).await?;

        // 成功后才落盘：user 轮存原始消息（不含拼接的上下文块），时间戳不回退
        let user_entry = ChatMessage::user(request.user_message.as_str());
        let assistant_entry = ChatMessage {
            role: Role::Assistant,
            content: reply.clone(),
            timestamp: now_ms().max(user_entry.timestamp),
        };

        let mut updated = history;
        updated.push(user_entry);
        updated.push(assistant_entry);
        store::save_conversation(self.store.as_ref(), &request.problem_id, &updated).await?;

        Ok(reply)
    }
}
