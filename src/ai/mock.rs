//! Mock 补全客户端（用于测试与离线演示，无需 API）
//!
//! 取最后一条 User 消息回显，便于不配置 Key 也能跑通完整链路。

use async_trait::async_trait;

use crate::ai::{CompletionClient, CompletionError, PromptMessage, PromptRole};

/// Mock 客户端：回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockCompletionClient;

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, CompletionError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == PromptRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!("Echo from Mock: {}", last_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_last_user_message() {
        let client = MockCompletionClient;
        let messages = vec![
            PromptMessage::system("guide"),
            PromptMessage::user("first"),
            PromptMessage::assistant("hint"),
            PromptMessage::user("second"),
        ];
        let reply = client.complete(&messages).await.unwrap();
        assert!(reply.contains("second"));
        assert!(!reply.contains("first"));
    }
}
