//! 补全客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 CompletionClient：提交
//! `[system] + 历史轮次 + [新 user 轮]`，返回补全文本。

use async_trait::async_trait;
use thiserror::Error;

/// 提示消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// 发往补全端点的单条消息
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// 补全调用失败分类
#[derive(Debug, Error)]
pub enum CompletionError {
    /// 认证被拒（API Key 无效）
    #[error("{0}")]
    Auth(String),

    /// 配额或限流
    #[error("{0}")]
    Quota(String),

    /// 网络层失败
    #[error("{0}")]
    Transport(String),

    /// 响应为空或无法解析
    #[error("{0}")]
    Malformed(String),

    /// 端点的其他拒绝（带上游错误消息）
    #[error("{0}")]
    Upstream(String),
}

/// 补全客户端 trait
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// 非流式补全：返回助手文本
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, CompletionError>;
}
