//! 错误类型
//!
//! 所有处理器在边界处捕获失败并折叠为结构化的 `{error}` 响应，错误从不以
//! panic 形式越过分发边界。中继通道的来源鉴权失败不在此列：直接丢弃，不回包。

use thiserror::Error;

use crate::ai::CompletionError;
use crate::store::StorageError;

/// 核心错误分类（配置 / 上游 / 传输 / 存储 / 未知请求）
#[derive(Error, Debug)]
pub enum MentorError {
    /// 未配置 API Key，在任何外部调用之前检查
    #[error("API key not configured. Set it in the assistant settings.")]
    ApiKeyMissing,

    /// 补全端点拒绝请求或返回不可用内容
    #[error("AI service error: {0}")]
    Upstream(String),

    /// 网络层失败
    #[error("Network error: {0}")]
    Transport(String),

    /// 持久化操作失败
    #[error("Storage error: {0}")]
    Storage(String),

    /// 无法识别的信封 type
    #[error("Unknown message type")]
    UnknownRequest,
}

impl From<StorageError> for MentorError {
    fn from(e: StorageError) -> Self {
        MentorError::Storage(e.to_string())
    }
}

impl From<CompletionError> for MentorError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::Transport(msg) => MentorError::Transport(msg),
            CompletionError::Auth(msg)
            | CompletionError::Quota(msg)
            | CompletionError::Malformed(msg)
            | CompletionError::Upstream(msg) => MentorError::Upstream(msg),
        }
    }
}
